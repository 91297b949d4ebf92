//! Structured logging for the CLI.
//!
//! Console logs go to stderr so stdout stays clean for event output and JSON.
//! A second layer always records debug-level logs to a file, by default
//! `<data dir>/logs/pomocycle.log`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pomocycle_core::storage::data_dir;
use pomocycle_core::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE: &str = "pomocycle.log";
const FILE_DIRECTIVES: &str = "pomocycle=debug,pomocycle_core=debug,warn";
const MAX_LOG_BYTES: u64 = 50 * 1024;
const KEEP_LOG_BYTES: u64 = 25 * 1024;

/// Command-line logging options.
#[derive(Debug, Default)]
pub struct LogOptions<'a> {
    /// Console level from `--log-level`.
    pub level: Option<&'a str>,
    /// Log file from `--log-file`; `None` means the data directory default.
    pub file: Option<&'a Path>,
    /// Start with an empty log file.
    pub clear: bool,
}

/// Install the global subscriber.
///
/// Console level precedence: `RUST_LOG`, then `--log-level`, then
/// `[logging].level` from the config file, then `info`. The file layer always
/// logs at debug. If the file can't be opened, logging continues on the
/// console only.
pub fn init(options: &LogOptions<'_>) {
    let level = options
        .level
        .map(str::to_string)
        .or_else(configured_level)
        .unwrap_or_else(|| "info".to_string())
        .to_ascii_lowercase();

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(format!("pomocycle={level},pomocycle_core={level},warn"))
            .unwrap_or_else(|_| EnvFilter::new("pomocycle=info,pomocycle_core=info,warn"))
    });
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(console_filter);

    let (file_layer, opened) = match open_log_file(options.file, options.clear) {
        Ok((path, file)) => {
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_filter(EnvFilter::new(FILE_DIRECTIVES));
            (Some(layer), Ok(path))
        }
        Err(e) => (None, Err(e)),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    match opened {
        Ok(path) => tracing::debug!(path = %path.display(), "logging to file"),
        Err(e) => tracing::warn!(error = %e, "log file unavailable, logging to console only"),
    }
}

fn default_log_path() -> std::io::Result<PathBuf> {
    Ok(data_dir()?.join("logs").join(LOG_FILE))
}

fn open_log_file(custom: Option<&Path>, clear: bool) -> std::io::Result<(PathBuf, File)> {
    let path = match custom {
        Some(path) => path.to_path_buf(),
        None => default_log_path()?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = if clear {
        File::create(&path)?
    } else {
        trim_log(&path, MAX_LOG_BYTES, KEEP_LOG_BYTES)?;
        OpenOptions::new().create(true).append(true).open(&path)?
    };
    Ok((path, file))
}

/// Cut a log file larger than `max` bytes down to its last `keep` bytes.
fn trim_log(path: &Path, max: u64, keep: u64) -> std::io::Result<()> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let len = file.metadata()?.len();
    if len <= max {
        return Ok(());
    }

    file.seek(SeekFrom::Start(len - keep.min(len)))?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;
    drop(file);

    let mut file = File::create(path)?;
    file.write_all(b"--- log truncated ---\n")?;
    file.write_all(&tail)?;
    Ok(())
}

// A broken config must not stop `config reset` from running, so failures
// here just fall back to the default level.
fn configured_level() -> Option<String> {
    let path = Config::path().ok()?;
    let content = std::fs::read_to_string(path).ok()?;
    let config: Config = toml::from_str(&content).ok()?;
    Some(config.logging.level)
}
