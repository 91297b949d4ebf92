mod config;
mod state;

pub use config::{Config, LoggingConfig, TimerConfig};
pub use state::StateStore;

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `POMOCYCLE_HOME` wins if set; otherwise `~/.config/pomocycle[-dev]/`
/// depending on `POMOCYCLE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("POMOCYCLE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOCYCLE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomocycle-dev")
            } else {
                base_dir.join("pomocycle")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
