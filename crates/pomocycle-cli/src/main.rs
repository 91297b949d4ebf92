use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "pomocycle", version, about = "Pomocycle - Pomodoro timer")]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Debug log file (default: <data dir>/logs/pomocycle.log)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Append to the existing log file instead of starting it fresh
    #[arg(long, global = true)]
    no_clear_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer in this terminal
    Run(commands::run::RunArgs),
    /// Show the last saved timer state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Forget the saved state
        #[arg(long, conflicts_with = "json")]
        clear: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(&logging::LogOptions {
        level: cli.log_level.as_deref(),
        file: cli.log_file.as_deref(),
        clear: !cli.no_clear_log,
    });

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Status { json, clear } => commands::status::run(json, clear),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
