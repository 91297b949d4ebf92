use std::time::Duration;

use clap::Args;
use pomocycle_core::timer::parse_duration;
use pomocycle_core::{
    Command, Config, CoreError, Event, StateStore, TimerEngine, TimerHandle, TimerRuntime,
    TimerSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use super::render;

const HELP: &str = "commands: s=start p=pause r=resume k=skip x=stop ?=status q=quit, empty line=activity";

#[derive(Args)]
pub struct RunArgs {
    /// Work duration (e.g. 25m, 15s, 1h); defaults to the config value
    work: Option<String>,
    /// Short break duration
    short_break: Option<String>,
    /// Work sessions before a long break
    sessions: Option<u32>,
    /// Long break duration
    long_break: Option<String>,
    /// Start work on the first activity after a break
    #[arg(long, conflicts_with = "no_auto_start")]
    auto_start: bool,
    /// Always wait for an explicit start after a break
    #[arg(long)]
    no_auto_start: bool,
    /// Continue from the last saved state (running phases come back paused)
    #[arg(long)]
    resume: bool,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
    /// Also print the countdown every second
    #[arg(long)]
    ticks: bool,
}

impl RunArgs {
    fn settings(&self, config: &Config) -> Result<TimerSettings, Box<dyn std::error::Error>> {
        let base = config.settings()?;
        let pick = |arg: &Option<String>, fallback: Duration| -> Result<Duration, Box<dyn std::error::Error>> {
            match arg {
                Some(text) => Ok(parse_duration(text)?),
                None => Ok(fallback),
            }
        };
        let auto_start = if self.auto_start {
            true
        } else if self.no_auto_start {
            false
        } else {
            base.auto_start()
        };
        Ok(TimerSettings::new(
            pick(&self.work, base.work())?,
            pick(&self.short_break, base.short_break())?,
            pick(&self.long_break, base.long_break())?,
            self.sessions.unwrap_or(base.sessions_until_long_break()),
            auto_start,
        )?)
    }
}

enum Line {
    Command(Command),
    Activity,
    Status,
    Quit,
    Unknown(String),
}

fn parse_line(line: &str) -> Line {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Line::Activity,
        "s" | "start" => Line::Command(Command::Start),
        "p" | "pause" => Line::Command(Command::Pause),
        "r" | "resume" => Line::Command(Command::Resume),
        "k" | "skip" => Line::Command(Command::Skip),
        "x" | "stop" => Line::Command(Command::Stop),
        "?" | "status" => Line::Status,
        "q" | "quit" | "exit" => Line::Quit,
        other => Line::Unknown(other.to_string()),
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = args.settings(&config)?;
    let store = StateStore::open()?;

    // Only --resume reads the saved state, and an unreadable one is not fatal.
    let saved = if args.resume {
        store.load().unwrap_or_else(|e| {
            tracing::warn!(path = %store.path().display(), error = %e, "could not read saved state, starting fresh");
            None
        })
    } else {
        None
    };
    let engine = match saved {
        Some(snapshot) => TimerEngine::restore(settings, &snapshot),
        None => TimerEngine::new(settings),
    };
    tracing::info!(
        work_s = engine.settings().work().as_secs(),
        short_break_s = engine.settings().short_break().as_secs(),
        long_break_s = engine.settings().long_break().as_secs(),
        sessions = engine.settings().sessions_until_long_break(),
        auto_start = engine.settings().auto_start(),
        "starting timer"
    );

    let rt = tokio::runtime::Runtime::new()?;
    let output = Output {
        json: args.json,
        ticks: args.ticks,
    };
    let result = rt.block_on(drive(engine, &store, output));
    // Stdin reads can't be cancelled; don't wait for one to finish.
    rt.shutdown_background();
    result
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
    ticks: bool,
}

async fn drive(
    engine: TimerEngine,
    store: &StateStore,
    output: Output,
) -> Result<(), Box<dyn std::error::Error>> {
    let (handle, task) = TimerRuntime::spawn(engine, TimerRuntime::DEFAULT_CADENCE);
    let printer = tokio::spawn(print_events(handle.subscribe(), output));

    eprintln!("{HELP}");
    read_input(&handle, output.json).await?;

    handle.shutdown().await?;
    let engine = task.await?;
    store.save(&engine.snapshot())?;
    tracing::debug!(path = %store.path().display(), "saved timer state");

    // Dropping the last senders closes the event stream and lets the printer
    // flush what is left.
    drop(engine);
    drop(handle);
    printer.await?;
    Ok(())
}

async fn read_input(handle: &TimerHandle, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // One listener for the whole session, so a Ctrl-C that lands while a
    // command is in flight is still seen on the next pass.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut ctrl_c => None,
        };
        let Some(line) = line else { return Ok(()) };

        match parse_line(&line) {
            Line::Command(command) => match handle.command(command).await {
                Ok(()) => {}
                Err(CoreError::Transition(e)) => eprintln!("ignored: {e}"),
                Err(e) => return Err(e.into()),
            },
            Line::Activity => {
                handle.activity().await?;
            }
            Line::Status => {
                let snapshot = handle.snapshot().await?;
                if json {
                    println!("{}", serde_json::to_string(&snapshot)?);
                } else {
                    println!("{}", render::snapshot_line(&snapshot));
                }
            }
            Line::Quit => return Ok(()),
            Line::Unknown(text) => eprintln!("unknown command '{text}'; {HELP}"),
        }
    }
}

async fn print_events(mut rx: tokio::sync::broadcast::Receiver<Event>, output: Output) {
    loop {
        match rx.recv().await {
            Ok(Event::Tick { .. }) if !output.ticks => {}
            Ok(event) if output.json => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "could not serialize event"),
            },
            Ok(event) => println!("{}", render::event_line(&event)),
            Err(RecvError::Lagged(n)) => tracing::warn!(missed = n, "event output fell behind"),
            Err(RecvError::Closed) => return,
        }
    }
}
