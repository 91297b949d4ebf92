mod engine;
mod phase;
mod settings;

pub use engine::{TimerEngine, TimerSnapshot};
pub use phase::{Command, Phase, PhaseKind};
pub use settings::{format_clock, parse_duration, TimerSettings};
