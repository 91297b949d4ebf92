//! # Pomocycle Core Library
//!
//! Core logic for the Pomocycle Pomodoro timer. Front-ends (the bundled CLI,
//! or any desktop shell) render its state and feed it user commands; the
//! library itself never draws, plays sounds, or hooks input devices.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A delta-driven state machine cycling work, short
//!   breaks and long breaks, with protected breaks and activity-gated
//!   auto-start
//! - **Runtime**: A single tokio task that owns the engine and serializes
//!   ticks, commands and activity edges
//! - **Storage**: TOML configuration and a JSON snapshot of the last session
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerRuntime`] / [`TimerHandle`]: Driver and its command/observation API
//! - [`Config`]: Application configuration management
//! - [`Event`]: Push notifications for presentation layers

pub mod clock;
pub mod error;
pub mod events;
pub mod runtime;
pub mod storage;
pub mod timer;

pub use clock::{DeltaClock, FixedTicks};
pub use error::{ConfigError, CoreError, InvalidTransition};
pub use events::{Event, EventBus};
pub use runtime::{TimerHandle, TimerRuntime};
pub use storage::{Config, StateStore};
pub use timer::{Command, Phase, PhaseKind, TimerEngine, TimerSettings, TimerSnapshot};
