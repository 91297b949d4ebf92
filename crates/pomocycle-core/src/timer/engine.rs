//! Timer engine implementation.
//!
//! The timer engine is a delta-driven state machine. It does not use internal
//! threads or read the clock - the caller feeds it `tick(delta)` and commands
//! from a single control loop (see [`crate::runtime`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Working -> (ShortBreak | LongBreak) -> Idle [awaiting activity] -> Working
//!           \______________ Paused ______________/
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(settings);
//! let mut events = engine.subscribe();
//! engine.start()?;
//! // In a loop:
//! engine.tick(Duration::from_secs(1)); // true when a phase changed
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::phase::{Command, Phase, PhaseKind};
use super::settings::TimerSettings;
use crate::clock::as_ms;
use crate::error::InvalidTransition;
use crate::events::{Event, EventBus};

/// Point-in-time view of the timer, for pull-based observers and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub elapsed_ms: u64,
    pub phase_duration_ms: u64,
    pub remaining_ms: u64,
    pub sessions_completed: u32,
    pub sessions_until_long_break: u32,
    #[serde(default)]
    pub awaiting_activity: bool,
    #[serde(default)]
    pub auto_start_enabled: bool,
}

impl TimerSnapshot {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_millis(self.remaining_ms)
    }
}

/// Core timer engine.
///
/// Owns the single timer session. Commands that don't fit the current
/// phase return [`InvalidTransition`] and change nothing.
#[derive(Debug)]
pub struct TimerEngine {
    settings: TimerSettings,
    phase: Phase,
    elapsed: Duration,
    sessions_completed: u32,
    /// `elapsed` as captured by the last pause.
    paused_elapsed: Option<Duration>,
    awaiting_activity: bool,
    events: EventBus,
}

impl TimerEngine {
    /// Create a new engine in `Idle`.
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
            elapsed: Duration::ZERO,
            sessions_completed: 0,
            paused_elapsed: None,
            awaiting_activity: false,
            events: EventBus::default(),
        }
    }

    /// Rebuild an engine from a persisted snapshot.
    ///
    /// A phase that was running comes back paused, so time spent while the
    /// process was down is not counted. Values that no longer fit the
    /// settings (shorter durations, shorter cycle) are clamped.
    pub fn restore(settings: TimerSettings, snapshot: &TimerSnapshot) -> Self {
        let mut engine = Self::new(settings);
        engine.sessions_completed =
            snapshot.sessions_completed % engine.settings.sessions_until_long_break();

        match snapshot.phase.timed() {
            Some(kind) => {
                let elapsed = snapshot.elapsed().min(engine.settings.duration_of(kind));
                engine.phase = Phase::Paused { resume_to: kind };
                engine.elapsed = elapsed;
                engine.paused_elapsed = Some(elapsed);
            }
            None => {
                engine.awaiting_activity =
                    snapshot.awaiting_activity && engine.settings.auto_start();
            }
        }
        debug!(phase = %engine.phase, sessions = engine.sessions_completed, "restored timer");
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn sessions_completed(&self) -> u32 {
        self.sessions_completed
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// True in the idle gap after a break while auto-start is on.
    pub fn is_awaiting_activity(&self) -> bool {
        self.awaiting_activity
    }

    pub fn phase_duration(&self) -> Duration {
        self.phase
            .timed()
            .map(|kind| self.settings.duration_of(kind))
            .unwrap_or(Duration::ZERO)
    }

    pub fn remaining(&self) -> Duration {
        self.phase_duration().saturating_sub(self.elapsed)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            elapsed_ms: as_ms(self.elapsed),
            phase_duration_ms: as_ms(self.phase_duration()),
            remaining_ms: as_ms(self.remaining()),
            sessions_completed: self.sessions_completed,
            sessions_until_long_break: self.settings.sessions_until_long_break(),
            awaiting_activity: self.awaiting_activity,
            auto_start_enabled: self.settings.auto_start(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        if !self.phase.is_idle() {
            return Err(self.reject(Command::Start));
        }
        self.begin(PhaseKind::Working, false);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), InvalidTransition> {
        let Some(kind) = self.phase.running() else {
            return Err(self.reject(Command::Pause));
        };
        self.phase = Phase::Paused { resume_to: kind };
        self.paused_elapsed = Some(self.elapsed);
        debug!(phase = %kind, elapsed_ms = as_ms(self.elapsed), "paused");
        self.events.publish(Event::Paused {
            phase: kind,
            elapsed_ms: as_ms(self.elapsed),
            at: Utc::now(),
        });
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), InvalidTransition> {
        let Phase::Paused { resume_to } = self.phase else {
            return Err(self.reject(Command::Resume));
        };
        self.phase = resume_to.into();
        if let Some(elapsed) = self.paused_elapsed.take() {
            self.elapsed = elapsed;
        }
        debug!(phase = %resume_to, elapsed_ms = as_ms(self.elapsed), "resumed");
        self.events.publish(Event::Resumed {
            phase: resume_to,
            elapsed_ms: as_ms(self.elapsed),
            at: Utc::now(),
        });
        Ok(())
    }

    /// Back to Idle from anywhere but plain Idle; clears the long-break cycle.
    pub fn stop(&mut self) -> Result<(), InvalidTransition> {
        if self.phase.is_idle() && !self.awaiting_activity {
            return Err(self.reject(Command::Stop));
        }
        self.phase = Phase::Idle;
        self.elapsed = Duration::ZERO;
        self.sessions_completed = 0;
        self.paused_elapsed = None;
        self.awaiting_activity = false;
        info!("timer stopped");
        self.events.publish(Event::Stopped { at: Utc::now() });
        Ok(())
    }

    /// Finish the running phase now, with the same accounting as if its
    /// clock had run out. Not accepted while paused.
    pub fn skip(&mut self) -> Result<(), InvalidTransition> {
        let Some(kind) = self.phase.running() else {
            return Err(self.reject(Command::Skip));
        };
        let next = self.next_after(kind);
        debug!(from = %kind, to = %next, "skipping phase");
        self.events.publish(Event::PhaseSkipped {
            from: kind,
            to: next,
            at: Utc::now(),
        });
        self.enter_after(kind, next);
        Ok(())
    }

    /// Deliver an activity edge. Returns true if it started a work phase.
    ///
    /// Only the post-break awaiting gap consumes edges; running and paused
    /// breaks are protected and ignore them.
    pub fn activity(&mut self) -> bool {
        if !(self.phase.is_idle() && self.awaiting_activity) {
            return false;
        }
        info!("activity detected, auto-starting work");
        self.begin(PhaseKind::Working, true);
        true
    }

    /// Advance the running phase by `delta`. Returns true if a transition fired.
    ///
    /// At most one transition per tick; time beyond the end of the phase is
    /// dropped rather than carried into the next one.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Some(kind) = self.phase.running() else {
            return false;
        };
        let duration = self.settings.duration_of(kind);
        self.elapsed = self.elapsed.saturating_add(delta).min(duration);
        if self.elapsed < duration {
            return false;
        }
        let next = self.next_after(kind);
        self.events.publish(Event::PhaseEnded {
            phase: kind,
            at: Utc::now(),
        });
        self.enter_after(kind, next);
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn reject(&self, command: Command) -> InvalidTransition {
        let err = InvalidTransition {
            command,
            phase: self.phase,
        };
        warn!(%command, phase = %self.phase, "ignoring command");
        err
    }

    /// Where `kind` goes when it ends, without mutating anything.
    fn next_after(&self, kind: PhaseKind) -> Phase {
        match kind {
            PhaseKind::Working => {
                if self.sessions_completed + 1 >= self.settings.sessions_until_long_break() {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            PhaseKind::ShortBreak | PhaseKind::LongBreak => Phase::Idle,
        }
    }

    fn enter_after(&mut self, finished: PhaseKind, next: Phase) {
        if finished == PhaseKind::Working {
            self.sessions_completed += 1;
            if next == Phase::LongBreak {
                self.sessions_completed = 0;
            }
        }
        match next.running() {
            Some(kind) => self.begin(kind, false),
            None => self.enter_idle_after_break(),
        }
    }

    fn begin(&mut self, kind: PhaseKind, auto_started: bool) {
        self.phase = kind.into();
        self.elapsed = Duration::ZERO;
        self.paused_elapsed = None;
        self.awaiting_activity = false;
        let duration = self.settings.duration_of(kind);
        info!(phase = %kind, duration_ms = as_ms(duration), sessions = self.sessions_completed, "phase started");
        self.events.publish(Event::PhaseStarted {
            phase: kind,
            duration_ms: as_ms(duration),
            sessions_completed: self.sessions_completed,
            auto_started,
            at: Utc::now(),
        });
    }

    fn enter_idle_after_break(&mut self) {
        self.phase = Phase::Idle;
        self.elapsed = Duration::ZERO;
        self.paused_elapsed = None;
        self.awaiting_activity = self.settings.auto_start();
        if self.awaiting_activity {
            debug!("break over, waiting for activity");
            self.events.publish(Event::AwaitingActivity { at: Utc::now() });
        } else {
            debug!("break over, waiting for start");
        }
    }
}
