use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::timer::{Phase, PhaseKind};

/// Every state change of the timer produces an Event.
/// Presentation layers subscribe to them instead of polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PhaseStarted {
        phase: PhaseKind,
        duration_ms: u64,
        sessions_completed: u32,
        /// Started by an activity edge rather than an explicit command.
        #[serde(default)]
        auto_started: bool,
        at: DateTime<Utc>,
    },
    PhaseEnded {
        phase: PhaseKind,
        at: DateTime<Utc>,
    },
    Paused {
        phase: PhaseKind,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    Resumed {
        phase: PhaseKind,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    Stopped {
        at: DateTime<Utc>,
    },
    PhaseSkipped {
        from: PhaseKind,
        to: Phase,
        at: DateTime<Utc>,
    },
    /// A break finished with auto-start on; the next activity edge starts work.
    AwaitingActivity {
        at: DateTime<Utc>,
    },
    /// Countdown progress of the running phase, once per runtime cadence.
    /// Published by [`TimerRuntime`](crate::TimerRuntime), never by the engine
    /// itself, and not on ticks that end a phase.
    Tick {
        phase: PhaseKind,
        elapsed_ms: u64,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::PhaseStarted { at, .. }
            | Event::PhaseEnded { at, .. }
            | Event::Paused { at, .. }
            | Event::Resumed { at, .. }
            | Event::Stopped { at }
            | Event::PhaseSkipped { at, .. }
            | Event::AwaitingActivity { at }
            | Event::Tick { at, .. } => *at,
        }
    }
}

/// Fan-out of timer events.
///
/// Publishing never blocks and never fails: with no subscribers the event is
/// dropped, and a subscriber that falls behind by more than the capacity
/// sees `RecvError::Lagged` instead of stalling the timer.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: Event) {
        // Err only means nobody is listening.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
