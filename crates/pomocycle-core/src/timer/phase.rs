use std::fmt;

use serde::{Deserialize, Serialize};

/// The three phases that have a duration and a running clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Working,
    ShortBreak,
    LongBreak,
}

impl PhaseKind {
    pub fn is_break(self) -> bool {
        matches!(self, PhaseKind::ShortBreak | PhaseKind::LongBreak)
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseKind::Working => "working",
            PhaseKind::ShortBreak => "short break",
            PhaseKind::LongBreak => "long break",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current phase of the pomodoro cycle. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Working,
    ShortBreak,
    LongBreak,
    /// Clock frozen; `resume_to` is where Resume goes back to.
    Paused { resume_to: PhaseKind },
}

impl Phase {
    /// The running phase, if the clock is advancing.
    pub fn running(self) -> Option<PhaseKind> {
        match self {
            Phase::Working => Some(PhaseKind::Working),
            Phase::ShortBreak => Some(PhaseKind::ShortBreak),
            Phase::LongBreak => Some(PhaseKind::LongBreak),
            Phase::Idle | Phase::Paused { .. } => None,
        }
    }

    /// The phase whose duration applies: the running one, or the one a pause
    /// will resume into.
    pub fn timed(self) -> Option<PhaseKind> {
        match self {
            Phase::Paused { resume_to } => Some(resume_to),
            other => other.running(),
        }
    }

    pub fn is_idle(self) -> bool {
        self == Phase::Idle
    }

    pub fn is_paused(self) -> bool {
        matches!(self, Phase::Paused { .. })
    }
}

impl From<PhaseKind> for Phase {
    fn from(kind: PhaseKind) -> Self {
        match kind {
            PhaseKind::Working => Phase::Working,
            PhaseKind::ShortBreak => Phase::ShortBreak,
            PhaseKind::LongBreak => Phase::LongBreak,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("idle"),
            Phase::Paused { resume_to } => write!(f, "paused ({resume_to})"),
            other => match other.running() {
                Some(kind) => f.write_str(kind.label()),
                None => Ok(()),
            },
        }
    }
}

/// User commands accepted by the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    Skip,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
            Command::Skip => "skip",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_reports_timed_phase_but_not_running() {
        let phase = Phase::Paused {
            resume_to: PhaseKind::LongBreak,
        };
        assert_eq!(phase.running(), None);
        assert_eq!(phase.timed(), Some(PhaseKind::LongBreak));
        assert!(phase.is_paused());
    }

    #[test]
    fn phase_serializes_with_state_tag() {
        let json = serde_json::to_value(Phase::Paused {
            resume_to: PhaseKind::ShortBreak,
        })
        .unwrap();
        assert_eq!(json["state"], "paused");
        assert_eq!(json["resume_to"], "short_break");

        let idle: Phase = serde_json::from_str(r#"{"state":"idle"}"#).unwrap();
        assert_eq!(idle, Phase::Idle);
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(Phase::ShortBreak.to_string(), "short break");
        assert_eq!(
            Phase::Paused {
                resume_to: PhaseKind::Working
            }
            .to_string(),
            "paused (working)"
        );
        assert_eq!(Command::Skip.to_string(), "skip");
    }
}
