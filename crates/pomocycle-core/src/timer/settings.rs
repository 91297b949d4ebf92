use std::time::Duration;

use serde::Serialize;

use super::phase::PhaseKind;
use crate::error::ConfigError;

/// Validated timer settings.
///
/// Fields are private so a `TimerSettings` value can only exist once
/// validation has passed; the engine never re-checks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSettings {
    work: Duration,
    short_break: Duration,
    long_break: Duration,
    sessions_until_long_break: u32,
    auto_start: bool,
}

impl TimerSettings {
    pub const MIN_SESSIONS_UNTIL_LONG_BREAK: u32 = 2;

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a duration is zero or
    /// `sessions_until_long_break` is below 2.
    pub fn new(
        work: Duration,
        short_break: Duration,
        long_break: Duration,
        sessions_until_long_break: u32,
        auto_start: bool,
    ) -> Result<Self, ConfigError> {
        for (key, value) in [
            ("work_duration", work),
            ("short_break", short_break),
            ("long_break", long_break),
        ] {
            if value.is_zero() {
                return Err(ConfigError::invalid(key, "duration must be positive"));
            }
        }
        if sessions_until_long_break < Self::MIN_SESSIONS_UNTIL_LONG_BREAK {
            return Err(ConfigError::invalid(
                "sessions_until_long_break",
                format!(
                    "must be at least {}, got {sessions_until_long_break}",
                    Self::MIN_SESSIONS_UNTIL_LONG_BREAK
                ),
            ));
        }
        Ok(Self {
            work,
            short_break,
            long_break,
            sessions_until_long_break,
            auto_start,
        })
    }

    pub fn work(&self) -> Duration {
        self.work
    }

    pub fn short_break(&self) -> Duration {
        self.short_break
    }

    pub fn long_break(&self) -> Duration {
        self.long_break
    }

    pub fn sessions_until_long_break(&self) -> u32 {
        self.sessions_until_long_break
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn duration_of(&self, kind: PhaseKind) -> Duration {
        match kind {
            PhaseKind::Working => self.work,
            PhaseKind::ShortBreak => self.short_break,
            PhaseKind::LongBreak => self.long_break,
        }
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work: Duration::from_secs(25 * 60),
            short_break: Duration::from_secs(5 * 60),
            long_break: Duration::from_secs(15 * 60),
            sessions_until_long_break: 4,
            auto_start: true,
        }
    }
}

/// Parse a duration like `15s`, `2m`, `1h` or a bare number of seconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for empty, malformed or zero input.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let text = input.trim();
    let (digits, scale) = match text.char_indices().last() {
        Some((i, 's')) => (&text[..i], 1),
        Some((i, 'm')) => (&text[..i], 60),
        Some((i, 'h')) => (&text[..i], 3600),
        Some(_) => (text, 1),
        None => return Err(ConfigError::invalid("duration", "empty duration")),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| ConfigError::invalid("duration", format!("cannot parse '{input}'")))?;
    if value == 0 {
        return Err(ConfigError::invalid("duration", "duration must be positive"));
    }
    Ok(Duration::from_secs(value.saturating_mul(scale)))
}

/// Format as `MM:SS`, or `H:MM:SS` past an hour.
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
