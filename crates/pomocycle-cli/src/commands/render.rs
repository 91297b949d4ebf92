//! Plain-text rendering of timer state for the terminal.

use std::time::Duration;

use chrono::Local;
use pomocycle_core::timer::format_clock;
use pomocycle_core::{Event, Phase, TimerSnapshot};

pub fn snapshot_line(snap: &TimerSnapshot) -> String {
    let sessions = format!(
        "sessions {}/{}",
        snap.sessions_completed, snap.sessions_until_long_break
    );
    match snap.phase {
        Phase::Idle if snap.awaiting_activity => {
            format!("idle, waiting for activity ({sessions})")
        }
        Phase::Idle => format!("idle ({sessions})"),
        phase => format!(
            "{phase} {} / {}, {} left ({sessions})",
            format_clock(snap.elapsed()),
            format_clock(Duration::from_millis(snap.phase_duration_ms)),
            format_clock(snap.remaining()),
        ),
    }
}

pub fn event_line(event: &Event) -> String {
    let time = event.at().with_timezone(&Local).format("%H:%M:%S");
    let message = match event {
        Event::PhaseStarted {
            phase,
            duration_ms,
            sessions_completed,
            auto_started,
            ..
        } => {
            let how = if *auto_started { " (auto)" } else { "" };
            format!(
                "{phase} started{how}, {} [{sessions_completed} done]",
                format_clock(Duration::from_millis(*duration_ms))
            )
        }
        Event::PhaseEnded { phase, .. } => format!("{phase} finished"),
        Event::Paused { phase, elapsed_ms, .. } => format!(
            "{phase} paused at {}",
            format_clock(Duration::from_millis(*elapsed_ms))
        ),
        Event::Resumed { phase, elapsed_ms, .. } => format!(
            "{phase} resumed at {}",
            format_clock(Duration::from_millis(*elapsed_ms))
        ),
        Event::Stopped { .. } => "stopped".to_string(),
        Event::PhaseSkipped { from, to, .. } => format!("{from} skipped, next: {to}"),
        Event::AwaitingActivity { .. } => {
            "break over, press enter (or any activity) to start working".to_string()
        }
        Event::Tick { phase, remaining_ms, .. } => format!(
            "{phase} {} left",
            format_clock(Duration::from_millis(*remaining_ms))
        ),
    };
    format!("[{time}] {message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pomocycle_core::PhaseKind;

    fn snap(phase: Phase) -> TimerSnapshot {
        TimerSnapshot {
            phase,
            elapsed_ms: 65_000,
            phase_duration_ms: 300_000,
            remaining_ms: 235_000,
            sessions_completed: 1,
            sessions_until_long_break: 4,
            awaiting_activity: false,
            auto_start_enabled: true,
        }
    }

    #[test]
    fn running_snapshot_shows_clock() {
        assert_eq!(
            snapshot_line(&snap(Phase::ShortBreak)),
            "short break 01:05 / 05:00, 03:55 left (sessions 1/4)"
        );
    }

    #[test]
    fn idle_snapshot_mentions_waiting() {
        let mut s = snap(Phase::Idle);
        s.awaiting_activity = true;
        assert_eq!(snapshot_line(&s), "idle, waiting for activity (sessions 1/4)");
    }

    #[test]
    fn event_lines_are_readable() {
        let line = event_line(&Event::PhaseSkipped {
            from: PhaseKind::Working,
            to: Phase::LongBreak,
            at: Utc::now(),
        });
        assert!(line.ends_with("working skipped, next: long break"));

        let line = event_line(&Event::PhaseStarted {
            phase: PhaseKind::Working,
            duration_ms: 1_500_000,
            sessions_completed: 2,
            auto_started: true,
            at: Utc::now(),
        });
        assert!(line.ends_with("working started (auto), 25:00 [2 done]"));

        let line = event_line(&Event::Tick {
            phase: PhaseKind::ShortBreak,
            elapsed_ms: 60_000,
            remaining_ms: 240_000,
            at: Utc::now(),
        });
        assert!(line.ends_with("short break 04:00 left"));
    }
}
