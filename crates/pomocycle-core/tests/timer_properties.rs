//! Property tests for timer invariants under arbitrary input sequences.

use std::time::Duration;

use pomocycle_core::{Phase, TimerEngine, TimerSettings};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Input {
    Tick(u64),
    Start,
    Pause,
    Resume,
    Stop,
    Skip,
    Activity,
}

fn input() -> impl Strategy<Value = Input> {
    prop_oneof![
        4 => (0u64..8_000).prop_map(Input::Tick),
        1 => Just(Input::Start),
        1 => Just(Input::Pause),
        1 => Just(Input::Resume),
        1 => Just(Input::Stop),
        1 => Just(Input::Skip),
        1 => Just(Input::Activity),
    ]
}

fn settings() -> impl Strategy<Value = TimerSettings> {
    (1u64..10, 1u64..10, 1u64..10, 2u32..6, any::<bool>()).prop_map(
        |(work, short, long, sessions, auto)| {
            TimerSettings::new(
                Duration::from_secs(work),
                Duration::from_secs(short),
                Duration::from_secs(long),
                sessions,
                auto,
            )
            .unwrap()
        },
    )
}

fn apply(engine: &mut TimerEngine, input: &Input) {
    match input {
        Input::Tick(ms) => {
            engine.tick(Duration::from_millis(*ms));
        }
        Input::Start => {
            let _ = engine.start();
        }
        Input::Pause => {
            let _ = engine.pause();
        }
        Input::Resume => {
            let _ = engine.resume();
        }
        Input::Stop => {
            let _ = engine.stop();
        }
        Input::Skip => {
            let _ = engine.skip();
        }
        Input::Activity => {
            engine.activity();
        }
    }
}

proptest! {
    #[test]
    fn elapsed_never_exceeds_phase_duration(s in settings(), inputs in prop::collection::vec(input(), 0..200)) {
        let mut engine = TimerEngine::new(s.clone());
        for i in &inputs {
            apply(&mut engine, i);
            let snap = engine.snapshot();
            prop_assert!(snap.elapsed_ms <= snap.phase_duration_ms);
            prop_assert!(snap.sessions_completed < s.sessions_until_long_break());
            if snap.phase == Phase::Idle {
                prop_assert_eq!(snap.elapsed_ms, 0);
            }
        }
    }

    #[test]
    fn pause_then_resume_is_a_no_op(
        s in settings(),
        prefix in prop::collection::vec(input(), 0..60),
        while_paused in prop::collection::vec(0u64..100_000, 0..20),
    ) {
        let mut engine = TimerEngine::new(s);
        for i in &prefix {
            apply(&mut engine, i);
        }
        if engine.phase().running().is_none() {
            return Ok(());
        }
        let before = (engine.phase(), engine.elapsed());
        engine.pause().unwrap();
        for ms in while_paused {
            engine.tick(Duration::from_millis(ms));
            engine.activity();
        }
        engine.resume().unwrap();
        prop_assert_eq!((engine.phase(), engine.elapsed()), before);
    }

    #[test]
    fn activity_never_touches_running_break(
        s in settings(),
        prefix in prop::collection::vec(input(), 0..60),
        edges in 1usize..10,
    ) {
        let mut engine = TimerEngine::new(s);
        for i in &prefix {
            apply(&mut engine, i);
        }
        let is_break = engine.phase().running().map(|k| k.is_break()).unwrap_or(false);
        if !is_break {
            return Ok(());
        }
        let before = engine.snapshot();
        for _ in 0..edges {
            prop_assert!(!engine.activity());
        }
        prop_assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn stop_always_lands_in_clean_idle(s in settings(), prefix in prop::collection::vec(input(), 0..100)) {
        let mut engine = TimerEngine::new(s);
        for i in &prefix {
            apply(&mut engine, i);
        }
        if engine.phase() == Phase::Idle && !engine.is_awaiting_activity() {
            prop_assert!(engine.stop().is_err());
            return Ok(());
        }
        engine.stop().unwrap();
        prop_assert_eq!(engine.phase(), Phase::Idle);
        prop_assert_eq!(engine.elapsed(), Duration::ZERO);
        prop_assert_eq!(engine.sessions_completed(), 0);
        prop_assert!(!engine.is_awaiting_activity());
    }
}
