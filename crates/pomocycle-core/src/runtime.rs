//! Single-task driver for [`TimerEngine`].
//!
//! Ticks, commands and activity edges are serialized into one ordered stream
//! consumed by the task that owns the engine. Front-ends talk to it through a
//! cloneable [`TimerHandle`]; nothing touches the engine concurrently.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::clock::{as_ms, DeltaClock};
use crate::error::{CoreError, InvalidTransition, Result};
use crate::events::{Event, EventBus};
use crate::timer::{Command, TimerEngine, TimerSnapshot};

const INPUT_QUEUE: usize = 32;
const MIN_CADENCE: Duration = Duration::from_millis(10);

enum Input {
    Command(Command, oneshot::Sender<Result<(), InvalidTransition>>),
    Activity(oneshot::Sender<bool>),
    Snapshot(oneshot::Sender<TimerSnapshot>),
    Shutdown,
}

/// Cloneable front door to a running [`TimerRuntime`].
#[derive(Debug, Clone)]
pub struct TimerHandle {
    tx: mpsc::Sender<Input>,
    events: EventBus,
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Command(cmd, _) => write!(f, "Command({cmd})"),
            Input::Activity(_) => f.write_str("Activity"),
            Input::Snapshot(_) => f.write_str("Snapshot"),
            Input::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl TimerHandle {
    /// # Errors
    ///
    /// `CoreError::Transition` if the timer rejected the command,
    /// `CoreError::RuntimeClosed` if the runtime has stopped.
    pub async fn command(&self, command: Command) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Command(command, reply)).await?;
        let outcome = rx.await.map_err(|_| CoreError::RuntimeClosed)?;
        outcome.map_err(CoreError::from)
    }

    pub async fn start(&self) -> Result<()> {
        self.command(Command::Start).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.command(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.command(Command::Resume).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.command(Command::Stop).await
    }

    pub async fn skip(&self) -> Result<()> {
        self.command(Command::Skip).await
    }

    /// Report an activity edge. Returns true if it auto-started work.
    pub async fn activity(&self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Activity(reply)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    pub async fn snapshot(&self) -> Result<TimerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Snapshot(reply)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Ask the runtime to stop after draining what is already queued.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Input::Shutdown).await
    }

    async fn send(&self, input: Input) -> Result<()> {
        trace!(?input, "queueing timer input");
        self.tx.send(input).await.map_err(|_| CoreError::RuntimeClosed)
    }
}

/// Owns the engine and the tick interval.
#[derive(Debug)]
pub struct TimerRuntime {
    engine: TimerEngine,
    cadence: Duration,
    rx: mpsc::Receiver<Input>,
}

impl TimerRuntime {
    pub const DEFAULT_CADENCE: Duration = Duration::from_secs(1);

    /// Cadences below 10ms (including zero) are raised to 10ms.
    pub fn new(engine: TimerEngine, cadence: Duration) -> (Self, TimerHandle) {
        let (tx, rx) = mpsc::channel(INPUT_QUEUE);
        let handle = TimerHandle {
            tx,
            events: engine.event_bus().clone(),
        };
        let runtime = Self {
            engine,
            cadence: cadence.max(MIN_CADENCE),
            rx,
        };
        (runtime, handle)
    }

    /// Spawn onto the current tokio runtime. The join handle yields the
    /// engine back once the runtime shuts down.
    pub fn spawn(engine: TimerEngine, cadence: Duration) -> (TimerHandle, JoinHandle<TimerEngine>) {
        let (runtime, handle) = Self::new(engine, cadence);
        (handle, tokio::spawn(runtime.run()))
    }

    /// Run until `shutdown` is requested or every handle is dropped.
    pub async fn run(mut self) -> TimerEngine {
        let mut interval = tokio::time::interval_at(Instant::now() + self.cadence, self.cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut clock = DeltaClock::new();
        debug!(cadence_ms = as_ms(self.cadence), "timer runtime started");

        loop {
            tokio::select! {
                biased;
                input = self.rx.recv() => {
                    let Some(input) = input else { break };
                    if !self.handle_input(input, &mut clock) {
                        break;
                    }
                }
                at = interval.tick() => {
                    let delta = clock.lap_at(at);
                    if !self.engine.tick(delta) {
                        self.publish_progress();
                    }
                }
            }
        }

        debug!("timer runtime stopped");
        self.engine
    }

    fn publish_progress(&self) {
        let Some(phase) = self.engine.phase().running() else {
            return;
        };
        self.engine.event_bus().publish(Event::Tick {
            phase,
            elapsed_ms: as_ms(self.engine.elapsed()),
            remaining_ms: as_ms(self.engine.remaining()),
            at: Utc::now(),
        });
    }

    fn handle_input(&mut self, input: Input, clock: &mut DeltaClock) -> bool {
        let was_running = self.engine.phase().running().is_some();
        match input {
            Input::Command(command, reply) => {
                let outcome = match command {
                    Command::Start => self.engine.start(),
                    Command::Pause => self.engine.pause(),
                    Command::Resume => self.engine.resume(),
                    Command::Stop => self.engine.stop(),
                    Command::Skip => self.engine.skip(),
                };
                let _ = reply.send(outcome);
            }
            Input::Activity(reply) => {
                let _ = reply.send(self.engine.activity());
            }
            Input::Snapshot(reply) => {
                let _ = reply.send(self.engine.snapshot());
            }
            Input::Shutdown => return false,
        }
        // A clock that just started running must not be credited with the
        // time it spent idle or paused.
        if !was_running && self.engine.phase().running().is_some() {
            clock.restart();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{Phase, PhaseKind, TimerSettings};

    fn engine(auto_start: bool) -> TimerEngine {
        let s = |n| Duration::from_secs(n);
        TimerEngine::new(TimerSettings::new(s(5), s(3), s(4), 2, auto_start).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn interval_drives_work_into_break() {
        let (handle, task) = TimerRuntime::spawn(engine(false), TimerRuntime::DEFAULT_CADENCE);
        handle.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, Phase::ShortBreak);
        assert_eq!(snap.sessions_completed, 1);

        handle.shutdown().await.unwrap();
        let engine = task.await.unwrap();
        assert_eq!(engine.phase(), Phase::ShortBreak);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_time_is_not_counted() {
        let (handle, _task) = TimerRuntime::spawn(engine(false), TimerRuntime::DEFAULT_CADENCE);
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        handle.pause().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        handle.resume().await.unwrap();

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, Phase::Working);
        assert_eq!(snap.elapsed_ms, 2_000);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_commands_surface_as_transition_errors() {
        let (handle, _task) = TimerRuntime::spawn(engine(false), TimerRuntime::DEFAULT_CADENCE);
        let err = handle.resume().await.unwrap_err();
        assert!(matches!(err, CoreError::Transition(InvalidTransition { command: Command::Resume, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn activity_edge_through_handle() {
        let (handle, _task) = TimerRuntime::spawn(engine(true), TimerRuntime::DEFAULT_CADENCE);
        let mut events = handle.subscribe();
        assert!(!handle.activity().await.unwrap());

        handle.start().await.unwrap();
        handle.skip().await.unwrap();
        handle.skip().await.unwrap();
        assert!(handle.activity().await.unwrap());
        assert!(!handle.activity().await.unwrap());

        let mut auto_starts = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, Event::PhaseStarted { auto_started: true, .. }) {
                auto_starts += 1;
            }
        }
        assert_eq!(auto_starts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn running_phase_publishes_countdown_ticks() {
        let (handle, _task) = TimerRuntime::spawn(engine(false), TimerRuntime::DEFAULT_CADENCE);
        let mut events = handle.subscribe();
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        handle.pause().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        handle.snapshot().await.unwrap();

        let mut ticks = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let Event::Tick { phase, elapsed_ms, remaining_ms, .. } = event {
                assert_eq!(phase, PhaseKind::Working);
                ticks.push((elapsed_ms, remaining_ms));
            }
        }
        assert_eq!(ticks, vec![(1_000, 4_000), (2_000, 3_000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_cadence_is_raised_instead_of_panicking() {
        let (handle, task) = TimerRuntime::spawn(engine(false), Duration::ZERO);
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, Phase::ShortBreak);
        assert_eq!(snap.sessions_completed, 1);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn handle_errors_after_shutdown() {
        let (handle, task) = TimerRuntime::spawn(engine(false), TimerRuntime::DEFAULT_CADENCE);
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(matches!(handle.start().await, Err(CoreError::RuntimeClosed)));
    }
}
