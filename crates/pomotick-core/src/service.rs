//! Async owner of the timer engine.
//!
//! One tokio task owns the engine, its [`IntervalClock`] and the session
//! store. Commands, clock ticks and continue/stop decisions are all
//! serialized through that task, so there is never more than one armed
//! countdown and never more than one writer to the store.
//!
//! ## Usage
//!
//! ```ignore
//! let (handle, task) = TimerService::spawn(&config, store, alert)?;
//! let mut events = handle.subscribe();
//! handle.start()?;
//! while let Ok(event) = events.recv().await { /* render */ }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::alert::AlertService;
use crate::coordinator::{apply_decision, CompletionCoordinator, PendingDecision};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::storage::{Config, SessionStore};
use crate::timer::{EngineState, IntervalClock, TimerEngine};

/// Events buffered per subscriber before it starts lagging.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum Command {
    Start,
    Pause,
    Reset,
    SwitchToNextSession,
    SetDurations {
        work_minutes: u32,
        break_minutes: u32,
    },
    Snapshot(oneshot::Sender<EngineState>),
    Shutdown,
}

/// Cheap, cloneable front door to a running [`TimerService`].
#[derive(Clone)]
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<Event>,
}

impl TimerHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::ServiceClosed)
    }

    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    pub fn switch_to_next_session(&self) -> Result<()> {
        self.send(Command::SwitchToNextSession)
    }

    pub fn set_durations(&self, work_minutes: u32, break_minutes: u32) -> Result<()> {
        self.send(Command::SetDurations {
            work_minutes,
            break_minutes,
        })
    }

    pub async fn snapshot(&self) -> Result<EngineState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| CoreError::ServiceClosed)
    }

    /// Pause and stop the service. Its task resolves to the session store.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

pub struct TimerService {
    engine: TimerEngine<IntervalClock>,
    store: SessionStore,
    coordinator: CompletionCoordinator,
    commands: mpsc::UnboundedReceiver<Command>,
    decisions_tx: mpsc::UnboundedSender<PendingDecision>,
    decisions: mpsc::UnboundedReceiver<PendingDecision>,
    events: broadcast::Sender<Event>,
}

impl TimerService {
    /// Spawn the owner task on the current tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the configured durations are invalid.
    pub fn spawn(
        config: &Config,
        store: SessionStore,
        alert: Arc<dyn AlertService>,
    ) -> Result<(TimerHandle, JoinHandle<SessionStore>)> {
        let engine = TimerEngine::with_durations(
            IntervalClock::new(),
            config.timer.work_minutes,
            config.timer.break_minutes,
        )?;
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (decisions_tx, decisions) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let service = Self {
            engine,
            store,
            coordinator: CompletionCoordinator::new(alert, config.notifications.clone()),
            commands,
            decisions_tx,
            decisions,
            events: events.clone(),
        };
        let task = tokio::spawn(service.run());
        tracing::info!("timer service started");

        Ok((
            TimerHandle {
                commands: commands_tx,
                events,
            },
            task,
        ))
    }

    async fn run(mut self) -> SessionStore {
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => self.apply(command),
                },
                Some(pending) = self.decisions.recv() => {
                    if apply_decision(&mut self.engine, pending.generation, pending.decision) {
                        self.flush();
                        self.publish(Event::DecisionApplied {
                            generation: pending.generation,
                            decision: pending.decision,
                        });
                    }
                }
                _ = self.engine.clock_mut().next_tick() => self.engine.tick(),
            }
            self.flush();
        }

        self.engine.pause();
        self.flush();
        tracing::info!("timer service stopped");
        self.store
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Start => self.engine.start(),
            Command::Pause => self.engine.pause(),
            Command::Reset => self.engine.reset(),
            Command::SwitchToNextSession => self.engine.switch_to_next_session(),
            Command::SetDurations {
                work_minutes,
                break_minutes,
            } => {
                if let Err(e) = self.engine.set_durations(work_minutes, break_minutes) {
                    tracing::warn!(error = %e, "rejected duration change");
                }
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.engine.state());
            }
            // handled by the run loop
            Command::Shutdown => {}
        }
    }

    /// Publish queued engine events; completions also go to the coordinator.
    fn flush(&mut self) {
        for event in self.engine.drain_events() {
            if let Event::SessionCompleted {
                generation,
                session,
            } = &event
            {
                let next = self.engine.duration_for(session.kind.opposite());
                self.coordinator.handle_completion(
                    &mut self.store,
                    *generation,
                    session,
                    next,
                    self.decisions_tx.clone(),
                );
            }
            self.publish(event);
        }
    }

    fn publish(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{Decision, FixedAlert};
    use crate::timer::SessionKind;

    fn short_config() -> Config {
        let mut config = Config::default();
        config.timer.work_minutes = 1;
        config.timer.break_minutes = 1;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_reports_configured_state() {
        let (handle, task) = TimerService::spawn(
            &short_config(),
            SessionStore::open_memory().unwrap(),
            Arc::new(FixedAlert::always_stop()),
        )
        .unwrap();

        let state = handle.snapshot().await.unwrap();
        assert_eq!(state.mode, SessionKind::Work);
        assert_eq!(state.remaining_secs, 60);
        assert!(!state.running);

        handle.shutdown().unwrap();
        task.await.unwrap();
        assert!(handle.start().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_decision_is_applied_and_announced() {
        let (handle, task) = TimerService::spawn(
            &short_config(),
            SessionStore::open_memory().unwrap(),
            Arc::new(FixedAlert::always_stop()),
        )
        .unwrap();
        let mut events = handle.subscribe();
        handle.start().unwrap();

        let mut ticks = 0;
        loop {
            match events.recv().await.unwrap() {
                Event::Tick { .. } => ticks += 1,
                Event::DecisionApplied { decision, .. } => {
                    assert_eq!(decision, Decision::Stop);
                    break;
                }
                _ => {}
            }
        }
        assert_eq!(ticks, 60);

        let state = handle.snapshot().await.unwrap();
        assert_eq!(state.mode, SessionKind::Work);
        assert_eq!(state.remaining_secs, 60);
        assert!(!state.running);

        handle.shutdown().unwrap();
        let store = task.await.unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn decision_arrives_when_history_cannot_be_saved() {
        let store = SessionStore::open_memory().unwrap();
        store.break_schema();
        let (handle, task) = TimerService::spawn(
            &short_config(),
            store,
            Arc::new(FixedAlert::always_continue()),
        )
        .unwrap();
        let mut events = handle.subscribe();
        handle.start().unwrap();

        let mut completed = false;
        loop {
            match events.recv().await.unwrap() {
                Event::SessionCompleted { .. } => completed = true,
                Event::DecisionApplied { decision, .. } => {
                    assert_eq!(decision, Decision::Continue);
                    break;
                }
                _ => {}
            }
        }
        assert!(completed);

        let state = handle.snapshot().await.unwrap();
        assert_eq!(state.mode, SessionKind::Break);
        assert_eq!(state.remaining_secs, 60);
        assert!(state.running);

        handle.shutdown().unwrap();
        task.await.unwrap();
    }
}
