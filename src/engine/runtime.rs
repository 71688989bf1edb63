//! Engine Runtime
//!
//! Runs a [`GameEngine`] on its own tokio task. All stimuli go through one
//! command queue, the countdown is driven by an interval timer, and events
//! fan out over a broadcast channel.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::profile::ProfileStore;
use crate::engine::session::GameEngine;
use crate::engine::snapshot::EngineSnapshot;
use crate::game::events::GameEvent;
use crate::game::input::Action;
use crate::game::tick::ActionResult;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Countdown tick period
    pub tick_interval: Duration,
    /// Broadcast buffer per subscriber
    pub event_capacity: usize,
    /// Pending command limit
    pub command_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(crate::TICK_INTERVAL_MS),
            event_capacity: 256,
            command_capacity: 64,
        }
    }
}

/// Runtime errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// The engine task has exited.
    #[error("Engine task stopped")]
    EngineStopped,
}

enum Command {
    Action(Action, oneshot::Sender<ActionResult>),
    SetPaused(bool),
    Snapshot(oneshot::Sender<EngineSnapshot>),
    Shutdown,
}

/// Cloneable handle to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<GameEvent>,
}

impl EngineHandle {
    /// Send an action and wait for its outcome.
    pub async fn send(&self, action: Action) -> Result<ActionResult, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Action(action, reply_tx))
            .await
            .map_err(|_| RuntimeError::EngineStopped)?;
        reply_rx.await.map_err(|_| RuntimeError::EngineStopped)
    }

    /// Set the presentation pause flag.
    pub async fn set_paused(&self, paused: bool) -> Result<(), RuntimeError> {
        self.commands
            .send(Command::SetPaused(paused))
            .await
            .map_err(|_| RuntimeError::EngineStopped)
    }

    /// Current engine snapshot.
    pub async fn snapshot(&self) -> Result<EngineSnapshot, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(reply_tx))
            .await
            .map_err(|_| RuntimeError::EngineStopped)?;
        reply_rx.await.map_err(|_| RuntimeError::EngineStopped)
    }

    /// Subscribe to game events.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Ask the engine task to stop.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::EngineStopped)
    }
}

/// Spawn the engine onto the current tokio runtime.
///
/// The join handle yields the engine back once it stops (shutdown command
/// or every handle dropped).
pub fn spawn_engine<P>(
    engine: GameEngine<P>,
    config: RuntimeConfig,
) -> (EngineHandle, JoinHandle<GameEngine<P>>)
where
    P: ProfileStore + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
    let (event_tx, _) = broadcast::channel(config.event_capacity);

    let handle = EngineHandle {
        commands: command_tx,
        events: event_tx.clone(),
    };

    let task = tokio::spawn(run_engine(engine, config, command_rx, event_tx));
    (handle, task)
}

async fn run_engine<P: ProfileStore>(
    mut engine: GameEngine<P>,
    config: RuntimeConfig,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<GameEvent>,
) -> GameEngine<P> {
    let period = config.tick_interval;
    let dt = period.as_secs_f64();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(tick_ms = period.as_millis() as u64, "Engine runtime started");

    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(Command::Action(action, reply)) => {
                        let result = engine.apply(action);
                        if let Ok(produced) = &result {
                            publish(&events, produced);
                        }
                        if reply.send(result).is_err() {
                            debug!(action = action.name(), "Caller dropped before reply");
                        }
                    }
                    Some(Command::SetPaused(paused)) => engine.set_paused(paused),
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(engine.snapshot());
                    }
                    Some(Command::Shutdown) | None => break,
                }
            }
            _ = ticker.tick() => {
                let result = engine.tick(dt);
                publish(&events, &result.events);
            }
        }
    }

    info!("Engine runtime stopped");
    engine
}

fn publish(sender: &broadcast::Sender<GameEvent>, produced: &[GameEvent]) {
    if sender.receiver_count() == 0 {
        return;
    }
    for event in produced {
        if sender.send(event.clone()).is_err() {
            warn!("Event subscribers went away mid-publish");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::profile::Profile;
    use crate::game::events::GameEventData;
    use crate::game::problem::Mode;
    use crate::game::state::SessionPhase;
    use crate::game::tick::SessionConfig;

    fn spawn_default() -> (EngineHandle, JoinHandle<GameEngine<Profile>>) {
        let engine = GameEngine::new(SessionConfig::default(), Profile::default(), 77).unwrap();
        spawn_engine(engine, RuntimeConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_drives_countdown() {
        let (handle, _task) = spawn_default();
        handle.send(Action::StartGame { mode: Mode::Addition }).await.unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(1050)).await;

        let snap = handle.snapshot().await.unwrap();
        assert!(snap.is_active);
        assert!(snap.time_remaining < 30.0);
        assert!(snap.time_remaining > 28.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_countdown() {
        let (handle, _task) = spawn_default();
        handle.send(Action::StartGame { mode: Mode::Addition }).await.unwrap().unwrap();
        handle.set_paused(true).await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;

        let snap = handle.snapshot().await.unwrap();
        assert!(snap.paused);
        assert_eq!(snap.time_remaining, 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_and_continue_over_runtime() {
        let (handle, task) = spawn_default();
        let mut events = handle.subscribe();
        handle.send(Action::StartGame { mode: Mode::Addition }).await.unwrap().unwrap();

        // Countdown runs out after 30 simulated seconds
        loop {
            let event = events.recv().await.unwrap();
            if matches!(event.data, GameEventData::TimeExpired { .. }) {
                break;
            }
        }
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::AwaitingContinue);
        assert_eq!(snap.time_remaining, 0.0);

        // Hold the clock still while inspecting the resumed session
        handle.set_paused(true).await.unwrap();
        handle.send(Action::ContinueAfterTimeout).await.unwrap().unwrap();
        handle.send(Action::DeclineContinue).await.unwrap().unwrap_err();

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.health, 1);
        assert_eq!(snap.time_remaining, 15.0);

        handle.shutdown().await.unwrap();
        let engine = task.await.unwrap();
        assert_eq!(engine.profile().games_played, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_answers_reach_profile() {
        let (handle, task) = spawn_default();
        handle.send(Action::StartGame { mode: Mode::Addition }).await.unwrap().unwrap();

        let snap = handle.snapshot().await.unwrap();
        let answer = snap.current_problem.unwrap().correct_answer;
        let produced = handle.send(Action::SubmitAnswer { value: answer }).await.unwrap().unwrap();
        assert!(produced.iter().any(|e| matches!(
            e.data,
            GameEventData::AnswerEvaluated { correct: true, .. }
        )));

        handle.send(Action::ResetGame).await.unwrap().unwrap();
        drop(handle);

        // Dropping the last handle stops the task
        let engine = task.await.unwrap();
        assert!(engine.profile().rank_points > 0);
        assert_eq!(engine.profile().games_played, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_errors_after_stop() {
        let (handle, task) = spawn_default();
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(matches!(handle.snapshot().await, Err(RuntimeError::EngineStopped)));
        assert!(matches!(
            handle.send(Action::ResetGame).await,
            Err(RuntimeError::EngineStopped)
        ));
    }
}
