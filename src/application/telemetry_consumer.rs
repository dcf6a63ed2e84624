// Telemetry consumer - Run lifecycle over the job server and its event stream
use crate::application::job_server::{EventStream, JobServer, JobServerError};
use crate::domain::message::classify;
use crate::domain::run_state::{Disposition, RunState, RunView};
use crate::domain::status::{Failure, FailureKind, Status};
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartRejected {
    #[error("no bearing selected")]
    EmptyTarget,
    #[error("a simulation for {0} is already active")]
    RunActive(String),
    #[error("the simulation for {0} is still stopping")]
    StopPending(String),
}

struct Connection {
    generation: u64,
    pump: JoinHandle<()>,
}

/// Lock order: `state` before `connection`, never the other way round.
struct Shared {
    server: Arc<dyn JobServer>,
    state: Mutex<RunState>,
    connection: Mutex<Option<Connection>>,
    updates: watch::Sender<u64>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_connection(&self) -> MutexGuard<'_, Option<Connection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.updates.send_modify(|revision| *revision += 1);
    }

    /// Runs `f` against run `generation`, or returns `None` if that run has
    /// been superseded.
    fn with_run<R>(&self, generation: u64, f: impl FnOnce(&mut RunState) -> R) -> Option<R> {
        let result = {
            let mut state = self.lock_state();
            if state.generation != generation {
                return None;
            }
            f(&mut *state)
        };
        self.notify();
        Some(result)
    }

    /// Spawns the pump for `events` and registers it as the open connection.
    fn attach_stream(self: &Arc<Self>, generation: u64, events: EventStream) {
        let mut slot = self.lock_connection();
        let pump = tokio::spawn(pump_events(Arc::clone(self), generation, events));
        if let Some(previous) = slot.replace(Connection { generation, pump }) {
            previous.pump.abort();
        }
    }

    /// The only place the event stream is torn down. With a generation,
    /// only that run's connection is closed.
    fn close_stream(&self, generation: Option<u64>) {
        let connection = {
            let mut slot = self.lock_connection();
            match (slot.as_ref(), generation) {
                (Some(open), Some(generation)) if open.generation != generation => None,
                _ => slot.take(),
            }
        };
        if let Some(connection) = connection {
            tracing::debug!(generation = connection.generation, "closing event stream");
            connection.pump.abort();
        }
    }

    /// Fails the run after the stream broke. A job that was already started
    /// is told to stop, since nobody is listening to it any more.
    fn lose_stream(self: &Arc<Self>, generation: u64, err: JobServerError) -> Option<Disposition> {
        let orphaned = self.with_run(generation, |state| {
            if !state.status.is_active() {
                return false;
            }
            state.fail(FailureKind::Connection, err.to_string());
            state.job_started && state.claim_stop()
        })?;
        if orphaned {
            self.release_job(generation);
        }
        Some(Disposition::Close)
    }

    /// Remote stop outside `stop()`; the answer only goes to the run's log.
    fn release_job(self: &Arc<Self>, generation: u64) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = shared.server.stop_simulation().await;
            shared.with_run(generation, |state| match outcome {
                Ok(message) => state.info(message),
                Err(err) => state.error(format!("Erro ao parar simulação: {}", err)),
            });
        });
    }
}

/// Owns one run at a time: the start/stop control calls, the event stream
/// and the state derived from it.
pub struct TelemetryConsumer {
    shared: Arc<Shared>,
}

impl TelemetryConsumer {
    pub fn new(server: Arc<dyn JobServer>) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                server,
                state: Mutex::new(RunState::idle(0)),
                connection: Mutex::new(None),
                updates,
            }),
        }
    }

    /// Receiver that is marked changed after every state mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.updates.subscribe()
    }

    pub fn status(&self) -> Status {
        self.shared.lock_state().status.clone()
    }

    pub fn view(&self) -> RunView {
        self.shared.lock_state().view()
    }

    pub fn is_streaming(&self) -> bool {
        self.shared
            .lock_connection()
            .as_ref()
            .is_some_and(|connection| !connection.pump.is_finished())
    }

    /// Start a run for `target`. Rejected while another run is active or
    /// still stopping; every other failure ends up in the run's status and
    /// log.
    pub async fn start(&self, target: &str) -> Result<(), StartRejected> {
        if target.trim().is_empty() {
            return Err(StartRejected::EmptyTarget);
        }

        let generation = {
            let mut state = self.shared.lock_state();
            if state.status.is_active() {
                return Err(StartRejected::RunActive(state.target.clone()));
            }
            if state.status == Status::Stopping {
                return Err(StartRejected::StopPending(state.target.clone()));
            }
            let generation = state.generation + 1;
            *state = RunState::starting(generation, target);
            state.info(format!("Iniciando simulação para {}...", target));
            generation
        };
        self.shared.close_stream(None);
        self.shared.notify();

        let events = match self.shared.server.open_events().await {
            Ok(events) => events,
            Err(err) => {
                self.shared.with_run(generation, |state| {
                    if state.status.is_active() {
                        state.fail(FailureKind::Connection, err.to_string());
                    }
                });
                return Ok(());
            }
        };

        // The connection is registered under the state lock, so a stop or
        // reset sees either no stream and `Starting`, or both.
        let opened = self.shared.with_run(generation, |state| {
            if state.status != Status::Starting {
                return false;
            }
            state.status = Status::AwaitingData;
            state.info("Conectado ao servidor para atualizações.");
            self.shared.attach_stream(generation, events);
            true
        });
        if opened != Some(true) {
            return Ok(());
        }

        match self.shared.server.start_simulation(target).await {
            Ok(message) => {
                let orphaned = self.shared.with_run(generation, |state| {
                    state.info(message);
                    state.job_started = true;
                    matches!(
                        state.status,
                        Status::Failed(Failure { kind: FailureKind::Connection, .. })
                    ) && state.claim_stop()
                });
                if orphaned == Some(true) {
                    self.shared.release_job(generation);
                }
            }
            Err(err) => {
                let failed = self.shared.with_run(generation, |state| {
                    if !state.status.is_active() {
                        return false;
                    }
                    state.error(format!("Falha ao iniciar simulação: {}", err));
                    state.status = Status::Failed(Failure::new(FailureKind::Start, err.to_string()));
                    true
                });
                if failed == Some(true) {
                    self.shared.close_stream(Some(generation));
                }
            }
        }
        Ok(())
    }

    /// Stop the active run. The stream is closed before the remote stop is
    /// requested, and the run ends `Stopped` whatever the server answers.
    /// Without an active run this does nothing.
    pub async fn stop(&self) {
        let generation = {
            let mut state = self.shared.lock_state();
            if !state.status.is_active() || !state.claim_stop() {
                tracing::debug!(status = %state.status, "stop ignored, no active run");
                return;
            }
            state.info("Tentando parar a simulação...");
            state.status = Status::Stopping;
            state.generation
        };
        self.shared.notify();
        self.shared.close_stream(Some(generation));

        let outcome = self.shared.server.stop_simulation().await;
        self.shared.with_run(generation, |state| {
            match outcome {
                Ok(message) => state.info(message),
                Err(err) => state.error(format!("Erro ao parar simulação: {}", err)),
            }
            state.status = Status::Stopped;
        });
    }

    /// Discard the current run without contacting the job server.
    pub fn reset(&self) {
        {
            let mut state = self.shared.lock_state();
            let generation = state.generation + 1;
            *state = RunState::idle(generation);
        }
        self.shared.close_stream(None);
        self.shared.notify();
    }
}

impl Drop for TelemetryConsumer {
    fn drop(&mut self) {
        self.shared.close_stream(None);

        let orphaned = {
            let mut state = self.shared.lock_state();
            state.status.is_active() && state.claim_stop()
        };
        if !orphaned {
            return;
        }
        // Best effort: the job would otherwise keep running with nobody listening.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let server = Arc::clone(&self.shared.server);
            handle.spawn(async move {
                if let Err(err) = server.stop_simulation().await {
                    tracing::warn!("stop on drop failed: {}", err);
                }
            });
        }
    }
}

async fn pump_events(shared: Arc<Shared>, generation: u64, mut events: EventStream) {
    loop {
        let disposition = match events.next().await {
            Some(Ok(frame)) => {
                tracing::debug!(generation, len = frame.len(), "event frame");
                let event = classify(&frame);
                shared.with_run(generation, |state| state.apply(event))
            }
            Some(Err(err)) => shared.lose_stream(generation, err),
            None => shared.lose_stream(generation, JobServerError::StreamClosed),
        };
        if disposition != Some(Disposition::Keep) {
            break;
        }
    }
    shared.close_stream(Some(generation));
}
