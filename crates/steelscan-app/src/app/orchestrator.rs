//! Analysis orchestrator
//!
//! The session state lives in a single tokio task. Operators, gateway calls
//! and timers all talk to it through one channel, so each action is applied
//! as one atomic transition and only one analysis is ever authoritative.
//! A gateway call whose generation goes stale is aborted, so at most one
//! call is in flight.
//!
//! ```text
//! Enqueue -> StartAnalysis -> gateway -> AnalysisCompleted
//!   -> (auto-pilot) ScheduleAutoSave -> Commit -> ScheduleNext -> BeginAnalysis ...
//! ```

use std::sync::Arc;
use std::time::Duration;

use steelscan_domain::repository::KeyValueStore;
use steelscan_types::{Error, GatewayError, Result};
use steelscan_vision::{AnalysisGateway, AnalysisRequest};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::reconciler::CommitStamp;
use super::state::{reduce, Action, AppState, CommitTrigger, Effect, Transition};
use crate::repository::persist;
use crate::scheduler::Scheduler;

/// Named pauses of the processing loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    /// Between a result appearing and its auto-pilot commit
    pub auto_save: Duration,
    /// Between a commit and the next queued image starting
    pub next_image: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            auto_save: Duration::from_millis(1500),
            next_image: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub delays: Delays,
    pub analysis_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            delays: Delays::default(),
            analysis_timeout: Duration::from_secs(45),
        }
    }
}

enum Message {
    Dispatch(Action, Option<oneshot::Sender<AppState>>),
    Shutdown,
}

pub struct Orchestrator<S> {
    state: AppState,
    store: S,
    gateway: Arc<dyn AnalysisGateway>,
    scheduler: Arc<dyn Scheduler>,
    settings: OrchestratorSettings,
    tx: mpsc::UnboundedSender<Message>,
    snapshot: watch::Sender<AppState>,
    /// The gateway call in flight and the generation it answers
    in_flight: Option<(u64, JoinHandle<()>)>,
}

impl<S: KeyValueStore + 'static> Orchestrator<S> {
    /// Start a session on the current tokio runtime
    pub fn spawn(
        state: AppState,
        store: S,
        gateway: Arc<dyn AnalysisGateway>,
        scheduler: Arc<dyn Scheduler>,
        settings: OrchestratorSettings,
    ) -> SessionHandle<S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot, snapshot_rx) = watch::channel(state.clone());

        let orchestrator = Orchestrator {
            state,
            store,
            gateway,
            scheduler,
            settings,
            tx: tx.clone(),
            snapshot,
            in_flight: None,
        };
        let task = tokio::spawn(orchestrator.run(rx));

        SessionHandle {
            tx,
            snapshot: snapshot_rx,
            task,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) -> (AppState, S) {
        while let Some(message) = rx.recv().await {
            match message {
                Message::Dispatch(action, reply) => {
                    self.handle(action);
                    if let Some(reply) = reply {
                        reply.send(self.state.clone()).ok();
                    }
                }
                Message::Shutdown => break,
            }
        }

        debug!("session closed");
        (self.state, self.store)
    }

    fn handle(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        let Transition { state, effects } = reduce(state, action);
        self.state = state;

        for effect in effects {
            self.execute(effect);
        }
        self.cancel_stale_analysis();
        self.snapshot.send_replace(self.state.clone());
    }

    /// Abort the gateway call once its answer can no longer be used, so a
    /// new analysis never runs alongside it.
    fn cancel_stale_analysis(&mut self) {
        let stale = match &self.in_flight {
            Some((generation, _)) => *generation != self.state.generation || !self.state.loading,
            None => false,
        };
        if !stale {
            return;
        }
        if let Some((generation, task)) = self.in_flight.take() {
            if !task.is_finished() {
                debug!(generation, "stale analysis aborted");
                task.abort();
            }
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::StartAnalysis { generation } => self.start_analysis(generation),
            Effect::ScheduleAutoSave { generation } => {
                self.after(self.settings.delays.auto_save, move || Action::Commit {
                    stamp: CommitStamp::now(),
                    trigger: CommitTrigger::AutoPilot { generation },
                });
            }
            Effect::ScheduleNext { generation } => {
                self.after(self.settings.delays.next_image, move || {
                    Action::BeginAnalysis { generation }
                });
            }
            Effect::Persist(key) => persist(&mut self.store, &self.state, key),
        }
    }

    /// Dispatch the action built by `action` once `delay` has passed
    fn after<F>(&self, delay: Duration, action: F)
    where
        F: FnOnce() -> Action + Send + 'static,
    {
        let scheduler = Arc::clone(&self.scheduler);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            scheduler.sleep(delay).await;
            tx.send(Message::Dispatch(action(), None)).ok();
        });
    }

    fn analysis_request(&self) -> Option<AnalysisRequest> {
        let image = self.state.current_image()?.clone();
        let profile = self.state.active_profile();

        Some(AnalysisRequest {
            images: vec![image],
            palette: self.state.palette.clone(),
            brand_name: profile.map(|p| p.brand.clone()).unwrap_or_default(),
            brand_phone: profile.map(|p| p.phone.clone()).unwrap_or_default(),
            configurator_url: profile
                .map(|p| p.configurator_url.clone())
                .unwrap_or_default(),
        })
    }

    fn start_analysis(&mut self, generation: u64) {
        if let Some((stale, task)) = self.in_flight.take() {
            debug!(generation = stale, "replaced analysis aborted");
            task.abort();
        }
        let tx = self.tx.clone();

        let Some(request) = self.analysis_request() else {
            let outcome = Err(GatewayError::Rejected("No image to analyze".to_string()));
            tx.send(Message::Dispatch(
                Action::AnalysisCompleted { generation, outcome },
                None,
            ))
            .ok();
            return;
        };

        let gateway = Arc::clone(&self.gateway);
        let limit = self.settings.analysis_timeout;
        info!(generation, images = request.images.len(), "calling analysis gateway");

        let task = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(limit, gateway.analyze(request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(GatewayError::Timeout(limit.as_secs())),
            };
            tx.send(Message::Dispatch(
                Action::AnalysisCompleted { generation, outcome },
                None,
            ))
            .ok();
        });
        self.in_flight = Some((generation, task));
    }
}

/// Operator side of a running session
pub struct SessionHandle<S> {
    tx: mpsc::UnboundedSender<Message>,
    snapshot: watch::Receiver<AppState>,
    task: JoinHandle<(AppState, S)>,
}

fn closed() -> Error {
    Error::Session("session closed".to_string())
}

impl<S> SessionHandle<S> {
    /// Queue an action without waiting for it
    pub fn dispatch(&self, action: Action) -> Result<()> {
        self.tx
            .send(Message::Dispatch(action, None))
            .map_err(|_| closed())
    }

    /// Apply an action and return the state right after it
    pub async fn apply(&self, action: Action) -> Result<AppState> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Dispatch(action, Some(reply)))
            .map_err(|_| closed())?;
        rx.await.map_err(|_| closed())
    }

    /// Operator save of the pending result
    pub async fn commit(&self) -> Result<AppState> {
        self.apply(Action::Commit {
            stamp: CommitStamp::now(),
            trigger: CommitTrigger::Manual,
        })
        .await
    }

    pub fn snapshot(&self) -> AppState {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.snapshot.clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_until<F>(&self, predicate: F) -> Result<AppState>
    where
        F: FnMut(&AppState) -> bool,
    {
        let mut rx = self.snapshot.clone();
        let state = rx.wait_for(predicate).await.map_err(|_| closed())?;
        Ok(state.clone())
    }

    /// Stop the session and hand back the final state and the store
    pub async fn shutdown(self) -> Result<(AppState, S)> {
        self.tx.send(Message::Shutdown).ok();
        self.task
            .await
            .map_err(|e| Error::Session(e.to_string()))
    }
}

/// Apply one action outside a session. Only `Persist` effects run; anything
/// that needs the gateway or a timer is skipped.
pub fn dispatch_offline<S>(state: AppState, action: Action, store: &mut S) -> AppState
where
    S: KeyValueStore + ?Sized,
{
    let Transition { state, effects } = reduce(state, action);
    for effect in effects {
        match effect {
            Effect::Persist(key) => persist(store, &state, key),
            other => debug!(?other, "effect skipped outside a session"),
        }
    }
    state
}
