//! Batch ingestion and inventory reconciliation workflow

pub mod orchestrator;
pub mod queue;
pub mod reconciler;
pub mod state;

pub use orchestrator::{dispatch_offline, Delays, Orchestrator, OrchestratorSettings, SessionHandle};
pub use queue::QueueManager;
pub use reconciler::{build_record, commit, CommitInput, CommitStamp, Reconciled};
pub use state::{reduce, Action, AppState, CommitTrigger, Effect, Phase, Transition, View};
