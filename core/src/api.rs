//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `planner_core::api` instead of reaching into internal modules.

pub use crate::backend::{
    group_by_plan, BackendError, BackendErrorKind, ExecutionResult, MemoryContent, MemoryEntry,
    PlanHandle, PlanHistory, PlanStatus, PlannerClient, StepResult,
};
pub use crate::config::{
    get_planner_data_dir, load_default, AppConfig, BackendConfig, BackoffStrategy,
    ExecutionConfig, LoggingConfig, ReconnectConfig,
};
pub use crate::error::{CliError, OrchestratorError, StreamError};
pub use crate::orchestrator::{
    PhaseTransition, PlanBackend, PlanPhase, PlanRunner, PlanSession, SessionView,
};
pub use crate::stream::{
    ChannelObserver, ConnectionState, ProgressEvent, ProgressHandle, ProgressKind,
    ProgressObserver, ProgressStreamClient, ReconnectPolicy, StreamConfig, StreamSignal,
};
