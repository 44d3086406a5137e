//! REST side of the agent planner backend.

mod client;
mod error;
mod history;
mod models;

pub use client::PlannerClient;
pub use error::{BackendError, BackendErrorKind, NO_RESPONSE_MESSAGE};
pub use history::{group_by_plan, PlanHistory};
pub use models::{
    ExecuteResponse, ExecutionResult, MemoryContent, MemoryEntry, PlanHandle, PlanStatus,
    StepResult,
};
pub(crate) use models::text_or_json;
