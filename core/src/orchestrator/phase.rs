//! Plan session phases and the rules between them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanPhase {
    Idle,
    /// Plan creation request in flight.
    AwaitingPlan,
    /// Plan received, execute not requested yet.
    PlanReady,
    /// Progress socket opening; execute is held back until it is open.
    ConnectingSocket,
    /// Execute issued, events streaming.
    Executing,
    Completed,
    Failed,
}

pub struct PhaseTransition;

impl PhaseTransition {
    pub fn validate(from: PlanPhase, to: PlanPhase) -> bool {
        use PlanPhase::*;

        match (from, to) {
            // a new prompt may always start over, except while busy
            (Idle | PlanReady | Completed | Failed, AwaitingPlan) => true,

            (AwaitingPlan, PlanReady) => true,
            (PlanReady, ConnectingSocket) => true,
            (ConnectingSocket, Executing) => true,
            (Executing, Completed) => true,

            (AwaitingPlan | ConnectingSocket | Executing, Failed) => true,

            _ => false,
        }
    }

    pub fn is_terminal(phase: PlanPhase) -> bool {
        matches!(phase, PlanPhase::Completed | PlanPhase::Failed)
    }

    pub fn is_busy(phase: PlanPhase) -> bool {
        matches!(
            phase,
            PlanPhase::AwaitingPlan | PlanPhase::ConnectingSocket | PlanPhase::Executing
        )
    }

    pub fn phase_description(phase: PlanPhase) -> &'static str {
        match phase {
            PlanPhase::Idle => "idle",
            PlanPhase::AwaitingPlan => "creating plan",
            PlanPhase::PlanReady => "plan ready",
            PlanPhase::ConnectingSocket => "connecting to progress feed",
            PlanPhase::Executing => "executing",
            PlanPhase::Completed => "completed",
            PlanPhase::Failed => "failed",
        }
    }
}
