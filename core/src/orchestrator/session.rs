use super::phase::{PhaseTransition, PlanPhase};
use crate::backend::{ExecutionResult, PlanHandle};
use crate::error::OrchestratorError;
use crate::stream::{ProgressEvent, ProgressKind};

/// What a front end should render for the session right now.
#[derive(Debug, PartialEq)]
pub enum SessionView<'a> {
    Empty,
    Pending,
    PlanPreview(&'a PlanHandle),
    Streaming(&'a [ProgressEvent]),
    Final(&'a ExecutionResult),
    Error(&'a str),
}

/// State of one plan from prompt to final result.
#[derive(Debug)]
pub struct PlanSession {
    phase: PlanPhase,
    prompt: Option<String>,
    plan: Option<PlanHandle>,
    events: Vec<ProgressEvent>,
    result: Option<ExecutionResult>,
    error: Option<String>,
}

impl Default for PlanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanSession {
    pub fn new() -> Self {
        Self {
            phase: PlanPhase::Idle,
            prompt: None,
            plan: None,
            events: Vec::new(),
            result: None,
            error: None,
        }
    }

    /// Session for a plan created elsewhere (e.g. an id given on the
    /// command line).
    pub fn with_plan(plan: PlanHandle) -> Self {
        Self {
            phase: PlanPhase::PlanReady,
            plan: Some(plan),
            ..Self::new()
        }
    }

    pub fn phase(&self) -> PlanPhase {
        self.phase
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn plan(&self) -> Option<&PlanHandle> {
        self.plan.as_ref()
    }

    /// Live log, in arrival order.
    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    pub fn step_errors(&self) -> impl Iterator<Item = &ProgressEvent> {
        self.events
            .iter()
            .filter(|ev| ev.kind == ProgressKind::StepError)
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Execute is offered only for a freshly received plan.
    pub fn can_execute(&self) -> bool {
        self.phase == PlanPhase::PlanReady && self.plan.is_some()
    }

    pub fn view(&self) -> SessionView<'_> {
        match self.phase {
            PlanPhase::Idle => SessionView::Empty,
            PlanPhase::AwaitingPlan => SessionView::Pending,
            PlanPhase::PlanReady => match &self.plan {
                Some(plan) => SessionView::PlanPreview(plan),
                None => SessionView::Empty,
            },
            PlanPhase::ConnectingSocket | PlanPhase::Executing => {
                SessionView::Streaming(&self.events)
            }
            PlanPhase::Completed => match &self.result {
                Some(result) => SessionView::Final(result),
                None => SessionView::Streaming(&self.events),
            },
            PlanPhase::Failed => SessionView::Error(self.error.as_deref().unwrap_or("failed")),
        }
    }

    pub(crate) fn transition(&mut self, to: PlanPhase) -> Result<(), OrchestratorError> {
        if !PhaseTransition::validate(self.phase, to) {
            return Err(OrchestratorError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!(target: "planner.run", from = ?self.phase, to = ?to, "phase");
        self.phase = to;
        Ok(())
    }

    pub(crate) fn begin_plan(&mut self, prompt: &str) -> Result<(), OrchestratorError> {
        self.transition(PlanPhase::AwaitingPlan)?;
        self.prompt = Some(prompt.to_string());
        self.plan = None;
        self.events.clear();
        self.result = None;
        self.error = None;
        Ok(())
    }

    pub(crate) fn plan_ready(&mut self, plan: PlanHandle) -> Result<(), OrchestratorError> {
        self.transition(PlanPhase::PlanReady)?;
        self.plan = Some(plan);
        Ok(())
    }

    pub(crate) fn record(&mut self, event: ProgressEvent) {
        if PhaseTransition::is_terminal(self.phase) {
            tracing::debug!(
                target: "planner.run",
                phase = ?self.phase,
                kind = event.kind.as_str(),
                "event after the run settled, dropped"
            );
            return;
        }
        if event.kind == ProgressKind::StepError {
            tracing::warn!(
                target: "planner.run",
                step = ?event.step,
                error = event.error.as_deref().unwrap_or(""),
                "step reported an error"
            );
        }
        self.events.push(event);
    }

    /// The HTTP result is authoritative; it replaces the live log as the
    /// final view.
    pub(crate) fn complete(&mut self, result: ExecutionResult) -> Result<(), OrchestratorError> {
        self.transition(PlanPhase::Completed)?;
        self.result = Some(result);
        Ok(())
    }

    /// Only a busy session can fail; anything else keeps its phase.
    pub(crate) fn fail(&mut self, message: String) {
        if !PhaseTransition::is_busy(self.phase) {
            tracing::debug!(
                target: "planner.run",
                phase = PhaseTransition::phase_description(self.phase),
                error = %message,
                "failure outside a running step ignored"
            );
            return;
        }
        if self.transition(PlanPhase::Failed).is_ok() {
            self.error = Some(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{PlanStatus, StepResult};

    fn plan() -> PlanHandle {
        PlanHandle {
            plan_id: 1,
            status: PlanStatus::Created,
            steps: vec!["Research".to_string(), "Draft".to_string()],
        }
    }

    #[test]
    fn preview_after_plan_ready() {
        let mut s = PlanSession::new();
        assert_eq!(s.view(), SessionView::Empty);
        s.begin_plan("organize my week").unwrap();
        assert_eq!(s.view(), SessionView::Pending);
        assert!(!s.can_execute());

        s.plan_ready(plan()).unwrap();
        assert!(s.can_execute());
        match s.view() {
            SessionView::PlanPreview(p) => assert_eq!(p.steps.len(), 2),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn final_view_replaces_streamed_events() {
        let mut s = PlanSession::with_plan(plan());
        s.transition(PlanPhase::ConnectingSocket).unwrap();
        s.transition(PlanPhase::Executing).unwrap();
        s.record(ProgressEvent::new(ProgressKind::StepStart, Some(1)));
        s.record(ProgressEvent::new(ProgressKind::StepComplete, Some(1)));
        assert!(matches!(s.view(), SessionView::Streaming(evs) if evs.len() == 2));

        let result = ExecutionResult {
            plan_id: 1,
            results: vec![StepResult {
                step: 1,
                description: "Research done".to_string(),
                result: None,
            }],
        };
        s.complete(result.clone()).unwrap();
        assert_eq!(s.view(), SessionView::Final(&result));
        assert_eq!(s.events().len(), 2);
    }

    #[test]
    fn step_error_is_informational() {
        let mut s = PlanSession::with_plan(plan());
        s.transition(PlanPhase::ConnectingSocket).unwrap();
        s.transition(PlanPhase::Executing).unwrap();

        let mut ev = ProgressEvent::new(ProgressKind::StepError, Some(2));
        ev.error = Some("tool failed".to_string());
        s.record(ev);

        assert_eq!(s.phase(), PlanPhase::Executing);
        assert_eq!(s.step_errors().count(), 1);
    }

    #[test]
    fn fail_keeps_message() {
        let mut s = PlanSession::new();
        s.begin_plan("x").unwrap();
        s.fail("No response from the server".to_string());
        assert_eq!(s.phase(), PlanPhase::Failed);
        assert_eq!(s.view(), SessionView::Error("No response from the server"));

        // a new prompt clears the failure
        s.begin_plan("y").unwrap();
        assert_eq!(s.error(), None);
        assert_eq!(s.prompt(), Some("y"));
    }

    #[test]
    fn settled_session_ignores_late_events_and_failures() {
        let mut s = PlanSession::with_plan(plan());
        s.fail("too early".to_string());
        assert_eq!(s.phase(), PlanPhase::PlanReady);
        assert_eq!(s.error(), None);

        s.transition(PlanPhase::ConnectingSocket).unwrap();
        s.transition(PlanPhase::Executing).unwrap();
        s.complete(ExecutionResult {
            plan_id: 1,
            results: Vec::new(),
        })
        .unwrap();

        s.record(ProgressEvent::new(ProgressKind::StepComplete, Some(2)));
        s.fail("late timeout".to_string());
        assert!(s.events().is_empty());
        assert_eq!(s.phase(), PlanPhase::Completed);
        assert_eq!(s.error(), None);
    }

    #[test]
    fn invalid_transition_is_reported() {
        let mut s = PlanSession::new();
        let err = s.transition(PlanPhase::Executing).unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::InvalidTransition {
                from: PlanPhase::Idle,
                to: PlanPhase::Executing
            }
        ));
    }
}
