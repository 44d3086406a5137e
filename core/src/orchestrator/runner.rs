use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::phase::PlanPhase;
use super::session::PlanSession;
use crate::backend::{BackendError, ExecutionResult, PlanHandle, PlannerClient};
use crate::config::AppConfig;
use crate::error::{OrchestratorError, StreamError};
use crate::stream::{
    ChannelObserver, ProgressEvent, ProgressHandle, ProgressStreamClient, StreamConfig,
    StreamSignal,
};

/// The two backend calls a plan run needs.
#[async_trait]
pub trait PlanBackend: Send + Sync {
    async fn create_plan(&self, prompt: &str) -> Result<PlanHandle, BackendError>;

    async fn execute_plan(&self, plan_id: i64) -> Result<ExecutionResult, BackendError>;
}

#[async_trait]
impl PlanBackend for PlannerClient {
    async fn create_plan(&self, prompt: &str) -> Result<PlanHandle, BackendError> {
        PlannerClient::create_plan(self, prompt).await
    }

    async fn execute_plan(&self, plan_id: i64) -> Result<ExecutionResult, BackendError> {
        PlannerClient::execute_plan(self, plan_id).await
    }
}

/// Drives a `PlanSession`: create, open the progress feed, execute once the
/// feed is open, then settle on the HTTP result.
pub struct PlanRunner {
    backend: Arc<dyn PlanBackend>,
    stream: ProgressStreamClient,
    timeout: Duration,
}

impl PlanRunner {
    pub fn new(
        backend: Arc<dyn PlanBackend>,
        stream: ProgressStreamClient,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            stream,
            timeout,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, BackendError> {
        let client = PlannerClient::new(&cfg.backend)?;
        Ok(Self::new(
            Arc::new(client),
            ProgressStreamClient::new(StreamConfig::from_app(cfg)),
            Duration::from_secs(cfg.execution.timeout_secs),
        ))
    }

    #[tracing::instrument(name = "planner.create_plan", skip(self, session))]
    pub async fn create_plan(
        &self,
        session: &mut PlanSession,
        prompt: &str,
    ) -> Result<PlanHandle, OrchestratorError> {
        session.begin_plan(prompt)?;
        match self.backend.create_plan(prompt).await {
            Ok(plan) => {
                tracing::info!(
                    target: "planner.run",
                    plan_id = plan.plan_id,
                    steps = plan.steps.len(),
                    "plan created"
                );
                session.plan_ready(plan.clone())?;
                Ok(plan)
            }
            Err(e) => Err(fail(session, e.into())),
        }
    }

    /// Runs the session's plan. `on_event` sees every streamed event as it
    /// arrives; the returned result is what the backend reported.
    #[tracing::instrument(name = "planner.execute", skip(self, session, on_event))]
    pub async fn execute<F>(
        &self,
        session: &mut PlanSession,
        mut on_event: F,
    ) -> Result<ExecutionResult, OrchestratorError>
    where
        F: FnMut(&ProgressEvent),
    {
        let plan_id = match session.plan() {
            Some(plan) if session.can_execute() => plan.plan_id,
            _ => return Err(OrchestratorError::NoPlan),
        };
        session.transition(PlanPhase::ConnectingSocket)?;

        let (observer, mut signals) = ChannelObserver::channel();
        let handle = self.stream.connect(Arc::new(observer));

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        // Nothing is sent to the backend until the feed is open, otherwise
        // the first step events would be lost.
        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => {
                    return Err(self.abort(session, &handle, self.timeout_error()));
                }
                signal = signals.recv() => match signal {
                    Some(StreamSignal::Open) => break,
                    Some(StreamSignal::Event(ev)) => {
                        on_event(&ev);
                        session.record(ev);
                    }
                    Some(StreamSignal::Error(msg)) => {
                        tracing::debug!(target: "planner.run", error = %msg, "progress feed error before open");
                    }
                    Some(StreamSignal::Closed) => {}
                    Some(StreamSignal::GaveUp { attempts }) => {
                        let err = StreamError::GaveUp { attempts }.into();
                        return Err(self.abort(session, &handle, err));
                    }
                    None => {
                        return Err(self.abort(session, &handle, StreamError::TaskGone.into()));
                    }
                },
            }
        }

        session.transition(PlanPhase::Executing)?;
        tracing::info!(target: "planner.run", plan_id = plan_id, "progress feed open, executing");

        let exec = self.backend.execute_plan(plan_id);
        tokio::pin!(exec);

        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut deadline => {
                    // dropping `exec` here discards any late response
                    return Err(self.abort(session, &handle, self.timeout_error()));
                }
                res = &mut exec => break res,
                Some(signal) = signals.recv() => match signal {
                    StreamSignal::Event(ev) => {
                        on_event(&ev);
                        session.record(ev);
                    }
                    StreamSignal::GaveUp { attempts } => {
                        tracing::warn!(
                            target: "planner.run",
                            attempts = attempts,
                            "progress feed lost, waiting for the execute response"
                        );
                    }
                    StreamSignal::Error(msg) => {
                        tracing::debug!(target: "planner.run", error = %msg, "progress feed error");
                    }
                    StreamSignal::Open | StreamSignal::Closed => {}
                },
            }
        };

        // keep whatever arrived alongside the response
        while let Ok(signal) = signals.try_recv() {
            if let StreamSignal::Event(ev) = signal {
                on_event(&ev);
                session.record(ev);
            }
        }
        handle.close();

        match outcome {
            Ok(result) => {
                tracing::info!(
                    target: "planner.run",
                    plan_id = result.plan_id,
                    steps = result.results.len(),
                    streamed = session.events().len(),
                    "execution completed"
                );
                session.complete(result.clone())?;
                Ok(result)
            }
            Err(e) => Err(fail(session, e.into())),
        }
    }

    fn timeout_error(&self) -> OrchestratorError {
        OrchestratorError::Timeout {
            secs: self.timeout.as_secs(),
        }
    }

    fn abort(
        &self,
        session: &mut PlanSession,
        handle: &ProgressHandle,
        err: OrchestratorError,
    ) -> OrchestratorError {
        handle.close();
        fail(session, err)
    }
}

fn fail(session: &mut PlanSession, err: OrchestratorError) -> OrchestratorError {
    tracing::warn!(target: "planner.run", phase = ?session.phase(), error = %err, "plan run failed");
    session.fail(err.user_message());
    err
}
