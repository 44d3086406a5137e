use thiserror::Error;

use crate::backend::BackendError;
use crate::orchestrator::PlanPhase;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("backend request failed: {0}")]
    Backend(#[from] BackendError),
    #[error("plan execution failed: {0}")]
    Orchestrator(#[from] OrchestratorError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("connect to {url} failed: {message}")]
    Connect { url: String, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("stream closed before it opened")]
    ClosedBeforeOpen,
    #[error("reconnect budget exhausted after {attempts} attempts")]
    GaveUp { attempts: u32 },
    #[error("stream task is gone")]
    TaskGone,
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("{0}")]
    Backend(#[from] BackendError),
    #[error("progress stream unavailable: {0}")]
    Stream(#[from] StreamError),
    #[error("execution timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition { from: PlanPhase, to: PlanPhase },
    #[error("no plan is ready to execute")]
    NoPlan,
}

impl OrchestratorError {
    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(e) => e.user_message(),
            Self::Stream(StreamError::GaveUp { attempts }) => {
                format!("Lost connection to the progress feed after {attempts} reconnect attempts")
            }
            Self::Stream(_) => "Could not connect to the progress feed".to_string(),
            Self::Timeout { secs } => format!("Execution did not finish within {secs} seconds"),
            Self::InvalidTransition { .. } | Self::NoPlan => self.to_string(),
        }
    }
}
