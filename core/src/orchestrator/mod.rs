mod phase;
mod runner;
mod session;

pub use phase::{PhaseTransition, PlanPhase};
pub use runner::{PlanBackend, PlanRunner};
pub use session::{PlanSession, SessionView};
