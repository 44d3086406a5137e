//! Client side of the agent action planner: REST calls, the live progress
//! feed with reconnects, and the plan run that ties them together.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod stream;
