pub mod cli;
pub mod health;
pub mod memory;
pub mod plan;
