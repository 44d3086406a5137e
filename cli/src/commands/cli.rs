use clap::{Args as ClapArgs, Parser, Subcommand};
use planner_core::api::BackoffStrategy;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "planner", about = "Create and run agent action plans")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Root of the agent REST API (overrides config and PLANNER_BASE_URL).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Progress feed WebSocket URL.
    #[arg(long, global = true)]
    pub ws_url: Option<String>,

    /// Reconnect backoff: fixed or exponential.
    #[arg(long, global = true)]
    pub strategy: Option<BackoffStrategy>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    /// What the agent should plan for.
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

impl PlanArgs {
    pub fn prompt(&self) -> String {
        self.prompt.join(" ")
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExecuteArgs {
    pub plan_id: i64,

    /// Execution timeout in seconds (overrides config).
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Execution timeout in seconds (overrides config).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Stop after showing the plan.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a plan and print its steps.
    Plan(PlanArgs),
    /// Execute an existing plan with live progress.
    Execute(ExecuteArgs),
    /// Create a plan, then execute it with live progress.
    Run(RunArgs),
    /// Show past plans recorded by the backend.
    Memory,
    /// Check whether the backend is reachable.
    Health,
}
