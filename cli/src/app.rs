//! CLI wiring: merge flag overrides into the loaded config and dispatch commands.
use crate::commands::cli::{Args, Commands};
use crate::commands::{health, memory, plan};
use planner_core::api as core_api;

/// Flags win over the config file and environment.
pub fn apply_overrides(cfg: &mut core_api::AppConfig, args: &Args) {
    if let Some(url) = args.base_url.as_deref().filter(|s| !s.trim().is_empty()) {
        cfg.backend.base_url = url.trim().to_string();
    }
    if let Some(url) = args.ws_url.as_deref().filter(|s| !s.trim().is_empty()) {
        cfg.backend.ws_url = url.trim().to_string();
    }
    if let Some(strategy) = args.strategy {
        cfg.reconnect.strategy = strategy;
    }
}

#[tracing::instrument(name = "cli.dispatch", skip(args, cfg))]
pub async fn dispatch(args: Args, mut cfg: core_api::AppConfig) -> Result<i32, core_api::CliError> {
    apply_overrides(&mut cfg, &args);
    tracing::debug!(
        base_url = %cfg.backend.base_url,
        ws_url = %cfg.backend.ws_url,
        strategy = ?cfg.reconnect.strategy,
        "effective backend config"
    );

    let format = args.format;
    match args.command {
        Commands::Plan(plan_args) => plan::handle_plan(plan_args, &cfg, format).await,
        Commands::Execute(exec_args) => {
            if let Some(secs) = exec_args.timeout_secs {
                cfg.execution.timeout_secs = secs;
            }
            plan::handle_execute(exec_args.plan_id, &cfg, format).await
        }
        Commands::Run(run_args) => {
            if let Some(secs) = run_args.timeout_secs {
                cfg.execution.timeout_secs = secs;
            }
            plan::handle_run(run_args, &cfg, format).await
        }
        Commands::Memory => memory::handle_memory(&cfg, format).await,
        Commands::Health => health::handle_health(&cfg, format).await,
    }
}
