//! `memory` command: past plans grouped from the backend memory log.
use crate::commands::cli::OutputFormat;
use crate::render;
use planner_core::api as core_api;
use serde_json::json;

pub async fn handle_memory(
    cfg: &core_api::AppConfig,
    format: OutputFormat,
) -> Result<i32, core_api::CliError> {
    let client = core_api::PlannerClient::new(&cfg.backend)?;
    let entries = client.get_memory().await?;
    let plans = core_api::group_by_plan(&entries);
    tracing::debug!(entries = entries.len(), plans = plans.len(), "memory loaded");

    match format {
        OutputFormat::Text => print!("{}", render::history(&plans)),
        OutputFormat::Json => {
            let output = json!({
                "plans": plans
                    .iter()
                    .map(|p| json!({
                        "plan_id": p.plan_id,
                        "prompt": p.prompt,
                        "created_at": p.created_at,
                        "entries": p.entries,
                    }))
                    .collect::<Vec<_>>(),
                "count": plans.len(),
            });
            let text = serde_json::to_string_pretty(&output)
                .map_err(|e| core_api::CliError::Command(format!("failed to encode output: {e}")))?;
            println!("{text}");
        }
    }
    Ok(0)
}
