use crate::commands::cli::OutputFormat;
use planner_core::api as core_api;
use serde_json::json;

/// Exit code when the backend does not answer healthy.
pub const UNHEALTHY: i32 = 20;

pub async fn handle_health(
    cfg: &core_api::AppConfig,
    format: OutputFormat,
) -> Result<i32, core_api::CliError> {
    let client = core_api::PlannerClient::new(&cfg.backend)?;
    let healthy = client.health_check().await;

    match format {
        OutputFormat::Text if healthy => println!("backend healthy ({})", cfg.backend.health_url),
        OutputFormat::Text => println!("backend unreachable ({})", cfg.backend.health_url),
        OutputFormat::Json => println!(
            "{}",
            json!({ "healthy": healthy, "url": cfg.backend.health_url })
        ),
    }
    Ok(if healthy { 0 } else { UNHEALTHY })
}
