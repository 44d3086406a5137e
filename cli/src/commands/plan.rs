//! `plan`, `execute` and `run` commands.
use crate::commands::cli::{OutputFormat, PlanArgs, RunArgs};
use crate::render::{self, OutputRecord};
use planner_core::api as core_api;
use planner_core::api::{
    PhaseTransition, PlanHandle, PlanRunner, PlanSession, PlanStatus, ProgressEvent,
};

/// Exit code for a run stopped with Ctrl-C.
const INTERRUPTED: i32 = 130;

pub async fn handle_plan(
    args: PlanArgs,
    cfg: &core_api::AppConfig,
    format: OutputFormat,
) -> Result<i32, core_api::CliError> {
    let runner = PlanRunner::from_config(cfg)?;
    let mut session = PlanSession::new();
    let plan = runner.create_plan(&mut session, &args.prompt()).await?;
    emit_plan(&plan, format)?;
    Ok(0)
}

pub async fn handle_execute(
    plan_id: i64,
    cfg: &core_api::AppConfig,
    format: OutputFormat,
) -> Result<i32, core_api::CliError> {
    let runner = PlanRunner::from_config(cfg)?;
    // steps are unknown here; the backend only needs the id
    let mut session = PlanSession::with_plan(PlanHandle {
        plan_id,
        status: PlanStatus::Created,
        steps: Vec::new(),
    });
    execute_session(&runner, &mut session, format).await
}

pub async fn handle_run(
    args: RunArgs,
    cfg: &core_api::AppConfig,
    format: OutputFormat,
) -> Result<i32, core_api::CliError> {
    let runner = PlanRunner::from_config(cfg)?;
    let mut session = PlanSession::new();
    let plan = runner
        .create_plan(&mut session, &args.plan.prompt())
        .await?;
    emit_plan(&plan, format)?;
    if args.dry_run {
        return Ok(0);
    }
    execute_session(&runner, &mut session, format).await
}

async fn execute_session(
    runner: &PlanRunner,
    session: &mut PlanSession,
    format: OutputFormat,
) -> Result<i32, core_api::CliError> {
    if format == OutputFormat::Text {
        eprintln!("Connecting to the progress feed...");
    }

    // `None` when interrupted; the execute future is dropped with the select,
    // which closes the progress feed
    let outcome = tokio::select! {
        res = runner.execute(session, |ev| emit_event(ev, format)) => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };
    let Some(outcome) = outcome else {
        let phase = PhaseTransition::phase_description(session.phase());
        tracing::warn!(target: "planner.run", phase = phase, "interrupted, progress feed closed");
        match format {
            OutputFormat::Text => eprintln!("Interrupted while {phase}."),
            OutputFormat::Json => println!("{}", to_json(&OutputRecord::Interrupted { phase })?),
        }
        return Ok(INTERRUPTED);
    };
    let result = outcome?;

    match format {
        OutputFormat::Text => {
            if let Some(notes) = render::step_error_notes(session.step_errors()) {
                eprint!("{notes}");
            }
            print!("{}", render::final_results(&result));
        }
        OutputFormat::Json => println!("{}", to_json(&OutputRecord::Result { result: &result })?),
    }
    Ok(0)
}

fn emit_plan(plan: &PlanHandle, format: OutputFormat) -> Result<(), core_api::CliError> {
    match format {
        OutputFormat::Text => print!("{}", render::plan_preview(plan)),
        OutputFormat::Json => println!("{}", to_json(&OutputRecord::Plan { plan })?),
    }
    Ok(())
}

fn emit_event(ev: &ProgressEvent, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", render::event_line(ev)),
        OutputFormat::Json => match render::json_line(&OutputRecord::Event { event: ev }) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(target: "planner.run", error = %e, "event not serializable"),
        },
    }
}

fn to_json(record: &OutputRecord<'_>) -> Result<String, core_api::CliError> {
    render::json_line(record)
        .map_err(|e| core_api::CliError::Command(format!("failed to encode output: {e}")))
}
