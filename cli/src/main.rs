use clap::Parser;
use planner_cli::app;
use planner_cli::commands::cli;
use planner_core::api::{CliError, LoggingConfig, OrchestratorError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", user_facing(&e));
            tracing::debug!(error = %e, "command failed");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = planner_core::api::load_default().map_err(|e| CliError::Config(e.to_string()))?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    app::dispatch(args, cfg).await
}

fn user_facing(e: &CliError) -> String {
    match e {
        CliError::Backend(be) => be.user_message(),
        CliError::Orchestrator(oe) => oe.user_message(),
        other => other.to_string(),
    }
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 11: config error
    // 20: backend unreachable / rejected request / IO error
    // 30: execution failed (socket gave up, timeout, execute rejected)
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Backend(_) => 20,
        CliError::Orchestrator(oe) => match oe {
            OrchestratorError::Backend(be) if be.kind().is_transport() => 20,
            OrchestratorError::Backend(_) => 30,
            OrchestratorError::Stream(_) => 30,
            OrchestratorError::Timeout { .. } => 30,
            OrchestratorError::InvalidTransition { .. } | OrchestratorError::NoPlan => 50,
        },
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            // config built without `load_default`
            None => planner_core::api::get_planner_data_dir()
                .map(|d| d.join("logs"))
                .map_err(|e| e.to_string())?,
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!(
            "planner.{}.{}.log",
            chrono::Local::now().format("%Y%m%d"),
            std::process::id()
        );
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
