mod load;
mod types;

pub use load::{
    apply_env_overrides, default_log_directory, get_planner_data_dir, load_default, load_from_path, ENV_BASE_URL,
    ENV_HEALTH_URL, ENV_WS_URL,
};
pub use types::{
    AppConfig, BackendConfig, BackoffStrategy, ExecutionConfig, LoggingConfig, ReconnectConfig,
};
