use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Root of the agent REST API, e.g. `http://localhost:8000/api/v1/agent`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Progress feed WebSocket endpoint.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    #[serde(default = "default_health_url")]
    pub health_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1/agent".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8000/api/v1/agent/ws/progress".to_string()
}

fn default_health_url() -> String {
    "http://localhost:8000/api/v1/health/".to_string()
}

fn default_timeout_ms() -> u64 {
    40_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: default_ws_url(),
            health_url: default_health_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    #[default]
    Fixed,
    Exponential,
}

impl std::str::FromStr for BackoffStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "exponential" | "exp" => Ok(Self::Exponential),
            other => Err(format!("unknown backoff strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for exponential delays.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default)]
    pub strategy: BackoffStrategy,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    3_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            strategy: BackoffStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Hard ceiling for one plan execution, socket included.
    #[serde(default = "default_execution_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_execution_timeout_secs() -> u64 {
    60
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_execution_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory`.
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "planner_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Directory for log files. `load_default` fills in `~/.planner/logs` when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.backend.base_url, "http://localhost:8000/api/v1/agent");
        assert_eq!(
            cfg.backend.ws_url,
            "ws://localhost:8000/api/v1/agent/ws/progress"
        );
        assert_eq!(cfg.reconnect.max_attempts, 3);
        assert_eq!(cfg.reconnect.base_delay_ms, 3_000);
        assert_eq!(cfg.reconnect.strategy, BackoffStrategy::Fixed);
        assert_eq!(cfg.execution.timeout_secs, 60);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
[backend]
base_url = "http://planner.internal/api/v1/agent"

[reconnect]
max_attempts = 5
strategy = "exponential"
"#,
        )
        .unwrap();
        assert_eq!(cfg.backend.base_url, "http://planner.internal/api/v1/agent");
        assert_eq!(cfg.backend.timeout_ms, 40_000);
        assert_eq!(cfg.reconnect.max_attempts, 5);
        assert_eq!(cfg.reconnect.base_delay_ms, 3_000);
        assert_eq!(cfg.reconnect.strategy, BackoffStrategy::Exponential);
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!("Fixed".parse::<BackoffStrategy>(), Ok(BackoffStrategy::Fixed));
        assert_eq!(
            "exp".parse::<BackoffStrategy>(),
            Ok(BackoffStrategy::Exponential)
        );
        assert!("linear".parse::<BackoffStrategy>().is_err());
    }
}
