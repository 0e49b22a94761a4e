use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub batch: BatchSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Credentials and endpoints per backend. A backend without configuration
/// is simply not registered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendsConfig {
    pub anthropic: Option<BackendConfig>,
    pub gemini: Option<BackendConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub api_key: String,
    pub base_url: Option<String>,
}

/// Dispatcher tuning
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// Batch orchestrator tuning
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Wall-clock budget for a whole batch, unbounded when unset.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_call_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            deadline_secs: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.dispatch.call_timeout_secs, 120);
        assert_eq!(config.dispatch.max_retries, 2);
        assert_eq!(config.dispatch.retry_base_delay_ms, 500);
        assert_eq!(config.batch.max_concurrency, 4);
        assert!(config.batch.deadline_secs.is_none());
        assert!(config.backends.anthropic.is_none());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let json = serde_json::json!({
            "backends": {
                "gemini": {"api_key": "g-key"}
            },
            "batch": {"max_concurrency": 8, "deadline_secs": 300}
        });

        let config: AppConfig = serde_json::from_value(json).unwrap();

        assert_eq!(config.backends.gemini.unwrap().api_key, "g-key");
        assert!(config.backends.anthropic.is_none());
        assert_eq!(config.batch.max_concurrency, 8);
        assert_eq!(config.batch.deadline_secs, Some(300));
        // Untouched sections keep their defaults.
        assert_eq!(config.dispatch.max_retries, 2);
    }
}
