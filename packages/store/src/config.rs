use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine tuning shared by every component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Name of the placeholder datasource given to actions created without one
    #[serde(default = "default_unused_datasource_name")]
    pub unused_datasource_name: String,

    /// Child archives in flight at once during a cascade
    #[serde(default = "default_cascade_concurrency")]
    pub cascade_concurrency: usize,

    /// Whether analytics events are sent at all
    #[serde(default = "default_analytics_enabled")]
    pub analytics_enabled: bool,
}

fn default_unused_datasource_name() -> String {
    "UNUSED_DATASOURCE".to_string()
}

fn default_cascade_concurrency() -> usize {
    8
}

fn default_analytics_enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unused_datasource_name: default_unused_datasource_name(),
            cascade_concurrency: default_cascade_concurrency(),
            analytics_enabled: default_analytics_enabled(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cascade_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "cascadeConcurrency must be at least 1".to_string(),
            ));
        }
        if self.unused_datasource_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "unusedDatasourceName must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
