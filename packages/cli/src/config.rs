use branchdoc_store::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "branchdoc.config.json";

/// Branchdoc configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// JSON snapshot the CLI reads and writes
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Permission groups of the caller; when absent every capability is granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grantee_groups: Option<Vec<String>>,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_store_path() -> String {
    "branchdoc.store.json".to_string()
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.engine.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get absolute path to the store snapshot
    pub fn get_store_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.store_path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            log_filter: default_log_filter(),
            grantee_groups: None,
            engine: EngineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "storePath": "data/store.json",
            "logFilter": "branchdoc_store=debug",
            "granteeGroups": ["developers"],
            "engine": { "cascadeConcurrency": 4, "analyticsEnabled": false }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.store_path, "data/store.json");
        assert_eq!(config.log_filter, "branchdoc_store=debug");
        assert_eq!(config.grantee_groups, Some(vec!["developers".to_string()]));
        assert_eq!(config.engine.cascade_concurrency, 4);
        assert!(!config.engine.analytics_enabled);
        assert_eq!(config.engine.unused_datasource_name, "UNUSED_DATASOURCE");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store_path, "branchdoc.store.json");
        assert_eq!(config.grantee_groups, None);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "storePath": "custom.json" }"#,
        )
        .unwrap();

        let cwd = dir.path().display().to_string();
        let config = Config::load(&cwd).unwrap();

        assert_eq!(config.store_path, "custom.json");
        assert_eq!(config.get_store_path(&cwd), dir.path().join("custom.json"));
    }

    #[test]
    fn test_invalid_engine_section_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "engine": { "cascadeConcurrency": 0 } }"#,
        )
        .unwrap();

        let err = Config::load(&dir.path().display().to_string()).unwrap_err();
        assert!(err.to_string().contains("cascadeConcurrency"));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert_eq!(config.log_filter, "warn");
    }
}
