use crate::config::Config;
use anyhow::{Context, Result};
use branchdoc_common::UuidGenerator;
use branchdoc_store::{
    AllowAll, AnalyticsSink, CollectionService, GroupPermissionEvaluator, IdGenerator,
    InMemoryPorts, PermissionEvaluator, Ports, StoreSnapshot, TracingAnalytics,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Collection service over the JSON store file, written back on [`Session::persist`]
pub struct Session {
    pub service: CollectionService,
    memory: InMemoryPorts,
    path: PathBuf,
}

impl Session {
    pub fn open(config: &Config, cwd: &str) -> Result<Self> {
        let path = config.get_store_path(cwd);
        let snapshot = read_snapshot(&path)?;
        debug!(
            path = %path.display(),
            collections = snapshot.collections.len(),
            actions = snapshot.actions.len(),
            "Loaded store"
        );

        let ids: Arc<dyn IdGenerator> = Arc::new(UuidGenerator);
        let memory = InMemoryPorts::from_snapshot(snapshot, ids.clone());

        let permissions: Arc<dyn PermissionEvaluator> = match &config.grantee_groups {
            Some(groups) => Arc::new(GroupPermissionEvaluator::new(groups.iter().cloned())),
            None => Arc::new(AllowAll),
        };
        let analytics: Arc<dyn AnalyticsSink> = Arc::new(TracingAnalytics);

        let ports = Ports::in_memory(&memory, permissions, analytics, ids, &config.engine);
        Ok(Self {
            service: CollectionService::new(ports, &config.engine),
            memory,
            path,
        })
    }

    /// Write the current store contents back to disk
    pub async fn persist(&self) -> Result<()> {
        let snapshot = self.memory.snapshot().await;
        let content = serde_json::to_string_pretty(&snapshot)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write store {}", self.path.display()))?;
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<StoreSnapshot> {
    if !path.exists() {
        return Ok(StoreSnapshot::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse store {}", path.display()))
}

/// Read a JSON document given on the command line
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
