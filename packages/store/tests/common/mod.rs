#![allow(dead_code)]

use branchdoc_common::SequentialIdGenerator;
use branchdoc_store::{
    AllowAll, Capability, Collection, CollectionService, CollectionState, EngineConfig,
    IdGenerator, InMemoryPorts, PermissionEvaluator, Policy, Ports, StoreSnapshot,
};
use std::sync::Arc;

pub struct Harness {
    pub service: CollectionService,
    pub memory: InMemoryPorts,
}

pub fn harness() -> Harness {
    harness_with(Arc::new(AllowAll))
}

pub fn harness_with(permissions: Arc<dyn PermissionEvaluator>) -> Harness {
    let config = EngineConfig {
        cascade_concurrency: 3,
        ..EngineConfig::default()
    };
    let ids: Arc<dyn IdGenerator> = Arc::new(SequentialIdGenerator::new("it"));
    let memory = InMemoryPorts::from_snapshot(StoreSnapshot::default(), ids.clone());
    let ports = Ports::in_memory(
        &memory,
        permissions,
        memory.analytics.clone(),
        ids,
        &config,
    );
    Harness {
        service: CollectionService::new(ports, &config),
        memory,
    }
}

pub fn js_collection(name: &str) -> Collection {
    let mut draft = CollectionState::named(name);
    draft.page_id = Some("page-1".to_string());
    draft.plugin_id = Some("js-plugin".to_string());
    draft.body = Some("export default {}".to_string());
    let mut collection = Collection::new("app-1", draft);
    collection.workspace_id = Some("ws-1".to_string());
    collection.policies = [
        Policy::new(Capability::Read, ["developers"]),
        Policy::new(Capability::Edit, ["developers"]),
        Policy::new(Capability::Delete, ["developers"]),
        Policy::new(Capability::Execute, ["developers"]),
    ]
    .into_iter()
    .collect();
    collection
}
