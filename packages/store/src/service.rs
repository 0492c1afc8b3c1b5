//! Facade wiring every component to one set of ports.

use crate::analytics::{AnalyticsEmitter, RecordingAnalytics};
use crate::assembly::{AssembledCollection, AssemblyPipeline, AssemblyRequest};
use crate::cascade::{ArchivedCollection, CascadeEngine, DeletedCollection};
use crate::config::EngineConfig;
use crate::identity::IdentityResolver;
use crate::memory::{
    InMemoryActionRepository, InMemoryApplicationBranches, InMemoryCollectionRepository,
    StaticPluginContext, StoreSnapshot,
};
use crate::merge::CollectionPatch;
use crate::model::{Capability, Collection, CollectionState, CollectionView, ViewMode};
use crate::ports::{
    ActionRepository, AnalyticsSink, ApplicationBranchResolver, CollectionRepository,
    PermissionEvaluator, PluginContextProvider,
};
use crate::store::DualStateStore;
use branchdoc_common::{IdGenerator, StoreResult};
use std::sync::Arc;

/// External collaborators the engine runs against
#[derive(Clone)]
pub struct Ports {
    pub collections: Arc<dyn CollectionRepository>,
    pub actions: Arc<dyn ActionRepository>,
    pub permissions: Arc<dyn PermissionEvaluator>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub plugins: Arc<dyn PluginContextProvider>,
    pub branches: Arc<dyn ApplicationBranchResolver>,
    pub ids: Arc<dyn IdGenerator>,
}

/// Concrete in-memory adapters, kept so callers can inspect or snapshot them
pub struct InMemoryPorts {
    pub collections: Arc<InMemoryCollectionRepository>,
    pub actions: Arc<InMemoryActionRepository>,
    pub branches: Arc<InMemoryApplicationBranches>,
    pub analytics: Arc<RecordingAnalytics>,
}

impl InMemoryPorts {
    /// Adapters restored from `snapshot`
    pub fn from_snapshot(snapshot: StoreSnapshot, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            collections: Arc::new(InMemoryCollectionRepository::with_documents(
                ids.clone(),
                snapshot.collections,
            )),
            actions: Arc::new(InMemoryActionRepository::with_documents(
                ids,
                snapshot.actions,
            )),
            branches: Arc::new(InMemoryApplicationBranches::with_branches(
                snapshot.application_branches,
            )),
            analytics: Arc::new(RecordingAnalytics::new()),
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            collections: self.collections.all().await,
            actions: self.actions.all().await,
            application_branches: self.branches.all().await,
        }
    }
}

impl Ports {
    /// Ports backed by `memory`, with the given permission evaluator and analytics sink
    pub fn in_memory(
        memory: &InMemoryPorts,
        permissions: Arc<dyn PermissionEvaluator>,
        analytics: Arc<dyn AnalyticsSink>,
        ids: Arc<dyn IdGenerator>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            collections: memory.collections.clone(),
            actions: memory.actions.clone(),
            permissions,
            analytics,
            plugins: Arc::new(StaticPluginContext::new(
                config.unused_datasource_name.clone(),
            )),
            branches: memory.branches.clone(),
            ids,
        }
    }
}

/// Every collection operation behind one handle
#[derive(Clone)]
pub struct CollectionService {
    resolver: IdentityResolver,
    store: DualStateStore,
    cascade: CascadeEngine,
    assembly: AssemblyPipeline,
}

impl CollectionService {
    pub fn new(ports: Ports, config: &EngineConfig) -> Self {
        let resolver = IdentityResolver::new(ports.collections.clone(), ports.permissions.clone());
        let analytics = AnalyticsEmitter::new(ports.analytics.clone(), config.analytics_enabled);

        let store = DualStateStore::new(
            ports.collections.clone(),
            ports.actions.clone(),
            ports.branches.clone(),
            resolver.clone(),
        );
        let cascade = CascadeEngine::new(
            ports.collections.clone(),
            ports.actions.clone(),
            resolver.clone(),
            analytics.clone(),
            config.cascade_concurrency,
        );
        let assembly = AssemblyPipeline::new(
            ports.collections,
            ports.actions,
            ports.plugins,
            ports.ids,
            analytics,
        );

        Self {
            resolver,
            store,
            cascade,
            assembly,
        }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn store(&self) -> &DualStateStore {
        &self.store
    }

    pub fn cascade(&self) -> &CascadeEngine {
        &self.cascade
    }

    pub fn assembly(&self) -> &AssemblyPipeline {
        &self.assembly
    }

    pub async fn resolve(
        &self,
        branch_name: Option<&str>,
        logical_id: &str,
        capability: Capability,
    ) -> StoreResult<Collection> {
        self.resolver.resolve(branch_name, logical_id, capability).await
    }

    pub async fn assemble(&self, request: AssemblyRequest) -> StoreResult<AssembledCollection> {
        self.assembly.assemble(request).await
    }

    pub async fn view(&self, id: &str, mode: ViewMode) -> StoreResult<CollectionState> {
        self.store.find_view(id, mode, Capability::Read).await
    }

    pub async fn update(&self, id: &str, patch: &CollectionPatch) -> StoreResult<CollectionState> {
        self.store.update(id, patch).await
    }

    pub async fn archive(&self, id: &str) -> StoreResult<ArchivedCollection> {
        self.cascade.archive(id).await
    }

    pub async fn delete_unpublished(
        &self,
        id: &str,
        branch_name: Option<&str>,
    ) -> StoreResult<DeletedCollection> {
        self.cascade.delete_unpublished_on_branch(id, branch_name).await
    }

    pub async fn list_by_application(
        &self,
        application_id: &str,
        branch_name: Option<&str>,
        mode: ViewMode,
    ) -> StoreResult<Vec<CollectionState>> {
        self.store
            .list_by_application(application_id, branch_name, mode)
            .await
    }

    pub async fn views_for_application(
        &self,
        application_id: &str,
        branch_name: Option<&str>,
    ) -> StoreResult<Vec<CollectionView>> {
        self.store
            .views_for_application(application_id, branch_name)
            .await
    }
}
