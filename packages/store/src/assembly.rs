//! # Collection Assembly
//!
//! Creates a collection together with the child actions described alongside it.
//!
//! ```text
//! validate ─► propagate ids + policies ─► create children (concurrent)
//!                                                │
//!                    ┌───────────────────────────┘
//!                    ▼
//!             insert collection ─► self-reference logical id ─► relink children
//! ```
//!
//! Children are persisted before their parent exists, so a child that was created but whose
//! parent then fails to persist is left behind. Child failures are reported, not rolled back.

use crate::analytics::{AnalyticsEmitter, EventType};
use crate::cascade::CascadeFailure;
use crate::default_resources::{
    initialize_action, initialize_action_state, initialize_collection_tree, populate_from_branched,
};
use crate::model::{
    has_text, Action, ActionState, Collection, CollectionState, DualState, PolicySet, ViewMode,
};
use crate::policy::{derive_policies, policies_from_page};
use crate::ports::{
    ActionRepository, AnalyticsSubject, CollectionRepository, PluginContext,
    PluginContextProvider,
};
use crate::validation::ensure_valid;
use branchdoc_common::{IdGenerator, ResourceKind, StoreError, StoreResult};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// A collection and the child actions to create with it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssemblyRequest {
    pub collection: Collection,
    /// Specs without an id are created; specs with an id are listed under the new collection as-is
    pub actions: Vec<ActionState>,
    /// Policies of the page the collection is created on
    pub page_policies: Option<PolicySet>,
    pub branch_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledCollection {
    /// Draft view of the new collection with its actions
    pub view: CollectionState,
    pub failures: Vec<CascadeFailure>,
}

#[derive(Clone)]
pub struct AssemblyPipeline {
    collections: Arc<dyn CollectionRepository>,
    actions: Arc<dyn ActionRepository>,
    plugins: Arc<dyn PluginContextProvider>,
    ids: Arc<dyn IdGenerator>,
    analytics: AnalyticsEmitter,
}

impl AssemblyPipeline {
    pub fn new(
        collections: Arc<dyn CollectionRepository>,
        actions: Arc<dyn ActionRepository>,
        plugins: Arc<dyn PluginContextProvider>,
        ids: Arc<dyn IdGenerator>,
        analytics: AnalyticsEmitter,
    ) -> Self {
        Self {
            collections,
            actions,
            plugins,
            ids,
            analytics,
        }
    }

    fn assign_sync_id(&self, collection: &mut Collection) {
        if !has_text(&collection.git_sync_id) {
            collection.git_sync_id = Some(self.ids.sync_id(&collection.application_id));
        }
    }

    #[instrument(skip(self, request), fields(name = %request.collection.display_name(), children = request.actions.len()))]
    pub async fn assemble(&self, request: AssemblyRequest) -> StoreResult<AssembledCollection> {
        let AssemblyRequest {
            mut collection,
            actions: specs,
            page_policies,
            branch_name,
        } = request;

        if collection.id.is_some() {
            return Err(StoreError::invalid_parameter("id"));
        }
        ensure_valid(&collection, &specs)?;

        let branch_name = branch_name.or_else(|| collection.branch_name().map(str::to_string));
        self.assign_sync_id(&mut collection);
        if let Some(page_policies) = &page_policies {
            collection.policies.extend(policies_from_page(page_policies));
        }
        initialize_collection_tree(&mut collection, branch_name.as_deref(), false);
        collection
            .states
            .for_each_mut(|state| state.actions.clear());

        let context = self.plugins.context_for(&collection).await?;

        let (existing, new_specs): (Vec<_>, Vec<_>) =
            specs.into_iter().partition(|spec| spec.id.is_some());

        let attempts = join_all(new_specs.into_iter().map(|spec| {
            self.create_child(&collection, &context, branch_name.as_deref(), spec)
        }))
        .await;

        let mut created = Vec::new();
        let mut failures = Vec::new();
        for attempt in attempts {
            match attempt {
                Ok(action) => created.push(action),
                Err(failure) => failures.push(failure),
            }
        }

        let mut parent = self.collections.insert(collection).await?;
        if !has_text(&parent.default_resources.collection_id) {
            parent.default_resources.collection_id = parent.id.clone();
            parent = self.collections.save(parent).await?;
        }
        info!(collection_id = %parent.id_str(), "Created collection");
        self.analytics
            .emit(EventType::Create, AnalyticsSubject::Collection(&parent))
            .await;

        let relinked = join_all(created.into_iter().map(|action| self.relink(&parent, action))).await;

        let mut view = parent.states.unpublished.clone().unwrap_or_default();
        view.populate_transient_fields(&parent);
        for result in relinked {
            match result {
                Ok(action) => view.actions.extend(action.view(ViewMode::Unpublished)),
                Err(failure) => failures.push(failure),
            }
        }
        view.actions.extend(existing.into_iter().map(|mut spec| {
            spec.collection_id = parent.id.clone();
            spec
        }));

        if !failures.is_empty() {
            warn!(
                collection_id = %parent.id_str(),
                failed = failures.len(),
                "Collection created with failed children"
            );
        }

        Ok(AssembledCollection { view, failures })
    }

    async fn create_child(
        &self,
        collection: &Collection,
        context: &PluginContext,
        branch_name: Option<&str>,
        spec: ActionState,
    ) -> Result<Action, CascadeFailure> {
        let name = spec.name.clone();
        let action = self.build_child(collection, context, branch_name, spec);

        match self.actions.insert(action).await {
            Ok(action) => {
                self.analytics
                    .emit(EventType::Create, AnalyticsSubject::Action(&action))
                    .await;
                Ok(action)
            }
            Err(e) => {
                error!(child = %name, error = %e, "Failed to create child action");
                Err(child_failure(collection.id_str(), &name, e))
            }
        }
    }

    fn build_child(
        &self,
        collection: &Collection,
        context: &PluginContext,
        branch_name: Option<&str>,
        spec: ActionState,
    ) -> Action {
        let draft = collection.states.unpublished.as_ref();
        let collection_name = collection.display_name();

        let mut state = spec;
        state.collection_id = collection.id.clone();
        state.page_id = draft.and_then(|s| s.page_id.clone());
        state.application_id = Some(collection.application_id.clone());
        state.plugin_id = context.plugin_id.clone();
        state.plugin_type = context.plugin_type;
        state.fully_qualified_name = Some(format!("{}.{}", collection_name, state.name));
        if state.datasource.is_none() {
            state.datasource = Some(context.placeholder_datasource.clone());
        }
        state.default_resources.collection_id = collection.default_resources.collection_id.clone();
        state.default_resources.page_id = draft.and_then(|s| s.default_resources.page_id.clone());
        initialize_action_state(&mut state, false);

        let mut action = Action {
            application_id: collection.application_id.clone(),
            workspace_id: context.workspace_id.clone(),
            plugin_id: context.plugin_id.clone(),
            plugin_type: context.plugin_type,
            states: DualState::draft(state),
            policies: derive_policies(&collection.policies),
            git_sync_id: Some(self.ids.sync_id(&collection.application_id)),
            ..Action::default()
        };
        initialize_action(&mut action, branch_name, false);
        action
    }

    /// Point a freshly created child at its persisted parent
    async fn relink(&self, parent: &Collection, mut action: Action) -> Result<Action, CascadeFailure> {
        let logical_parent = parent
            .default_resources
            .collection_id
            .clone()
            .or_else(|| parent.id.clone());

        if let Some(state) = action.states.unpublished.as_mut() {
            state.collection_id = parent.id.clone();
            if !has_text(&state.default_resources.collection_id) {
                state.default_resources.collection_id = logical_parent.clone();
            }
        }
        if !has_text(&action.default_resources.collection_id) {
            action.default_resources.collection_id = logical_parent;
        }

        let name = action
            .states
            .unpublished
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        self.actions.save(action).await.map_err(|e| {
            error!(parent_id = %parent.id_str(), child = %name, error = %e, "Failed to relink child action");
            child_failure(parent.id_str(), &name, e)
        })
    }

    /// Insert a collection without children
    #[instrument(skip(self, collection))]
    pub async fn create(&self, mut collection: Collection) -> StoreResult<Collection> {
        self.assign_sync_id(&mut collection);
        let branch_name = collection.branch_name().map(str::to_string);

        let mut created = self.collections.insert(collection).await?;
        initialize_collection_tree(&mut created, branch_name.as_deref(), false);
        let created = self.collections.save(created).await?;

        self.analytics
            .emit(EventType::Create, AnalyticsSubject::Collection(&created))
            .await;
        Ok(created)
    }

    pub async fn save(&self, mut collection: Collection) -> StoreResult<Collection> {
        self.assign_sync_id(&mut collection);
        self.collections.save(collection).await
    }

    /// Save a batch; documents without an id are inserted
    pub async fn save_all(&self, collections: Vec<Collection>) -> StoreResult<()> {
        let (existing, fresh): (Vec<_>, Vec<_>) = collections
            .into_iter()
            .map(|mut c| {
                self.assign_sync_id(&mut c);
                c
            })
            .partition(|c| c.id.is_some());

        if !fresh.is_empty() {
            self.collections.bulk_insert(fresh).await?;
        }
        if !existing.is_empty() {
            self.collections.bulk_update(existing).await?;
        }
        Ok(())
    }

    fn prepare_bulk(&self, collections: &mut [Collection]) -> StoreResult<()> {
        for collection in collections.iter_mut() {
            ensure_valid(collection, &[])?;
            self.assign_sync_id(collection);
            let branch_name = collection.branch_name().map(str::to_string);
            initialize_collection_tree(collection, branch_name.as_deref(), false);
        }
        Ok(())
    }

    /// Validate a batch of new collections and insert it in one call
    #[instrument(skip(self, collections), fields(count = collections.len()))]
    pub async fn bulk_validate_and_insert(&self, mut collections: Vec<Collection>) -> StoreResult<()> {
        self.prepare_bulk(&mut collections)?;
        self.collections.bulk_insert(collections).await
    }

    /// Validate a batch of existing collections and update it in one call
    #[instrument(skip(self, collections), fields(count = collections.len()))]
    pub async fn bulk_validate_and_update(&self, mut collections: Vec<Collection>) -> StoreResult<()> {
        self.prepare_bulk(&mut collections)?;
        self.collections.bulk_update(collections).await
    }

    /// Persist a copy of `source` for `branch_name` in `target_application_id`
    ///
    /// The copy keeps the source's logical ids, so both resolve to the same logical collection.
    #[instrument(skip(self, source), fields(source_id = %source.id_str()))]
    pub async fn create_branch_copy(
        &self,
        source: &Collection,
        branch_name: &str,
        target_application_id: &str,
    ) -> StoreResult<Collection> {
        if branch_name.trim().is_empty() {
            return Err(StoreError::invalid_parameter("branchName"));
        }
        if !has_text(&source.default_resources.collection_id) {
            return Err(StoreError::not_found(
                ResourceKind::ActionCollection,
                source.id_str(),
            ));
        }

        let mut copy = Collection {
            application_id: target_application_id.to_string(),
            workspace_id: source.workspace_id.clone(),
            states: source.states.clone(),
            ..Collection::default()
        };
        copy.states.for_each_mut(|state| state.actions.clear());
        populate_from_branched(&mut copy, source, branch_name);

        let copy = self.collections.insert(copy).await?;
        info!(collection_id = %copy.id_str(), branch = %branch_name, "Created branch copy");
        Ok(copy)
    }
}

fn child_failure(parent_id: &str, child: &str, e: StoreError) -> CascadeFailure {
    let kind = e.kind();
    let wrapped = StoreError::DependencyOperationFailed {
        kind: ResourceKind::Action,
        parent_id: parent_id.to_string(),
        child_id: child.to_string(),
        reason: e.to_string(),
    };
    CascadeFailure {
        child_id: child.to_string(),
        kind,
        message: wrapped.to_string(),
    }
}
