//! # Dual-State Store
//!
//! Read and update paths over collections that hold a draft and a published snapshot.
//!
//! Views are generated on demand: the selected snapshot is cloned, its child actions are
//! looked up for the same view mode and materialized into it, and the transient ids of the
//! owning collection are copied in. Stored snapshots never carry materialized actions.

use crate::default_resources::{initialize_collection_tree, view_defaults};
use crate::identity::IdentityResolver;
use crate::merge::CollectionPatch;
use crate::model::{
    Capability, Collection, CollectionState, CollectionView, ViewMode,
};
use crate::ports::{ActionRepository, ApplicationBranchResolver, CollectionRepository};
use branchdoc_common::{ResourceKind, StoreError, StoreResult};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Snapshot of `collection` for `mode`, if that side exists
pub fn get_view(collection: &Collection, mode: ViewMode) -> Option<&CollectionState> {
    collection.states.get(mode)
}

#[derive(Clone)]
pub struct DualStateStore {
    collections: Arc<dyn CollectionRepository>,
    actions: Arc<dyn ActionRepository>,
    branches: Arc<dyn ApplicationBranchResolver>,
    resolver: IdentityResolver,
}

impl DualStateStore {
    pub fn new(
        collections: Arc<dyn CollectionRepository>,
        actions: Arc<dyn ActionRepository>,
        branches: Arc<dyn ApplicationBranchResolver>,
        resolver: IdentityResolver,
    ) -> Self {
        Self {
            collections,
            actions,
            branches,
            resolver,
        }
    }

    /// `mode` snapshot of `collection` with its actions materialized
    ///
    /// When every action shares one plugin, the snapshot reports that plugin too.
    pub async fn populate_actions(
        &self,
        collection: &Collection,
        mode: ViewMode,
    ) -> StoreResult<Option<CollectionState>> {
        let Some(state) = get_view(collection, mode) else {
            return Ok(None);
        };
        let mut state = state.clone();

        let actions = match collection.id.as_deref() {
            Some(id) => {
                self.actions
                    .find_by_collection_id_and_view_mode(id, mode)
                    .await?
            }
            None => Vec::new(),
        };
        state.actions = actions.iter().filter_map(|a| a.view(mode)).collect();

        if let Some(first) = actions.first() {
            if actions.iter().all(|a| a.plugin_id == first.plugin_id) && first.plugin_id.is_some()
            {
                state.plugin_id = first.plugin_id.clone();
                state.plugin_type = first.plugin_type;
            }
        }

        state.populate_transient_fields(collection);
        Ok(Some(state))
    }

    /// `mode` view of `collection` if the caller holds `capability` on it
    pub async fn generate_view(
        &self,
        collection: Collection,
        mode: ViewMode,
        capability: Capability,
    ) -> StoreResult<Option<CollectionState>> {
        match self.resolver.permitted(collection, capability).await {
            Some(collection) => self.populate_actions(&collection, mode).await,
            None => Ok(None),
        }
    }

    /// View of the collection with physical id `id`
    #[instrument(skip(self))]
    pub async fn find_view(
        &self,
        id: &str,
        mode: ViewMode,
        capability: Capability,
    ) -> StoreResult<CollectionState> {
        let collection = self.resolver.resolve_physical(id, capability).await?;
        self.populate_actions(&collection, mode)
            .await?
            .ok_or_else(|| StoreError::not_found(ResourceKind::ActionCollection, id))
    }

    /// Read lookup through a branch
    #[instrument(skip(self))]
    pub async fn find_by_id_and_branch(
        &self,
        id: &str,
        branch_name: Option<&str>,
        mode: ViewMode,
    ) -> StoreResult<CollectionState> {
        let collection = self
            .resolver
            .resolve(branch_name, id, Capability::Read)
            .await?;
        self.populate_actions(&collection, mode)
            .await?
            .ok_or_else(|| StoreError::not_found(ResourceKind::ActionCollection, id))
    }

    async fn readable_views(
        &self,
        collections: Vec<Collection>,
        mode: ViewMode,
    ) -> StoreResult<Vec<CollectionState>> {
        let views = join_all(
            collections
                .into_iter()
                .map(|c| self.generate_view(c, mode, Capability::Read)),
        )
        .await;

        let mut result = Vec::with_capacity(views.len());
        for view in views {
            if let Some(view) = view? {
                result.push(view);
            }
        }
        Ok(result)
    }

    /// Readable collections of an application for `mode`
    ///
    /// In published mode, collections that were never published are left out.
    #[instrument(skip(self))]
    pub async fn list_by_application(
        &self,
        application_id: &str,
        branch_name: Option<&str>,
        mode: ViewMode,
    ) -> StoreResult<Vec<CollectionState>> {
        if application_id.trim().is_empty() {
            return Err(StoreError::invalid_parameter("applicationId"));
        }
        let application_id = self
            .branches
            .find_branched_application_id(branch_name, application_id)
            .await?;
        let filter = mode.is_published().then_some(ViewMode::Published);
        let collections = self
            .collections
            .find_by_application_id(&application_id, filter)
            .await?;

        debug!(found = collections.len(), "Listing collections of application");
        self.readable_views(collections, mode).await
    }

    /// Readable collections whose `mode` side lives on `page_id`
    #[instrument(skip(self))]
    pub async fn list_by_page(
        &self,
        page_id: &str,
        mode: ViewMode,
    ) -> StoreResult<Vec<CollectionState>> {
        if page_id.trim().is_empty() {
            return Err(StoreError::invalid_parameter("pageId"));
        }
        let collections = self
            .collections
            .find_by_page_ids(&[page_id.to_string()], mode)
            .await?;
        self.readable_views(collections, mode).await
    }

    /// Published projections for viewers of a deployed application
    #[instrument(skip(self))]
    pub async fn views_for_application(
        &self,
        application_id: &str,
        branch_name: Option<&str>,
    ) -> StoreResult<Vec<CollectionView>> {
        if application_id.trim().is_empty() {
            return Err(StoreError::invalid_parameter("applicationId"));
        }
        let application_id = self
            .branches
            .find_branched_application_id(branch_name, application_id)
            .await?;
        let collections = self
            .collections
            .find_by_application_id(&application_id, Some(ViewMode::Published))
            .await?;

        let mut views = Vec::with_capacity(collections.len());
        for collection in collections {
            let Some(collection) = self
                .resolver
                .permitted(collection, Capability::Execute)
                .await
            else {
                continue;
            };
            let Some(published) = self
                .populate_actions(&collection, ViewMode::Published)
                .await?
            else {
                continue;
            };
            views.push(CollectionView {
                id: collection.id_str().to_string(),
                name: published.name.clone(),
                page_id: published.page_id.clone(),
                application_id: collection.application_id.clone(),
                variables: published.variables.clone(),
                body: published.body.clone(),
                default_resources: view_defaults(&collection, &published),
                actions: published.actions,
            });
        }
        Ok(views)
    }

    /// Merge `patch` into the draft of collection `id` and persist it
    ///
    /// Returns the regenerated draft view. Concurrent updates overwrite each other.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: &CollectionPatch) -> StoreResult<CollectionState> {
        let mut collection = self.resolver.resolve_physical(id, Capability::Edit).await?;

        let draft = get_view(&collection, ViewMode::Unpublished)
            .ok_or_else(|| StoreError::not_found(ResourceKind::ActionCollection, id))?;
        let mut merged = patch.merge(draft);
        merged.actions.clear();
        collection.states.unpublished = Some(merged);

        let branch_name = collection.branch_name().map(str::to_string);
        initialize_collection_tree(&mut collection, branch_name.as_deref(), false);

        let saved = self.collections.save(collection).await?;
        info!(collection_id = %saved.id_str(), "Updated collection draft");

        self.populate_actions(&saved, ViewMode::Unpublished)
            .await?
            .ok_or_else(|| StoreError::not_found(ResourceKind::ActionCollection, id))
    }
}
