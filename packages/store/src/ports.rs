//! Collaborators the engine consumes but does not implement.
//!
//! Every component takes these as `Arc<dyn Trait>` so the same logic runs against a real
//! database or the in-memory adapters in [`crate::memory`].

use crate::model::{Action, Capability, Collection, Datasource, PluginType, PolicySet, ViewMode};
use async_trait::async_trait;
use branchdoc_common::StoreResult;
use std::collections::BTreeMap;

/// Flat property map attached to analytics events
pub type AnalyticsProperties = BTreeMap<String, String>;

/// Storage for collections
///
/// Lookups never return archived documents and apply no permission filtering.
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Collection>>;

    /// Branch copy whose logical collection id is `default_collection_id`
    async fn find_by_branch_and_default_collection_id(
        &self,
        branch_name: &str,
        default_collection_id: &str,
    ) -> StoreResult<Option<Collection>>;

    /// Collections of an application; with `Some(Published)` only ever-published ones
    async fn find_by_application_id(
        &self,
        application_id: &str,
        mode: Option<ViewMode>,
    ) -> StoreResult<Vec<Collection>>;

    /// Collections whose `mode` side lives on one of `page_ids`
    async fn find_by_page_ids(
        &self,
        page_ids: &[String],
        mode: ViewMode,
    ) -> StoreResult<Vec<Collection>>;

    /// Persist a new document, assigning its physical id
    async fn insert(&self, collection: Collection) -> StoreResult<Collection>;

    /// Overwrite an existing document
    async fn save(&self, collection: Collection) -> StoreResult<Collection>;

    async fn bulk_insert(&self, collections: Vec<Collection>) -> StoreResult<()>;

    async fn bulk_update(&self, collections: Vec<Collection>) -> StoreResult<()>;

    /// Mark a document archived; it disappears from every lookup
    async fn archive(&self, collection: &Collection) -> StoreResult<Collection>;
}

/// Storage for actions
#[async_trait]
pub trait ActionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Action>>;

    /// Actions whose `mode` side references `collection_id`
    async fn find_by_collection_id_and_view_mode(
        &self,
        collection_id: &str,
        mode: ViewMode,
    ) -> StoreResult<Vec<Action>>;

    async fn insert(&self, action: Action) -> StoreResult<Action>;

    async fn save(&self, action: Action) -> StoreResult<Action>;

    async fn archive(&self, action: &Action) -> StoreResult<Action>;
}

/// Opaque capability check
#[async_trait]
pub trait PermissionEvaluator: Send + Sync {
    async fn is_allowed(&self, policies: &PolicySet, capability: Capability) -> bool;
}

/// Entity an analytics event is about
#[derive(Debug, Clone, Copy)]
pub enum AnalyticsSubject<'a> {
    Collection(&'a Collection),
    Action(&'a Action),
}

impl AnalyticsSubject<'_> {
    pub fn id(&self) -> &str {
        match self {
            AnalyticsSubject::Collection(c) => c.id_str(),
            AnalyticsSubject::Action(a) => a.id_str(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsSubject::Collection(_) => "actionCollection",
            AnalyticsSubject::Action(_) => "action",
        }
    }
}

/// Fire-and-forget analytics transport
///
/// Errors are logged by the caller and never fail the operation that emitted the event.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn send_create_event(
        &self,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()>;

    async fn send_delete_event(
        &self,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()>;

    async fn send_archive_event(
        &self,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()>;
}

/// Plugin and datasource context for actions created inside a collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginContext {
    pub workspace_id: Option<String>,
    pub plugin_id: Option<String>,
    pub plugin_type: Option<PluginType>,
    /// Used when an action names no datasource
    pub placeholder_datasource: Datasource,
}

#[async_trait]
pub trait PluginContextProvider: Send + Sync {
    async fn context_for(&self, collection: &Collection) -> StoreResult<PluginContext>;
}

/// Maps a logical application id on a branch to the physical application id
#[async_trait]
pub trait ApplicationBranchResolver: Send + Sync {
    async fn find_branched_application_id(
        &self,
        branch_name: Option<&str>,
        application_id: &str,
    ) -> StoreResult<String>;
}
