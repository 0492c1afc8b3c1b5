//! In-memory adapters for the storage and context ports.
//!
//! Used by the CLI (restored from / written back to a JSON snapshot) and by tests. Documents
//! keep insertion order; archived documents stay in the snapshot but vanish from lookups.

use crate::model::{Action, Collection, Datasource, ViewMode};
use crate::ports::{
    ActionRepository, ApplicationBranchResolver, CollectionRepository, PluginContext,
    PluginContextProvider,
};
use async_trait::async_trait;
use branchdoc_common::{IdGenerator, ResourceKind, StoreError, StoreResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Serializable dump of every in-memory adapter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSnapshot {
    pub collections: Vec<Collection>,
    pub actions: Vec<Action>,
    pub application_branches: Vec<BranchedApplication>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BranchedApplication {
    pub branch_name: String,
    pub default_application_id: String,
    pub application_id: String,
}

fn lock_poisoned() -> StoreError {
    StoreError::Persistence("failure injection lock poisoned".to_string())
}

pub struct InMemoryCollectionRepository {
    docs: RwLock<Vec<Collection>>,
    ids: Arc<dyn IdGenerator>,
    fail_archive: AtomicBool,
    fail_save: AtomicBool,
}

impl InMemoryCollectionRepository {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self::with_documents(ids, Vec::new())
    }

    pub fn with_documents(ids: Arc<dyn IdGenerator>, docs: Vec<Collection>) -> Self {
        Self {
            docs: RwLock::new(docs),
            ids,
            fail_archive: AtomicBool::new(false),
            fail_save: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `archive` call fail
    pub fn fail_archives(&self, fail: bool) {
        self.fail_archive.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `save` call fail
    pub fn fail_saves(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Stored document, archived or not
    pub async fn get_including_archived(&self, id: &str) -> Option<Collection> {
        self.docs
            .read()
            .await
            .iter()
            .find(|c| c.id.as_deref() == Some(id))
            .cloned()
    }

    pub async fn all(&self) -> Vec<Collection> {
        self.docs.read().await.clone()
    }

    async fn find_live<F>(&self, predicate: F) -> Vec<Collection>
    where
        F: Fn(&Collection) -> bool,
    {
        self.docs
            .read()
            .await
            .iter()
            .filter(|c| !c.is_archived() && predicate(c))
            .cloned()
            .collect()
    }

    async fn replace(&self, collection: Collection) -> StoreResult<Collection> {
        let id = collection
            .id
            .clone()
            .ok_or_else(|| StoreError::invalid_parameter("id"))?;
        let mut docs = self.docs.write().await;
        let slot = docs
            .iter_mut()
            .find(|c| c.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| StoreError::not_found(ResourceKind::ActionCollection, id.clone()))?;
        let mut collection = collection;
        collection.updated_at = Some(Utc::now());
        *slot = collection.clone();
        Ok(collection)
    }
}

#[async_trait]
impl CollectionRepository for InMemoryCollectionRepository {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Collection>> {
        Ok(self
            .find_live(|c| c.id.as_deref() == Some(id))
            .await
            .into_iter()
            .next())
    }

    async fn find_by_branch_and_default_collection_id(
        &self,
        branch_name: &str,
        default_collection_id: &str,
    ) -> StoreResult<Option<Collection>> {
        Ok(self
            .find_live(|c| {
                c.branch_name() == Some(branch_name)
                    && c.default_resources.collection_id.as_deref() == Some(default_collection_id)
            })
            .await
            .into_iter()
            .next())
    }

    async fn find_by_application_id(
        &self,
        application_id: &str,
        mode: Option<ViewMode>,
    ) -> StoreResult<Vec<Collection>> {
        Ok(self
            .find_live(|c| {
                c.application_id == application_id
                    && match mode {
                        None => true,
                        Some(ViewMode::Published) => c.states.published.is_some(),
                        Some(ViewMode::Unpublished) => c
                            .states
                            .unpublished
                            .as_ref()
                            .is_some_and(|s| s.deleted_at.is_none()),
                    }
            })
            .await)
    }

    async fn find_by_page_ids(
        &self,
        page_ids: &[String],
        mode: ViewMode,
    ) -> StoreResult<Vec<Collection>> {
        Ok(self
            .find_live(|c| match c.states.get(mode) {
                Some(state) => {
                    let on_page = state
                        .page_id
                        .as_ref()
                        .is_some_and(|p| page_ids.contains(p));
                    on_page && !(mode == ViewMode::Unpublished && state.deleted_at.is_some())
                }
                None => false,
            })
            .await)
    }

    async fn insert(&self, collection: Collection) -> StoreResult<Collection> {
        let mut collection = collection;
        if collection.id.is_none() {
            collection.id = Some(self.ids.next_id());
        }
        let now = Utc::now();
        collection.created_at.get_or_insert(now);
        collection.updated_at = Some(now);

        let mut docs = self.docs.write().await;
        if docs.iter().any(|c| c.id == collection.id) {
            return Err(StoreError::invalid_parameter("id"));
        }
        docs.push(collection.clone());
        Ok(collection)
    }

    async fn save(&self, collection: Collection) -> StoreResult<Collection> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StoreError::Persistence(format!(
                "save rejected for collection {}",
                collection.id_str()
            )));
        }
        self.replace(collection).await
    }

    async fn bulk_insert(&self, collections: Vec<Collection>) -> StoreResult<()> {
        for collection in collections {
            self.insert(collection).await?;
        }
        Ok(())
    }

    async fn bulk_update(&self, collections: Vec<Collection>) -> StoreResult<()> {
        for collection in collections {
            self.save(collection).await?;
        }
        Ok(())
    }

    async fn archive(&self, collection: &Collection) -> StoreResult<Collection> {
        if self.fail_archive.load(Ordering::SeqCst) {
            return Err(StoreError::Persistence(format!(
                "archive rejected for collection {}",
                collection.id_str()
            )));
        }
        let mut archived = collection.clone();
        archived.deleted_at = Some(Utc::now());
        self.replace(archived).await
    }
}

pub struct InMemoryActionRepository {
    docs: RwLock<Vec<Action>>,
    ids: Arc<dyn IdGenerator>,
    fail_archive_for: Mutex<HashSet<String>>,
    fail_insert_named: Mutex<HashSet<String>>,
}

impl InMemoryActionRepository {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self::with_documents(ids, Vec::new())
    }

    pub fn with_documents(ids: Arc<dyn IdGenerator>, docs: Vec<Action>) -> Self {
        Self {
            docs: RwLock::new(docs),
            ids,
            fail_archive_for: Mutex::new(HashSet::new()),
            fail_insert_named: Mutex::new(HashSet::new()),
        }
    }

    /// Make `archive` fail for the action with physical id `id`
    pub fn fail_archive_of(&self, id: &str) {
        if let Ok(mut ids) = self.fail_archive_for.lock() {
            ids.insert(id.to_string());
        }
    }

    /// Make `insert` fail for actions whose draft is named `name`
    pub fn fail_insert_of(&self, name: &str) {
        if let Ok(mut names) = self.fail_insert_named.lock() {
            names.insert(name.to_string());
        }
    }

    pub async fn get_including_archived(&self, id: &str) -> Option<Action> {
        self.docs
            .read()
            .await
            .iter()
            .find(|a| a.id.as_deref() == Some(id))
            .cloned()
    }

    pub async fn all(&self) -> Vec<Action> {
        self.docs.read().await.clone()
    }

    async fn replace(&self, action: Action) -> StoreResult<Action> {
        let id = action
            .id
            .clone()
            .ok_or_else(|| StoreError::invalid_parameter("id"))?;
        let mut docs = self.docs.write().await;
        let slot = docs
            .iter_mut()
            .find(|a| a.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| StoreError::not_found(ResourceKind::Action, id.clone()))?;
        let mut action = action;
        action.updated_at = Some(Utc::now());
        *slot = action.clone();
        Ok(action)
    }
}

#[async_trait]
impl ActionRepository for InMemoryActionRepository {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Action>> {
        Ok(self
            .docs
            .read()
            .await
            .iter()
            .find(|a| !a.is_archived() && a.id.as_deref() == Some(id))
            .cloned())
    }

    async fn find_by_collection_id_and_view_mode(
        &self,
        collection_id: &str,
        mode: ViewMode,
    ) -> StoreResult<Vec<Action>> {
        Ok(self
            .docs
            .read()
            .await
            .iter()
            .filter(|a| !a.is_archived() && a.belongs_to(collection_id, mode))
            .cloned()
            .collect())
    }

    async fn insert(&self, action: Action) -> StoreResult<Action> {
        let name = action
            .states
            .unpublished
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let rejected = self
            .fail_insert_named
            .lock()
            .map_err(|_| lock_poisoned())?
            .contains(&name);
        if rejected {
            return Err(StoreError::Persistence(format!("insert rejected for action {name}")));
        }

        let mut action = action;
        if action.id.is_none() {
            action.id = Some(self.ids.next_id());
        }
        let now = Utc::now();
        action.created_at.get_or_insert(now);
        action.updated_at = Some(now);

        let mut docs = self.docs.write().await;
        if docs.iter().any(|a| a.id == action.id) {
            return Err(StoreError::invalid_parameter("id"));
        }
        docs.push(action.clone());
        Ok(action)
    }

    async fn save(&self, action: Action) -> StoreResult<Action> {
        self.replace(action).await
    }

    async fn archive(&self, action: &Action) -> StoreResult<Action> {
        let rejected = self
            .fail_archive_for
            .lock()
            .map_err(|_| lock_poisoned())?
            .contains(action.id_str());
        if rejected {
            return Err(StoreError::Persistence(format!(
                "archive rejected for action {}",
                action.id_str()
            )));
        }
        let mut archived = action.clone();
        archived.deleted_at = Some(Utc::now());
        self.replace(archived).await
    }
}

/// Branch → application id table
#[derive(Default)]
pub struct InMemoryApplicationBranches {
    branches: RwLock<HashMap<(String, String), String>>,
}

impl InMemoryApplicationBranches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branches(branches: Vec<BranchedApplication>) -> Self {
        let table = branches
            .into_iter()
            .map(|b| ((b.branch_name, b.default_application_id), b.application_id))
            .collect();
        Self {
            branches: RwLock::new(table),
        }
    }

    pub async fn register(&self, branch_name: &str, default_application_id: &str, application_id: &str) {
        self.branches.write().await.insert(
            (branch_name.to_string(), default_application_id.to_string()),
            application_id.to_string(),
        );
    }

    pub async fn all(&self) -> Vec<BranchedApplication> {
        let mut branches: Vec<BranchedApplication> = self
            .branches
            .read()
            .await
            .iter()
            .map(|((branch_name, default_application_id), application_id)| BranchedApplication {
                branch_name: branch_name.clone(),
                default_application_id: default_application_id.clone(),
                application_id: application_id.clone(),
            })
            .collect();
        branches.sort_by(|a, b| {
            (&a.default_application_id, &a.branch_name).cmp(&(&b.default_application_id, &b.branch_name))
        });
        branches
    }
}

#[async_trait]
impl ApplicationBranchResolver for InMemoryApplicationBranches {
    async fn find_branched_application_id(
        &self,
        branch_name: Option<&str>,
        application_id: &str,
    ) -> StoreResult<String> {
        match branch_name.filter(|b| !b.trim().is_empty()) {
            None => Ok(application_id.to_string()),
            Some(branch) => self
                .branches
                .read()
                .await
                .get(&(branch.to_string(), application_id.to_string()))
                .cloned()
                .ok_or_else(|| StoreError::not_found(ResourceKind::Application, application_id)),
        }
    }
}

/// Plugin context taken from the collection itself
pub struct StaticPluginContext {
    unused_datasource_name: String,
}

impl StaticPluginContext {
    pub fn new(unused_datasource_name: impl Into<String>) -> Self {
        Self {
            unused_datasource_name: unused_datasource_name.into(),
        }
    }
}

#[async_trait]
impl PluginContextProvider for StaticPluginContext {
    async fn context_for(&self, collection: &Collection) -> StoreResult<PluginContext> {
        let draft = collection.states.unpublished.as_ref();
        let plugin_id = draft.and_then(|s| s.plugin_id.clone());
        Ok(PluginContext {
            workspace_id: collection.workspace_id.clone(),
            plugin_id: plugin_id.clone(),
            plugin_type: draft.and_then(|s| s.plugin_type),
            placeholder_datasource: Datasource {
                id: None,
                name: self.unused_datasource_name.clone(),
                workspace_id: collection.workspace_id.clone(),
                plugin_id,
                auto_generated: true,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionState, CollectionState, DualState};
    use branchdoc_common::{ErrorKind, SequentialIdGenerator};

    fn ids(ns: &str) -> Arc<dyn IdGenerator> {
        Arc::new(SequentialIdGenerator::new(ns))
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_archive_hides() {
        let repo = InMemoryCollectionRepository::new(ids("c"));
        let saved = repo
            .insert(Collection::new("app", CollectionState::named("utils")))
            .await
            .unwrap();
        let id = saved.id.clone().unwrap();

        assert!(repo.find_by_id(&id).await.unwrap().is_some());

        repo.archive(&saved).await.unwrap();
        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        assert!(repo.get_including_archived(&id).await.unwrap().is_archived());
    }

    #[tokio::test]
    async fn test_insert_rejects_taken_id() {
        let repo = InMemoryCollectionRepository::new(ids("c"));
        let mut first = Collection::new("app", CollectionState::named("utils"));
        first.id = Some("fixed".to_string());
        repo.insert(first.clone()).await.unwrap();

        let err = repo.insert(first).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(repo.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_published_filter_on_application_lookup() {
        let repo = InMemoryCollectionRepository::new(ids("c"));
        repo.insert(Collection::new("app", CollectionState::named("draft_only")))
            .await
            .unwrap();
        let mut live = Collection::new("app", CollectionState::named("live"));
        live.states.published = Some(CollectionState::named("live"));
        repo.insert(live).await.unwrap();

        let all = repo.find_by_application_id("app", None).await.unwrap();
        let published = repo
            .find_by_application_id("app", Some(ViewMode::Published))
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].display_name(), "live");
    }

    #[tokio::test]
    async fn test_action_lookup_by_collection_and_mode() {
        let repo = InMemoryActionRepository::new(ids("a"));
        let mut draft = ActionState::named("run");
        draft.collection_id = Some("c-1".to_string());
        repo.insert(Action {
            states: DualState::draft(draft),
            ..Action::default()
        })
        .await
        .unwrap();

        let unpublished = repo
            .find_by_collection_id_and_view_mode("c-1", ViewMode::Unpublished)
            .await
            .unwrap();
        let published = repo
            .find_by_collection_id_and_view_mode("c-1", ViewMode::Published)
            .await
            .unwrap();

        assert_eq!(unpublished.len(), 1);
        assert!(published.is_empty());
    }

    #[tokio::test]
    async fn test_branch_resolver_falls_back_to_bare_id() {
        let branches = InMemoryApplicationBranches::new();
        branches.register("feature", "app", "app-feature").await;

        assert_eq!(branches.find_branched_application_id(None, "app").await.unwrap(), "app");
        assert_eq!(
            branches
                .find_branched_application_id(Some("feature"), "app")
                .await
                .unwrap(),
            "app-feature"
        );
        assert!(branches
            .find_branched_application_id(Some("missing"), "app")
            .await
            .is_err());
    }
}
