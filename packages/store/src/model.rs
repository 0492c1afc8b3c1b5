//! # Document Model
//!
//! Collections and their child actions, each holding an unpublished (draft) and a published
//! snapshot side by side.
//!
//! ```text
//! Collection ──┬── default_resources  {applicationId, collectionId, branchName}
//!              ├── states.unpublished ── CollectionState ── default_resources {pageId}
//!              ├── states.published   ── CollectionState ── default_resources {pageId}
//!              └── policies
//!
//! Action ──────┬── default_resources  {applicationId, collectionId, branchName}
//!              ├── states.unpublished ── ActionState (collectionId, fullyQualifiedName, ...)
//!              └── states.published   ── ActionState
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Selects which snapshot of a document is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    /// The editable draft
    Unpublished,
    /// The frozen, live snapshot
    Published,
}

impl ViewMode {
    pub fn is_published(self) -> bool {
        matches!(self, ViewMode::Published)
    }
}

impl From<bool> for ViewMode {
    fn from(published: bool) -> Self {
        if published {
            ViewMode::Published
        } else {
            ViewMode::Unpublished
        }
    }
}

/// Logical identifiers linking branch copies of one document
///
/// Each tier only fills the fields it owns: entity records carry application, collection and
/// branch; state records carry the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultResources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
}

impl DefaultResources {
    pub fn is_empty(&self) -> bool {
        !has_text(&self.application_id)
            && !has_text(&self.collection_id)
            && !has_text(&self.branch_name)
            && !has_text(&self.page_id)
    }

    /// Copy carrying only the entity-tier fields
    pub fn entity_tier(&self) -> Self {
        Self {
            application_id: self.application_id.clone(),
            collection_id: self.collection_id.clone(),
            branch_name: self.branch_name.clone(),
            page_id: None,
        }
    }

    /// Copy carrying only the state-tier field
    pub fn state_tier(&self) -> Self {
        Self {
            page_id: self.page_id.clone(),
            ..Self::default()
        }
    }
}

/// Empty strings count as unset, as they do in stored documents
pub fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Draft/published pair of snapshots
///
/// Either side may be absent; selecting a side is total and reports absence as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DualState<T> {
    #[serde(default)]
    pub unpublished: Option<T>,
    #[serde(default)]
    pub published: Option<T>,
}

impl<T> Default for DualState<T> {
    fn default() -> Self {
        Self {
            unpublished: None,
            published: None,
        }
    }
}

impl<T> DualState<T> {
    /// Fresh document: draft only, never published
    pub fn draft(state: T) -> Self {
        Self {
            unpublished: Some(state),
            published: None,
        }
    }

    pub fn get(&self, mode: ViewMode) -> Option<&T> {
        match mode {
            ViewMode::Unpublished => self.unpublished.as_ref(),
            ViewMode::Published => self.published.as_ref(),
        }
    }

    pub fn get_mut(&mut self, mode: ViewMode) -> Option<&mut T> {
        match mode {
            ViewMode::Unpublished => self.unpublished.as_mut(),
            ViewMode::Published => self.published.as_mut(),
        }
    }

    pub fn is_published(&self) -> bool {
        self.published.is_some()
    }

    /// Apply `f` to every present side
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut T)) {
        if let Some(state) = self.unpublished.as_mut() {
            f(state);
        }
        if let Some(state) = self.published.as_mut() {
            f(state);
        }
    }
}

/// Capability a policy grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Read,
    Edit,
    Delete,
    Execute,
}

/// Grant of one capability to a set of permission groups
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub permission: Capability,
    #[serde(default)]
    pub permission_groups: BTreeSet<String>,
    /// Document the grant was issued on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_on: Option<String>,
}

impl Policy {
    pub fn new<I, S>(permission: Capability, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permission,
            permission_groups: groups.into_iter().map(Into::into).collect(),
            granted_on: None,
        }
    }
}

pub type PolicySet = BTreeSet<Policy>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PluginType {
    Js,
    Db,
    Api,
    Saas,
    Remote,
    Ai,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Variable {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Datasource {
    pub id: Option<String>,
    pub name: String,
    pub workspace_id: Option<String>,
    pub plugin_id: Option<String>,
    /// Placeholder created because the action named no datasource
    pub auto_generated: bool,
}

/// One side of an action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionState {
    /// Physical id of the owning action, filled when materialized for a view
    pub id: Option<String>,
    pub name: String,
    pub collection_id: Option<String>,
    pub page_id: Option<String>,
    pub application_id: Option<String>,
    pub plugin_id: Option<String>,
    pub plugin_type: Option<PluginType>,
    pub datasource: Option<Datasource>,
    pub fully_qualified_name: Option<String>,
    pub body: Option<String>,
    pub default_resources: DefaultResources,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ActionState {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Child entity of a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Action {
    pub id: Option<String>,
    pub application_id: String,
    pub workspace_id: Option<String>,
    pub plugin_id: Option<String>,
    pub plugin_type: Option<PluginType>,
    pub default_resources: DefaultResources,
    pub states: DualState<ActionState>,
    pub policies: PolicySet,
    pub git_sync_id: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Action {
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn is_archived(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the `mode` side of this action points at `collection_id`
    ///
    /// A draft marked deleted no longer belongs to the unpublished view.
    pub fn belongs_to(&self, collection_id: &str, mode: ViewMode) -> bool {
        match self.states.get(mode) {
            Some(state) => {
                state.collection_id.as_deref() == Some(collection_id)
                    && !(mode == ViewMode::Unpublished && state.deleted_at.is_some())
            }
            None => false,
        }
    }

    /// Name of the published side, if it has one
    pub fn published_name(&self) -> Option<&str> {
        self.states
            .published
            .as_ref()
            .map(|s| s.name.as_str())
            .filter(|n| !n.trim().is_empty())
    }

    /// Snapshot for `mode`, stamped with the action's physical id
    pub fn view(&self, mode: ViewMode) -> Option<ActionState> {
        self.states.get(mode).map(|state| {
            let mut state = state.clone();
            state.id = self.id.clone();
            if state.application_id.is_none() {
                state.application_id = Some(self.application_id.clone());
            }
            state
        })
    }
}

/// One side of a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionState {
    pub name: String,
    pub page_id: Option<String>,
    pub plugin_id: Option<String>,
    pub plugin_type: Option<PluginType>,
    pub body: Option<String>,
    pub variables: Vec<Variable>,
    /// Child actions materialized for display; not the source of truth
    pub actions: Vec<ActionState>,
    pub default_resources: DefaultResources,
    pub deleted_at: Option<DateTime<Utc>>,

    // Copied from the owning collection when a view is generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

impl CollectionState {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fill the fields only meaningful when this state is shown outside its collection
    pub fn populate_transient_fields(&mut self, collection: &Collection) {
        self.id = collection.id.clone();
        self.application_id = Some(collection.application_id.clone());
        self.workspace_id = collection.workspace_id.clone();
    }
}

/// Parent entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Collection {
    pub id: Option<String>,
    pub application_id: String,
    pub workspace_id: Option<String>,
    pub default_resources: DefaultResources,
    pub states: DualState<CollectionState>,
    pub policies: PolicySet,
    /// Correlates every branch copy of this collection
    pub git_sync_id: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Collection {
    pub fn new(application_id: impl Into<String>, draft: CollectionState) -> Self {
        Self {
            application_id: application_id.into(),
            states: DualState::draft(draft),
            ..Self::default()
        }
    }

    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn branch_name(&self) -> Option<&str> {
        self.default_resources
            .branch_name
            .as_deref()
            .filter(|b| !b.trim().is_empty())
    }

    pub fn is_archived(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Name of the published side, if it has one
    pub fn published_name(&self) -> Option<&str> {
        self.states
            .published
            .as_ref()
            .map(|s| s.name.as_str())
            .filter(|n| !n.trim().is_empty())
    }

    /// Display name, preferring the draft
    pub fn display_name(&self) -> &str {
        self.states
            .unpublished
            .as_ref()
            .or(self.states.published.as_ref())
            .map(|s| s.name.as_str())
            .unwrap_or("")
    }
}

/// Read-only projection of a collection for viewers of the deployed application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionView {
    pub id: String,
    pub name: String,
    pub page_id: Option<String>,
    pub application_id: String,
    pub variables: Vec<Variable>,
    pub body: Option<String>,
    pub default_resources: DefaultResources,
    pub actions: Vec<ActionState>,
}
