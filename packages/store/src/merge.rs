//! Field-level patches for the unpublished side of a collection.

use crate::model::{CollectionState, PluginType, Variable};
use serde::{Deserialize, Serialize};

/// Fields a client may change on a draft; `None` leaves the field as it is
///
/// Actions, logical ids and deletion markers are not patchable: they are owned by the
/// assembly pipeline, the default-resource propagator and the cascade engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionPatch {
    pub name: Option<String>,
    pub page_id: Option<String>,
    pub plugin_id: Option<String>,
    pub plugin_type: Option<PluginType>,
    pub body: Option<String>,
    pub variables: Option<Vec<Variable>>,
}

impl CollectionPatch {
    pub fn is_empty(&self) -> bool {
        *self == CollectionPatch::default()
    }

    /// New state with every set field of the patch written over `base`
    pub fn merge(&self, base: &CollectionState) -> CollectionState {
        let mut merged = base.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(page_id) = &self.page_id {
            merged.page_id = Some(page_id.clone());
        }
        if let Some(plugin_id) = &self.plugin_id {
            merged.plugin_id = Some(plugin_id.clone());
        }
        if let Some(plugin_type) = self.plugin_type {
            merged.plugin_type = Some(plugin_type);
        }
        if let Some(body) = &self.body {
            merged.body = Some(body.clone());
        }
        if let Some(variables) = &self.variables {
            merged.variables = variables.clone();
        }
        merged
    }
}
