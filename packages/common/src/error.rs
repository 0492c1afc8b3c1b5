use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of stored resource an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    ActionCollection,
    Action,
    Application,
    Page,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::ActionCollection => "action collection",
            ResourceKind::Action => "action",
            ResourceKind::Application => "application",
            ResourceKind::Page => "page",
        };
        f.write_str(name)
    }
}

/// Error type shared by every branchdoc component
///
/// `ResourceNotFound` is returned both when a document does not exist and when the caller
/// lacks the required capability on it. The two cases are only told apart in logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No {kind} found with id {id}")]
    ResourceNotFound { kind: ResourceKind, id: String },

    #[error("Invalid action collection '{name}': [{}]", messages.join(", "))]
    InvalidActionCollection { name: String, messages: Vec<String> },

    #[error("Dependent {kind} {child_id} of {parent_id} failed: {reason}")]
    DependencyOperationFailed {
        kind: ResourceKind,
        parent_id: String,
        child_id: String,
        reason: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Discriminant of [`StoreError`], used in structured failure records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidParameter,
    ResourceNotFound,
    InvalidActionCollection,
    DependencyOperationFailed,
    Persistence,
}

impl StoreError {
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        StoreError::ResourceNotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_parameter(field: impl Into<String>) -> Self {
        StoreError::InvalidParameter(field.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            StoreError::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            StoreError::InvalidActionCollection { .. } => ErrorKind::InvalidActionCollection,
            StoreError::DependencyOperationFailed { .. } => ErrorKind::DependencyOperationFailed,
            StoreError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
