//! # Branchdoc Store
//!
//! Versioning and branch resolution for action collections.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ identity: (branch, logical id) → document   │
//! │  - permission-gated, absent == forbidden    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store: draft / published snapshots          │
//! │  - view generation with child actions       │
//! │  - draft-only updates via CollectionPatch   │
//! └─────────────────────────────────────────────┘
//!          ↓                         ↓
//! ┌──────────────────────┐ ┌────────────────────┐
//! │ cascade: archive and │ │ assembly: create a │
//! │ delete with children │ │ collection + kids  │
//! └──────────────────────┘ └────────────────────┘
//!          ↓                         ↓
//! ┌─────────────────────────────────────────────┐
//! │ default_resources + policy: logical ids     │
//! │ and access grants copied parent → child     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Physical ids are per branch**: logical ids in `default_resources` tie copies together
//! 2. **Drafts are edited, published snapshots are not**
//! 3. **Cascades are best-effort**: child failures are reported, never block the parent
//! 4. **Analytics follows persistence**: no event for a write that did not land
//!
//! ## Usage
//!
//! ```rust,ignore
//! use branchdoc_store::{CollectionService, EngineConfig, InMemoryPorts, Ports};
//!
//! let config = EngineConfig::default();
//! let memory = InMemoryPorts::from_snapshot(snapshot, ids.clone());
//! let ports = Ports::in_memory(&memory, Arc::new(AllowAll), memory.analytics.clone(), ids, &config);
//! let service = CollectionService::new(ports, &config);
//!
//! let assembled = service.assemble(request).await?;
//! let view = service.view(assembled.view.id.as_deref().unwrap(), ViewMode::Unpublished).await?;
//! ```

pub mod analytics;
pub mod assembly;
pub mod cascade;
pub mod config;
pub mod default_resources;
pub mod identity;
pub mod memory;
pub mod merge;
pub mod model;
pub mod permission;
pub mod policy;
pub mod ports;
pub mod service;
pub mod store;
pub mod validation;

pub use analytics::{
    action_properties, collection_properties, AnalyticsEmitter, EventType, RecordedEvent,
    RecordingAnalytics, TracingAnalytics,
};
pub use assembly::{AssembledCollection, AssemblyPipeline, AssemblyRequest};
pub use cascade::{
    ArchivedCollection, CascadeEngine, CascadeFailure, CascadeReport, DeleteOutcome,
    DeletedCollection,
};
pub use config::{ConfigError, EngineConfig};
pub use identity::IdentityResolver;
pub use memory::{
    BranchedApplication, InMemoryActionRepository, InMemoryApplicationBranches,
    InMemoryCollectionRepository, StaticPluginContext, StoreSnapshot,
};
pub use merge::CollectionPatch;
pub use model::*;
pub use permission::{AllowAll, GroupPermissionEvaluator};
pub use ports::*;
pub use service::{CollectionService, InMemoryPorts, Ports};
pub use store::{get_view, DualStateStore};
pub use validation::{ensure_valid, CollectionValidator};

pub use branchdoc_common::{ErrorKind, IdGenerator, ResourceKind, StoreError, StoreResult};
