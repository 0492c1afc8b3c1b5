//! # Cascade Engine
//!
//! Archiving and deleting collections together with their child actions.
//!
//! ```text
//! resolve (delete) ──► enumerate children ──► archive children (bounded, best-effort)
//!                        unpublished ┐                 │
//!                        published   ┘ joined          ▼
//!                                             archive parent (fail-fast)
//!                                                      │
//!                                                      ▼
//!                                               delete analytics event
//! ```
//!
//! Deleting the draft of a published collection saves it instead of archiving it and sends
//! an archive event.
//!
//! Child failures never block the parent. They are logged and returned in the
//! [`CascadeReport`] so the caller can see exactly which children survived.

use crate::analytics::{AnalyticsEmitter, EventType};
use crate::identity::IdentityResolver;
use crate::model::{Action, Capability, Collection, ViewMode};
use crate::ports::{ActionRepository, AnalyticsSubject, CollectionRepository};
use branchdoc_common::{ErrorKind, ResourceKind, StoreError, StoreResult};
use chrono::Utc;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Child operation that did not go through
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeFailure {
    pub child_id: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// What happened to each child during a cascade
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    pub archived: Vec<Action>,
    /// Children whose draft was marked deleted while their published side stays live
    pub soft_deleted: Vec<Action>,
    pub failures: Vec<CascadeFailure>,
}

impl CascadeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedCollection {
    pub collection: Collection,
    pub report: CascadeReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteOutcome {
    /// Only the draft was marked deleted; the published snapshot stays live
    SoftDeleted,
    /// Never published, so the whole document was archived
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCollection {
    pub collection: Collection,
    pub outcome: DeleteOutcome,
    pub report: CascadeReport,
}

enum ChildOutcome {
    Archived(Action),
    SoftDeleted(Action),
    Failed(CascadeFailure),
}

#[derive(Clone)]
pub struct CascadeEngine {
    collections: Arc<dyn CollectionRepository>,
    actions: Arc<dyn ActionRepository>,
    resolver: IdentityResolver,
    analytics: AnalyticsEmitter,
    concurrency: usize,
}

impl CascadeEngine {
    pub fn new(
        collections: Arc<dyn CollectionRepository>,
        actions: Arc<dyn ActionRepository>,
        resolver: IdentityResolver,
        analytics: AnalyticsEmitter,
        concurrency: usize,
    ) -> Self {
        Self {
            collections,
            actions,
            resolver,
            analytics,
            concurrency: concurrency.max(1),
        }
    }

    /// Archive collection `id` and every action referencing it in either view
    #[instrument(skip(self))]
    pub async fn archive(&self, id: &str) -> StoreResult<ArchivedCollection> {
        let collection = self.resolver.resolve_physical(id, Capability::Delete).await?;
        self.archive_resolved(collection).await
    }

    /// Archive every collection of an application the caller may delete
    #[instrument(skip(self))]
    pub async fn archive_by_application(
        &self,
        application_id: &str,
    ) -> StoreResult<Vec<ArchivedCollection>> {
        if application_id.trim().is_empty() {
            return Err(StoreError::invalid_parameter("applicationId"));
        }
        let collections = self
            .collections
            .find_by_application_id(application_id, None)
            .await?;

        let mut deletable = Vec::with_capacity(collections.len());
        for collection in collections {
            if let Some(c) = self.resolver.permitted(collection, Capability::Delete).await {
                deletable.push(c);
            }
        }

        join_all(deletable.into_iter().map(|c| self.archive_resolved(c)))
            .await
            .into_iter()
            .collect()
    }

    /// Delete the draft of collection `id`
    ///
    /// A collection that was ever published keeps its published snapshot and only has its
    /// draft marked deleted; otherwise it is archived outright.
    pub async fn delete_unpublished(&self, id: &str) -> StoreResult<DeletedCollection> {
        self.delete_unpublished_on_branch(id, None).await
    }

    /// [`Self::delete_unpublished`] for the branch copy of logical id `id`
    #[instrument(skip(self))]
    pub async fn delete_unpublished_on_branch(
        &self,
        id: &str,
        branch_name: Option<&str>,
    ) -> StoreResult<DeletedCollection> {
        let collection = self
            .resolver
            .resolve(branch_name, id, Capability::Delete)
            .await?;

        if collection.published_name().is_none() {
            let archived = self.archive_resolved(collection).await?;
            return Ok(DeletedCollection {
                collection: archived.collection,
                outcome: DeleteOutcome::Archived,
                report: archived.report,
            });
        }

        self.soft_delete(collection).await
    }

    async fn soft_delete(&self, mut collection: Collection) -> StoreResult<DeletedCollection> {
        let parent_id = collection.id_str().to_string();
        if let Some(draft) = collection.states.unpublished.as_mut() {
            draft.deleted_at = Some(Utc::now());
        }

        let children = self
            .actions
            .find_by_collection_id_and_view_mode(&parent_id, ViewMode::Unpublished)
            .await?;
        let outcomes = self.run_children(&parent_id, children, true).await;
        let report = self.report(&parent_id, outcomes).await;

        let saved = self.collections.save(collection).await?;
        info!(
            collection_id = %parent_id,
            archived = report.archived.len(),
            soft_deleted = report.soft_deleted.len(),
            failed = report.failures.len(),
            "Deleted collection draft"
        );
        self.analytics
            .emit(EventType::Archive, AnalyticsSubject::Collection(&saved))
            .await;

        Ok(DeletedCollection {
            collection: saved,
            outcome: DeleteOutcome::SoftDeleted,
            report,
        })
    }

    async fn archive_resolved(&self, collection: Collection) -> StoreResult<ArchivedCollection> {
        let parent_id = collection.id_str().to_string();

        let children = self.children_in_both_views(&parent_id).await?;
        let outcomes = self.run_children(&parent_id, children, false).await;
        let report = self.report(&parent_id, outcomes).await;

        let archived = self.collections.archive(&collection).await?;
        info!(
            collection_id = %parent_id,
            archived = report.archived.len(),
            failed = report.failures.len(),
            "Archived collection"
        );
        self.analytics
            .emit(EventType::Delete, AnalyticsSubject::Collection(&archived))
            .await;

        Ok(ArchivedCollection {
            collection: archived,
            report,
        })
    }

    /// Actions referencing `collection_id` from either side, each listed once
    async fn children_in_both_views(&self, collection_id: &str) -> StoreResult<Vec<Action>> {
        let (unpublished, published) = tokio::join!(
            self.actions
                .find_by_collection_id_and_view_mode(collection_id, ViewMode::Unpublished),
            self.actions
                .find_by_collection_id_and_view_mode(collection_id, ViewMode::Published),
        );

        let mut seen = HashSet::new();
        Ok(unpublished?
            .into_iter()
            .chain(published?)
            .filter(|a| seen.insert(a.id.clone()))
            .collect())
    }

    /// Archive (or, when `soft` and published, draft-delete) every child
    async fn run_children(
        &self,
        parent_id: &str,
        children: Vec<Action>,
        soft: bool,
    ) -> Vec<ChildOutcome> {
        let actions = self.actions.clone();
        stream::iter(children)
            .map(move |child| {
                let actions = actions.clone();
                let parent_id = parent_id.to_string();
                async move {
                    let child_id = child.id_str().to_string();
                    let result = if soft && child.published_name().is_some() {
                        let mut child = child;
                        if let Some(draft) = child.states.unpublished.as_mut() {
                            draft.deleted_at = Some(Utc::now());
                        }
                        actions.save(child).await.map(ChildOutcome::SoftDeleted)
                    } else {
                        actions.archive(&child).await.map(ChildOutcome::Archived)
                    };

                    result.unwrap_or_else(|e| {
                        error!(
                            parent_id = %parent_id,
                            child_id = %child_id,
                            error = %e,
                            "Failed to delete child action"
                        );
                        let kind = e.kind();
                        let wrapped = StoreError::DependencyOperationFailed {
                            kind: ResourceKind::Action,
                            parent_id,
                            child_id: child_id.clone(),
                            reason: e.to_string(),
                        };
                        ChildOutcome::Failed(CascadeFailure {
                            child_id,
                            kind,
                            message: wrapped.to_string(),
                        })
                    })
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn report(&self, parent_id: &str, outcomes: Vec<ChildOutcome>) -> CascadeReport {
        let mut report = CascadeReport::default();
        for outcome in outcomes {
            match outcome {
                ChildOutcome::Archived(action) => {
                    self.analytics
                        .emit(EventType::Delete, AnalyticsSubject::Action(&action))
                        .await;
                    report.archived.push(action);
                }
                ChildOutcome::SoftDeleted(action) => report.soft_deleted.push(action),
                ChildOutcome::Failed(failure) => report.failures.push(failure),
            }
        }
        if !report.is_complete() {
            error!(
                collection_id = %parent_id,
                failed = report.failures.len(),
                "Cascade finished with failed children"
            );
        }
        report
    }
}
