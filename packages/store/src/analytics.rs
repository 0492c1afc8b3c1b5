//! Analytics event properties and sinks.

use crate::model::{Action, Collection};
use crate::ports::{AnalyticsProperties, AnalyticsSink, AnalyticsSubject};
use async_trait::async_trait;
use branchdoc_common::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

/// Flat properties describing a collection
pub fn collection_properties(collection: &Collection) -> AnalyticsProperties {
    let state = collection
        .states
        .unpublished
        .as_ref()
        .or(collection.states.published.as_ref());

    AnalyticsProperties::from([
        (
            "actionCollectionName".to_string(),
            collection.display_name().to_string(),
        ),
        ("applicationId".to_string(), collection.application_id.clone()),
        (
            "pageId".to_string(),
            text(state.and_then(|s| s.page_id.as_deref())),
        ),
        (
            "orgId".to_string(),
            text(collection.workspace_id.as_deref()),
        ),
    ])
}

/// Flat properties describing an action
pub fn action_properties(action: &Action) -> AnalyticsProperties {
    let state = action
        .states
        .unpublished
        .as_ref()
        .or(action.states.published.as_ref());

    AnalyticsProperties::from([
        (
            "actionName".to_string(),
            text(state.map(|s| s.name.as_str())),
        ),
        (
            "fullyQualifiedName".to_string(),
            text(state.and_then(|s| s.fully_qualified_name.as_deref())),
        ),
        (
            "collectionId".to_string(),
            text(state.and_then(|s| s.collection_id.as_deref())),
        ),
        ("applicationId".to_string(), action.application_id.clone()),
        (
            "pageId".to_string(),
            text(state.and_then(|s| s.page_id.as_deref())),
        ),
        ("pluginId".to_string(), text(action.plugin_id.as_deref())),
    ])
}

fn properties_for(subject: AnalyticsSubject<'_>) -> AnalyticsProperties {
    match subject {
        AnalyticsSubject::Collection(c) => collection_properties(c),
        AnalyticsSubject::Action(a) => action_properties(a),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    Create,
    Delete,
    Archive,
}

/// Event captured by [`RecordingAnalytics`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEvent {
    pub event: EventType,
    pub subject_kind: String,
    pub subject_id: String,
    pub properties: AnalyticsProperties,
}

/// Keeps every event in memory; optionally fails every send
#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<RecordedEvent>>,
    fail: AtomicBool,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().await.clone()
    }

    async fn record(
        &self,
        event: EventType,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Persistence("analytics sink unavailable".to_string()));
        }
        self.events.lock().await.push(RecordedEvent {
            event,
            subject_kind: subject.kind().to_string(),
            subject_id: subject.id().to_string(),
            properties,
        });
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for RecordingAnalytics {
    async fn send_create_event(
        &self,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()> {
        self.record(EventType::Create, subject, properties).await
    }

    async fn send_delete_event(
        &self,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()> {
        self.record(EventType::Delete, subject, properties).await
    }

    async fn send_archive_event(
        &self,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()> {
        self.record(EventType::Archive, subject, properties).await
    }
}

/// Writes events to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

#[async_trait]
impl AnalyticsSink for TracingAnalytics {
    async fn send_create_event(
        &self,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()> {
        info!(kind = subject.kind(), id = %subject.id(), ?properties, "create event");
        Ok(())
    }

    async fn send_delete_event(
        &self,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()> {
        info!(kind = subject.kind(), id = %subject.id(), ?properties, "delete event");
        Ok(())
    }

    async fn send_archive_event(
        &self,
        subject: AnalyticsSubject<'_>,
        properties: AnalyticsProperties,
    ) -> StoreResult<()> {
        info!(kind = subject.kind(), id = %subject.id(), ?properties, "archive event");
        Ok(())
    }
}

/// Sends events after persistence; send failures are logged and dropped
#[derive(Clone)]
pub struct AnalyticsEmitter {
    sink: Arc<dyn AnalyticsSink>,
    enabled: bool,
}

impl AnalyticsEmitter {
    pub fn new(sink: Arc<dyn AnalyticsSink>, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    pub async fn emit(&self, event: EventType, subject: AnalyticsSubject<'_>) {
        if !self.enabled {
            return;
        }
        let properties = properties_for(subject);
        let sent = match event {
            EventType::Create => self.sink.send_create_event(subject, properties).await,
            EventType::Delete => self.sink.send_delete_event(subject, properties).await,
            EventType::Archive => self.sink.send_archive_event(subject, properties).await,
        };
        if let Err(e) = sent {
            warn!(
                kind = subject.kind(),
                id = %subject.id(),
                ?event,
                error = %e,
                "Analytics event dropped"
            );
        }
    }
}
