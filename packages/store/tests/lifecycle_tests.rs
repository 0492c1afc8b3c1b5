//! Integration tests for assembly, views and updates

mod common;

use branchdoc_store::{
    ActionRepository, ActionState, AssemblyRequest, Capability, CollectionPatch,
    CollectionRepository, ErrorKind, EventType, GroupPermissionEvaluator, Policy, ViewMode,
};
use common::{harness, harness_with, js_collection};
use std::sync::Arc;

#[tokio::test]
async fn test_assembly_links_children_to_new_collection() {
    let h = harness();

    let assembled = h
        .service
        .assemble(AssemblyRequest {
            collection: js_collection("utils"),
            actions: vec![ActionState::named("run"), ActionState::named("stop")],
            ..AssemblyRequest::default()
        })
        .await
        .unwrap();

    assert!(assembled.failures.is_empty());
    let id = assembled.view.id.clone().unwrap();

    let stored = h.memory.collections.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.default_resources.collection_id.as_deref(), Some(id.as_str()));
    assert_eq!(stored.default_resources.application_id.as_deref(), Some("app-1"));
    assert_eq!(stored.default_resources.page_id, None);
    assert!(stored.git_sync_id.as_deref().unwrap().starts_with("app-1_"));

    let children = h
        .memory
        .actions
        .find_by_collection_id_and_view_mode(&id, ViewMode::Unpublished)
        .await
        .unwrap();
    assert_eq!(children.len(), 2);
    for child in &children {
        let draft = child.states.unpublished.as_ref().unwrap();
        assert_eq!(draft.collection_id.as_deref(), Some(id.as_str()));
        assert_eq!(draft.default_resources.collection_id.as_deref(), Some(id.as_str()));
        assert_eq!(child.default_resources.collection_id.as_deref(), Some(id.as_str()));
        assert_eq!(child.workspace_id.as_deref(), Some("ws-1"));
    }
}

#[tokio::test]
async fn test_state_records_only_carry_page() {
    let h = harness();
    let assembled = h
        .service
        .assemble(AssemblyRequest {
            collection: js_collection("utils"),
            branch_name: Some("main".to_string()),
            ..AssemblyRequest::default()
        })
        .await
        .unwrap();
    let id = assembled.view.id.unwrap();

    let stored = h.memory.collections.find_by_id(&id).await.unwrap().unwrap();
    let record = &stored.states.unpublished.as_ref().unwrap().default_resources;

    assert_eq!(record.page_id.as_deref(), Some("page-1"));
    assert_eq!(record.application_id, None);
    assert_eq!(record.collection_id, None);
    assert_eq!(record.branch_name, None);
    assert_eq!(stored.default_resources.branch_name.as_deref(), Some("main"));
}

#[tokio::test]
async fn test_repeated_updates_keep_logical_ids() {
    let h = harness();
    let assembled = h
        .service
        .assemble(AssemblyRequest {
            collection: js_collection("utils"),
            actions: vec![ActionState::named("run")],
            ..AssemblyRequest::default()
        })
        .await
        .unwrap();
    let id = assembled.view.id.unwrap();
    let before = h.memory.collections.find_by_id(&id).await.unwrap().unwrap();

    let patch = CollectionPatch {
        body: Some("export default { v: 2 }".to_string()),
        ..CollectionPatch::default()
    };
    h.service.update(&id, &patch).await.unwrap();
    let view = h.service.update(&id, &patch).await.unwrap();

    let after = h.memory.collections.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(after.default_resources, before.default_resources);
    assert_eq!(
        after.states.unpublished.as_ref().unwrap().default_resources,
        before.states.unpublished.as_ref().unwrap().default_resources
    );
    assert_eq!(view.body.as_deref(), Some("export default { v: 2 }"));
    assert_eq!(view.actions.len(), 1);
}

#[tokio::test]
async fn test_unpublished_collection_has_no_published_view() {
    let h = harness();
    let assembled = h
        .service
        .assemble(AssemblyRequest {
            collection: js_collection("utils"),
            ..AssemblyRequest::default()
        })
        .await
        .unwrap();
    let id = assembled.view.id.unwrap();

    let err = h.service.view(&id, ViewMode::Published).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert!(h.service.view(&id, ViewMode::Unpublished).await.is_ok());
}

#[tokio::test]
async fn test_child_policies_are_detached_from_parent() {
    let h = harness();
    let assembled = h
        .service
        .assemble(AssemblyRequest {
            collection: js_collection("utils"),
            actions: vec![ActionState::named("run")],
            ..AssemblyRequest::default()
        })
        .await
        .unwrap();
    let id = assembled.view.id.clone().unwrap();
    let child_id = assembled.view.actions[0].id.clone().unwrap();

    let mut parent = h.memory.collections.find_by_id(&id).await.unwrap().unwrap();
    parent.policies.insert(Policy::new(Capability::Delete, ["admins"]));
    h.service.assembly().save(parent).await.unwrap();

    let child = h.memory.actions.find_by_id(&child_id).await.unwrap().unwrap();
    assert_eq!(child.policies.len(), 4);
    assert!(child
        .policies
        .iter()
        .all(|p| !p.permission_groups.contains("admins")));
    assert!(child.policies.iter().all(|p| p.granted_on.is_none()));
}

#[tokio::test]
async fn test_page_policies_grant_execute_to_readers() {
    let h = harness();
    let mut collection = js_collection("utils");
    collection.policies.clear();

    let assembled = h
        .service
        .assemble(AssemblyRequest {
            collection,
            page_policies: Some([Policy::new(Capability::Read, ["viewers"])].into_iter().collect()),
            ..AssemblyRequest::default()
        })
        .await
        .unwrap();

    let stored = h
        .memory
        .collections
        .find_by_id(assembled.view.id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    let capabilities: Vec<_> = stored.policies.iter().map(|p| p.permission).collect();
    assert_eq!(capabilities, vec![Capability::Read, Capability::Execute]);
}

#[tokio::test]
async fn test_forbidden_and_missing_collapse() {
    let h = harness_with(Arc::new(GroupPermissionEvaluator::new(["strangers"])));
    let created = h.service.assembly().create(js_collection("utils")).await.unwrap();

    let forbidden = h
        .service
        .update(created.id_str(), &CollectionPatch::default())
        .await
        .unwrap_err();
    let missing = h
        .service
        .update("no-such-id", &CollectionPatch::default())
        .await
        .unwrap_err();

    assert_eq!(forbidden.kind(), ErrorKind::ResourceNotFound);
    assert_eq!(missing.kind(), ErrorKind::ResourceNotFound);
    assert_eq!(
        forbidden.to_string(),
        format!("No action collection found with id {}", created.id_str())
    );
}

#[tokio::test]
async fn test_create_events_follow_persistence() {
    let h = harness();
    h.memory.actions.fail_insert_of("broken");

    let assembled = h
        .service
        .assemble(AssemblyRequest {
            collection: js_collection("utils"),
            actions: vec![ActionState::named("run"), ActionState::named("broken")],
            ..AssemblyRequest::default()
        })
        .await
        .unwrap();

    let events = h.memory.analytics.events().await;
    let creates: Vec<_> = events
        .iter()
        .filter(|e| e.event == EventType::Create)
        .collect();

    assert_eq!(creates.len(), 2);
    assert!(creates
        .iter()
        .any(|e| e.subject_kind == "actionCollection"
            && Some(e.subject_id.as_str()) == assembled.view.id.as_deref()));
    assert!(creates
        .iter()
        .all(|e| e.properties.get("actionName").map(String::as_str) != Some("broken")));
}

#[tokio::test]
async fn test_viewer_projection_hides_drafts() {
    let h = harness();
    let created = h.service.assembly().create(js_collection("utils")).await.unwrap();
    let mut published = created.clone();
    published.states.published = published.states.unpublished.clone();
    h.service.assembly().save(published).await.unwrap();
    h.service.assembly().create(js_collection("draft_only")).await.unwrap();

    let views = h.service.views_for_application("app-1", None).await.unwrap();

    assert_eq!(views.len(), 1);
    assert_eq!(views[0].id, created.id_str());
    assert_eq!(views[0].default_resources.collection_id.as_deref(), Some(created.id_str()));
    assert_eq!(views[0].default_resources.page_id.as_deref(), Some("page-1"));
}
