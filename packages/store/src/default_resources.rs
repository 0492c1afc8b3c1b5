//! # Default Resources
//!
//! Writes the logical identifiers that tie every branch copy of a document together.
//!
//! Two tiers, each owning its own fields:
//!
//! ```text
//! Collection.default_resources        { applicationId, collectionId, branchName }
//! CollectionState.default_resources   { pageId }
//! ActionState.default_resources       { collectionId, pageId }
//! ```
//!
//! Initialization only fills fields that are still empty, so repeated runs are stable.
//! `force` recomputes the record from the document's own ids instead.

use crate::model::{
    has_text, Action, ActionState, Collection, CollectionState, DefaultResources,
};
use tracing::debug;

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if !has_text(slot) {
        *slot = value.filter(|v| !v.trim().is_empty());
    }
}

/// Initialize the entity-tier record of a collection
pub fn initialize_collection(collection: &mut Collection, branch_name: Option<&str>, force: bool) {
    let own_application = non_blank(&collection.application_id);
    let own_id = collection.id.clone();
    let branch = branch_name.and_then(non_blank);

    let record = &mut collection.default_resources;
    if force || record.is_empty() {
        *record = DefaultResources {
            application_id: own_application,
            collection_id: own_id,
            branch_name: branch,
            page_id: None,
        };
        return;
    }

    fill(&mut record.application_id, own_application);
    fill(&mut record.collection_id, own_id);
    fill(&mut record.branch_name, branch);
    record.page_id = None;
}

/// Initialize the state-tier record of one collection state
pub fn initialize_state(state: &mut CollectionState, force: bool) {
    let mut record = state.default_resources.state_tier();
    if force {
        record.page_id = None;
    }
    fill(&mut record.page_id, state.page_id.clone());
    state.default_resources = record;
}

/// Initialize both tiers of a collection: the entity record and every present state
pub fn initialize_collection_tree(
    collection: &mut Collection,
    branch_name: Option<&str>,
    force: bool,
) {
    initialize_collection(collection, branch_name, force);
    collection
        .states
        .for_each_mut(|state| initialize_state(state, force));
}

/// Initialize the entity-tier record of an action
pub fn initialize_action(action: &mut Action, branch_name: Option<&str>, force: bool) {
    let own_application = non_blank(&action.application_id);
    let parent_collection = action
        .states
        .unpublished
        .as_ref()
        .and_then(|s| s.default_resources.collection_id.clone().or(s.collection_id.clone()));
    let branch = branch_name.and_then(non_blank);

    let record = &mut action.default_resources;
    if force || record.is_empty() {
        *record = DefaultResources {
            application_id: own_application,
            collection_id: parent_collection,
            branch_name: branch,
            page_id: None,
        };
        return;
    }

    fill(&mut record.application_id, own_application);
    fill(&mut record.collection_id, parent_collection);
    fill(&mut record.branch_name, branch);
    record.page_id = None;
}

/// Initialize the state-tier record of one action state
pub fn initialize_action_state(state: &mut ActionState, force: bool) {
    let mut record = DefaultResources {
        collection_id: state.default_resources.collection_id.clone(),
        page_id: state.default_resources.page_id.clone(),
        ..DefaultResources::default()
    };
    if force {
        record = DefaultResources::default();
    }
    fill(&mut record.collection_id, state.collection_id.clone());
    fill(&mut record.page_id, state.page_id.clone());
    state.default_resources = record;
}

/// Logical page id of a state, falling back to its physical page
fn state_page(state: &CollectionState) -> Option<String> {
    state
        .default_resources
        .page_id
        .clone()
        .filter(|p| !p.trim().is_empty())
        .or_else(|| state.page_id.clone())
}

/// Link `target` as the `branch_name` copy of `source`
///
/// The copy shares the source's logical ids, policies, sync id and deletion markers; only the
/// branch name differs.
pub fn populate_from_branched(target: &mut Collection, source: &Collection, branch_name: &str) {
    let mut record = source.default_resources.entity_tier();
    record.branch_name = non_blank(branch_name);
    target.default_resources = record;

    let page_id = source
        .states
        .unpublished
        .as_ref()
        .or(source.states.published.as_ref())
        .and_then(state_page);
    let state_record = DefaultResources {
        page_id,
        ..DefaultResources::default()
    };
    target
        .states
        .for_each_mut(|state| state.default_resources = state_record.clone());

    if let (Some(target_draft), Some(source_draft)) = (
        target.states.unpublished.as_mut(),
        source.states.unpublished.as_ref(),
    ) {
        target_draft.deleted_at = source_draft.deleted_at;
    }
    target.deleted_at = source.deleted_at;
    target.policies = source.policies.clone();
    target.git_sync_id = source.git_sync_id.clone();
}

/// Record shown alongside a state in a view: entity ids plus the state's page
///
/// A state without its own page record should not exist; when it does, the record is
/// synthesized from the collection and whichever state carries a page.
pub fn view_defaults(collection: &Collection, state: &CollectionState) -> DefaultResources {
    let entity = &collection.default_resources;

    if has_text(&state.default_resources.page_id) && !entity.is_empty() {
        let mut record = entity.entity_tier();
        record.page_id = state.default_resources.page_id.clone();
        return record;
    }

    debug!(
        collection_id = collection.id_str(),
        "Unreachable state, unable to find default ids for collection"
    );

    let mut record = if entity.is_empty() {
        DefaultResources {
            application_id: non_blank(&collection.application_id),
            collection_id: collection.id.clone(),
            ..DefaultResources::default()
        }
    } else {
        entity.entity_tier()
    };
    record.page_id = state_page(state)
        .or_else(|| collection.states.published.as_ref().and_then(state_page))
        .or_else(|| collection.states.unpublished.as_ref().and_then(state_page));
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DualState;

    fn collection() -> Collection {
        let mut draft = CollectionState::named("utils");
        draft.page_id = Some("page-1".to_string());
        let mut collection = Collection::new("app-1", draft);
        collection.id = Some("c-1".to_string());
        collection
    }

    #[test]
    fn test_synthesizes_record_from_own_ids() {
        let mut c = collection();
        initialize_collection_tree(&mut c, Some("main"), false);

        assert_eq!(c.default_resources.application_id.as_deref(), Some("app-1"));
        assert_eq!(c.default_resources.collection_id.as_deref(), Some("c-1"));
        assert_eq!(c.default_resources.branch_name.as_deref(), Some("main"));
        assert_eq!(c.default_resources.page_id, None);

        let draft = c.states.unpublished.as_ref().unwrap();
        assert_eq!(draft.default_resources.page_id.as_deref(), Some("page-1"));
    }

    #[test]
    fn test_initialization_is_idempotent() {
        let mut c = collection();
        initialize_collection_tree(&mut c, Some("main"), false);
        let first = c.clone();

        initialize_collection_tree(&mut c, Some("main"), false);
        assert_eq!(c, first);
    }

    #[test]
    fn test_existing_fields_are_not_overwritten() {
        let mut c = collection();
        c.default_resources.collection_id = Some("c-root".to_string());
        c.default_resources.page_id = Some("leaked".to_string());

        initialize_collection(&mut c, Some("feature"), false);

        assert_eq!(c.default_resources.collection_id.as_deref(), Some("c-root"));
        assert_eq!(c.default_resources.application_id.as_deref(), Some("app-1"));
        assert_eq!(c.default_resources.branch_name.as_deref(), Some("feature"));
        assert_eq!(c.default_resources.page_id, None);
    }

    #[test]
    fn test_force_recomputes_from_own_ids() {
        let mut c = collection();
        c.default_resources.collection_id = Some("c-root".to_string());
        c.default_resources.branch_name = Some("old".to_string());

        initialize_collection(&mut c, Some("new"), true);

        assert_eq!(c.default_resources.collection_id.as_deref(), Some("c-1"));
        assert_eq!(c.default_resources.branch_name.as_deref(), Some("new"));
    }

    #[test]
    fn test_state_tier_keeps_only_page() {
        let mut state = CollectionState::named("utils");
        state.page_id = Some("page-1".to_string());
        state.default_resources = DefaultResources {
            application_id: Some("app".to_string()),
            collection_id: Some("c".to_string()),
            branch_name: Some("main".to_string()),
            page_id: None,
        };

        initialize_state(&mut state, false);

        assert_eq!(
            state.default_resources,
            DefaultResources {
                page_id: Some("page-1".to_string()),
                ..DefaultResources::default()
            }
        );
    }

    #[test]
    fn test_branch_copy_shares_logical_ids() {
        let mut source = collection();
        source.git_sync_id = Some("app-1_sync".to_string());
        initialize_collection_tree(&mut source, Some("main"), false);

        let mut copy = Collection::new("app-2", CollectionState::named("utils"));
        copy.states.published = Some(CollectionState::named("utils"));
        populate_from_branched(&mut copy, &source, "feature");

        assert_eq!(copy.default_resources.collection_id.as_deref(), Some("c-1"));
        assert_eq!(copy.default_resources.branch_name.as_deref(), Some("feature"));
        assert_eq!(copy.git_sync_id.as_deref(), Some("app-1_sync"));
        for state in [copy.states.unpublished.as_ref(), copy.states.published.as_ref()] {
            assert_eq!(
                state.unwrap().default_resources.page_id.as_deref(),
                Some("page-1")
            );
        }
    }

    #[test]
    fn test_view_defaults_fallback_populates_page() {
        let mut c = collection();
        let mut published = CollectionState::named("utils");
        published.page_id = Some("page-9".to_string());
        c.states = DualState {
            unpublished: c.states.unpublished.take(),
            published: Some(published.clone()),
        };

        let record = view_defaults(&c, &published);

        assert_eq!(record.application_id.as_deref(), Some("app-1"));
        assert_eq!(record.collection_id.as_deref(), Some("c-1"));
        assert_eq!(record.page_id.as_deref(), Some("page-9"));
    }

    #[test]
    fn test_action_state_record() {
        let mut state = ActionState::named("run");
        state.collection_id = Some("c-1".to_string());
        state.page_id = Some("page-1".to_string());

        initialize_action_state(&mut state, false);

        assert_eq!(state.default_resources.collection_id.as_deref(), Some("c-1"));
        assert_eq!(state.default_resources.page_id.as_deref(), Some("page-1"));
        assert_eq!(state.default_resources.branch_name, None);
    }
}
