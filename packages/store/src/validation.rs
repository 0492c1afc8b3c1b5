//! Structural validation for collections and the child specs assembled with them

use crate::model::{has_text, ActionState, Collection};
use branchdoc_common::StoreError;
use std::collections::HashSet;

/// Collects every violation instead of stopping at the first one
#[derive(Debug, Default)]
pub struct CollectionValidator {
    messages: Vec<String>,
}

impl CollectionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Violations of `collection` and `children`, in discovery order
    pub fn validate(&mut self, collection: &Collection, children: &[ActionState]) -> Vec<String> {
        self.messages.clear();

        if collection.application_id.trim().is_empty() {
            self.push("applicationId is missing");
        }

        match collection.states.unpublished.as_ref() {
            None => self.push("unpublished collection is missing"),
            Some(draft) => {
                if draft.name.trim().is_empty() {
                    self.push("name is missing");
                } else if !is_valid_identifier(&draft.name) {
                    self.push(format!("name '{}' is not a valid identifier", draft.name));
                }
                if !has_text(&draft.page_id) {
                    self.push("pageId is missing");
                }
                if !has_text(&draft.plugin_id) {
                    self.push("pluginId is missing");
                }
            }
        }

        self.validate_children(collection, children);

        self.messages.clone()
    }

    fn validate_children(&mut self, collection: &Collection, children: &[ActionState]) {
        let mut seen = HashSet::new();

        for (position, child) in children.iter().enumerate() {
            match child.id.as_deref() {
                Some(id) if id.trim().is_empty() => {
                    self.push(format!("action at position {position} has an empty id"));
                }
                Some(id) => {
                    if let (Some(owner), Some(parent)) =
                        (child.collection_id.as_deref(), collection.id.as_deref())
                    {
                        if owner != parent {
                            self.push(format!("action {id} belongs to collection {owner}"));
                        }
                    }
                }
                None => {
                    if child.name.trim().is_empty() {
                        self.push(format!("action at position {position} has no name"));
                    } else if !is_valid_identifier(&child.name) {
                        self.push(format!(
                            "action name '{}' is not a valid identifier",
                            child.name
                        ));
                    }
                }
            }

            if !child.name.trim().is_empty() && !seen.insert(child.name.as_str()) {
                self.push(format!("duplicate action name '{}'", child.name));
            }
        }
    }

    fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }
}

/// JS-style identifier: letter, `_` or `$`, then letters, digits, `_` or `$`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Validate and turn violations into `InvalidActionCollection`
pub fn ensure_valid(collection: &Collection, children: &[ActionState]) -> Result<(), StoreError> {
    let messages = CollectionValidator::new().validate(collection, children);
    if messages.is_empty() {
        Ok(())
    } else {
        Err(StoreError::InvalidActionCollection {
            name: collection.display_name().to_string(),
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CollectionState;

    fn valid() -> Collection {
        let mut draft = CollectionState::named("utils");
        draft.page_id = Some("page-1".to_string());
        draft.plugin_id = Some("js-plugin".to_string());
        Collection::new("app-1", draft)
    }

    #[test]
    fn test_valid_collection_passes() {
        let children = vec![ActionState::named("run"), ActionState::named("stop")];
        assert!(ensure_valid(&valid(), &children).is_ok());
    }

    #[test]
    fn test_collects_every_violation() {
        let mut collection = valid();
        let draft = collection.states.unpublished.as_mut().unwrap();
        draft.name = String::new();
        draft.page_id = None;
        draft.plugin_id = None;

        let children = vec![ActionState::named("1st"), ActionState::named("")];
        let err = ensure_valid(&collection, &children).unwrap_err();

        match err {
            StoreError::InvalidActionCollection { messages, .. } => {
                assert_eq!(
                    messages,
                    vec![
                        "name is missing".to_string(),
                        "pageId is missing".to_string(),
                        "pluginId is missing".to_string(),
                        "action name '1st' is not a valid identifier".to_string(),
                        "action at position 1 has no name".to_string(),
                    ]
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_child_names() {
        let children = vec![ActionState::named("run"), ActionState::named("run")];
        let messages = CollectionValidator::new().validate(&valid(), &children);
        assert_eq!(messages, vec!["duplicate action name 'run'".to_string()]);
    }

    #[test]
    fn test_existing_child_of_other_collection() {
        let mut collection = valid();
        collection.id = Some("c-1".to_string());
        let mut child = ActionState::named("run");
        child.id = Some("a-1".to_string());
        child.collection_id = Some("c-2".to_string());

        let messages = CollectionValidator::new().validate(&collection, &[child]);
        assert_eq!(messages, vec!["action a-1 belongs to collection c-2".to_string()]);
    }

    #[test]
    fn test_identifiers() {
        assert!(is_valid_identifier("utils"));
        assert!(is_valid_identifier("_private$1"));
        assert!(!is_valid_identifier("1st"));
        assert!(!is_valid_identifier("has space"));
        assert!(!is_valid_identifier(""));
    }
}
