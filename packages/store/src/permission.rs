use crate::model::{Capability, PolicySet};
use crate::ports::PermissionEvaluator;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Grants every capability
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl PermissionEvaluator for AllowAll {
    async fn is_allowed(&self, _policies: &PolicySet, _capability: Capability) -> bool {
        true
    }
}

/// Allows a capability when one of the caller's groups appears in a matching policy
#[derive(Debug, Default, Clone)]
pub struct GroupPermissionEvaluator {
    groups: BTreeSet<String>,
}

impl GroupPermissionEvaluator {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl PermissionEvaluator for GroupPermissionEvaluator {
    async fn is_allowed(&self, policies: &PolicySet, capability: Capability) -> bool {
        policies
            .iter()
            .filter(|p| p.permission == capability)
            .any(|p| !p.permission_groups.is_disjoint(&self.groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Policy;

    #[tokio::test]
    async fn test_group_evaluator_matches_capability_and_group() {
        let policies: PolicySet = [
            Policy::new(Capability::Read, ["viewers", "developers"]),
            Policy::new(Capability::Delete, ["admins"]),
        ]
        .into_iter()
        .collect();

        let developer = GroupPermissionEvaluator::new(["developers"]);
        assert!(developer.is_allowed(&policies, Capability::Read).await);
        assert!(!developer.is_allowed(&policies, Capability::Delete).await);

        let stranger = GroupPermissionEvaluator::new(Vec::<String>::new());
        assert!(!stranger.is_allowed(&policies, Capability::Read).await);
    }
}
