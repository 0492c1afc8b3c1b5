//! Policy propagation from parents to children.
//!
//! Children receive a detached copy at creation time; nothing re-syncs them afterwards.

use crate::model::{Capability, Policy, PolicySet};

/// Child policy set holding only `{permission, permission_groups}` of each parent policy
pub fn derive_policies(parent: &PolicySet) -> PolicySet {
    parent
        .iter()
        .map(|policy| Policy {
            permission: policy.permission,
            permission_groups: policy.permission_groups.clone(),
            granted_on: None,
        })
        .collect()
}

/// Capabilities a page capability grants on the collections and actions it contains
fn child_capabilities(page_capability: Capability) -> &'static [Capability] {
    match page_capability {
        Capability::Read => &[Capability::Read, Capability::Execute],
        Capability::Edit => &[Capability::Edit],
        Capability::Delete => &[Capability::Delete],
        Capability::Execute => &[Capability::Execute],
    }
}

/// Policies for a document created on a page, merged per capability
pub fn policies_from_page(page_policies: &PolicySet) -> PolicySet {
    let mut merged: std::collections::BTreeMap<Capability, Policy> = Default::default();

    for page_policy in page_policies {
        for &capability in child_capabilities(page_policy.permission) {
            merged
                .entry(capability)
                .or_insert_with(|| Policy::new(capability, Vec::<String>::new()))
                .permission_groups
                .extend(page_policy.permission_groups.iter().cloned());
        }
    }

    merged.into_values().collect()
}
