//! Resolution of `(branch, logical id)` pairs to physical collections.
//!
//! Absent and forbidden documents are reported identically as `ResourceNotFound`; only the
//! logs tell them apart.

use crate::model::{Capability, Collection};
use crate::ports::{CollectionRepository, PermissionEvaluator};
use branchdoc_common::{ResourceKind, StoreError, StoreResult};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct IdentityResolver {
    collections: Arc<dyn CollectionRepository>,
    permissions: Arc<dyn PermissionEvaluator>,
}

impl IdentityResolver {
    pub fn new(
        collections: Arc<dyn CollectionRepository>,
        permissions: Arc<dyn PermissionEvaluator>,
    ) -> Self {
        Self {
            collections,
            permissions,
        }
    }

    /// Physical collection for `logical_id` on `branch_name`, readable with `capability`
    ///
    /// Without a branch, `logical_id` is taken to be the physical id.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        branch_name: Option<&str>,
        logical_id: &str,
        capability: Capability,
    ) -> StoreResult<Collection> {
        if logical_id.trim().is_empty() {
            return Err(StoreError::invalid_parameter("collectionId"));
        }

        let found = match branch_name.filter(|b| !b.trim().is_empty()) {
            None => self.collections.find_by_id(logical_id).await?,
            Some(branch) => {
                self.collections
                    .find_by_branch_and_default_collection_id(branch, logical_id)
                    .await?
            }
        };

        let Some(collection) = found else {
            debug!(collection_id = %logical_id, "Collection does not exist");
            return Err(StoreError::not_found(ResourceKind::ActionCollection, logical_id));
        };

        self.authorize(collection, capability, logical_id).await
    }

    /// Physical id lookup under `capability`
    pub async fn resolve_physical(
        &self,
        id: &str,
        capability: Capability,
    ) -> StoreResult<Collection> {
        self.resolve(None, id, capability).await
    }

    /// Gate an already loaded collection on `capability`
    pub async fn authorize(
        &self,
        collection: Collection,
        capability: Capability,
        requested_id: &str,
    ) -> StoreResult<Collection> {
        if self
            .permissions
            .is_allowed(&collection.policies, capability)
            .await
        {
            Ok(collection)
        } else {
            debug!(
                collection_id = %collection.id_str(),
                ?capability,
                "Access denied to collection"
            );
            Err(StoreError::not_found(
                ResourceKind::ActionCollection,
                requested_id,
            ))
        }
    }

    /// Like [`Self::authorize`] but returns `None` when denied
    pub async fn permitted(
        &self,
        collection: Collection,
        capability: Capability,
    ) -> Option<Collection> {
        self.permissions
            .is_allowed(&collection.policies, capability)
            .await
            .then_some(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCollectionRepository;
    use crate::model::{CollectionState, Policy};
    use crate::permission::GroupPermissionEvaluator;
    use branchdoc_common::{ErrorKind, IdGenerator, SequentialIdGenerator};

    async fn fixture(groups: &[&str]) -> (IdentityResolver, Collection) {
        let ids: Arc<dyn IdGenerator> = Arc::new(SequentialIdGenerator::new("identity"));
        let repo = Arc::new(InMemoryCollectionRepository::new(ids));

        let mut collection = Collection::new("app-1", CollectionState::named("utils"));
        collection.default_resources.collection_id = Some("logical-1".to_string());
        collection.default_resources.branch_name = Some("feature".to_string());
        collection.policies = [Policy::new(Capability::Edit, ["developers"])]
            .into_iter()
            .collect();
        let collection = repo.insert(collection).await.unwrap();

        let resolver = IdentityResolver::new(
            repo,
            Arc::new(GroupPermissionEvaluator::new(groups.iter().copied())),
        );
        (resolver, collection)
    }

    #[tokio::test]
    async fn test_empty_id_is_invalid() {
        let (resolver, _) = fixture(&["developers"]).await;
        let err = resolver.resolve(None, " ", Capability::Edit).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[tokio::test]
    async fn test_branch_lookup_uses_logical_id() {
        let (resolver, collection) = fixture(&["developers"]).await;

        let found = resolver
            .resolve(Some("feature"), "logical-1", Capability::Edit)
            .await
            .unwrap();
        assert_eq!(found.id, collection.id);

        let direct = resolver
            .resolve(Some(""), collection.id_str(), Capability::Edit)
            .await
            .unwrap();
        assert_eq!(direct.id, collection.id);
    }

    #[tokio::test]
    async fn test_forbidden_and_absent_look_the_same() {
        let (resolver, collection) = fixture(&["viewers"]).await;

        let forbidden = resolver
            .resolve(None, collection.id_str(), Capability::Edit)
            .await
            .unwrap_err();
        let absent = resolver
            .resolve(None, "missing", Capability::Edit)
            .await
            .unwrap_err();

        assert_eq!(forbidden.kind(), ErrorKind::ResourceNotFound);
        assert_eq!(absent.kind(), ErrorKind::ResourceNotFound);
    }
}
