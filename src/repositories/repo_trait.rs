use async_trait::async_trait;

use super::RepositoryError;
use crate::entities::{Entity, EntityId};
use crate::specifications::Specification;

/// Read-only gateway to a store of `T`.
///
/// Calls are independent and may run concurrently on a shared instance; no
/// ordering between them is implied. Includes of a specification are only
/// honoured by [`get_entity_with_spec`](Self::get_entity_with_spec) and
/// [`list`](Self::list).
#[async_trait]
pub trait GenericRepository<T: Entity>: Send + Sync {
    /// `Ok(None)` when no entity has this identity.
    async fn get_by_id(&self, id: EntityId) -> Result<Option<T>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<T>, RepositoryError>;

    /// First entity matching `spec`, with its includes attached.
    async fn get_entity_with_spec(
        &self,
        spec: &dyn Specification<T>,
    ) -> Result<Option<T>, RepositoryError>;

    async fn list(&self, spec: &dyn Specification<T>) -> Result<Vec<T>, RepositoryError>;
}
