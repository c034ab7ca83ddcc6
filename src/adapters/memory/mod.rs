//! In-process store. Criteria are evaluated directly against entities, so
//! opaque predicates are supported here.

mod catalog;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use async_trait::async_trait;

use crate::entities::{Entity, EntityId};
use crate::repositories::{GenericRepository, RepositoryError};
use crate::specifications::{Include, Specification};

pub use catalog::{in_memory_catalog, InMemoryCatalog};

/// Attaches one relation to an entity that was just loaded.
pub type RelationLoader<T> = Arc<dyn Fn(&mut T) -> Result<(), RepositoryError> + Send + Sync>;

/// Map-backed store ordered by identity.
///
/// Intended for tests/dev. The lock is never held across an `.await`.
pub struct InMemoryRepository<T: Entity> {
    entities: RwLock<BTreeMap<EntityId, T>>,
    relations: HashMap<&'static str, RelationLoader<T>>,
    available: AtomicBool,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
            relations: HashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    pub fn from_entities(entities: impl IntoIterator<Item = T>) -> Self {
        let repo = Self::new();
        if let Ok(mut map) = repo.entities.write() {
            map.extend(entities.into_iter().map(|e| (e.id(), e)));
        }
        repo
    }

    /// Registers how `relation` is resolved when a specification includes it.
    pub fn with_relation(
        mut self,
        relation: &'static str,
        loader: impl Fn(&mut T) -> Result<(), RepositoryError> + Send + Sync + 'static,
    ) -> Self {
        self.relations.insert(relation, Arc::new(loader));
        self
    }

    /// Stores `entity`, replacing any previous one with the same identity.
    pub fn insert(&self, entity: T) -> Result<Option<T>, RepositoryError> {
        let mut map = self
            .entities
            .write()
            .map_err(|_| RepositoryError::StoreUnavailable("lock poisoned".to_string()))?;
        Ok(map.insert(entity.id(), entity))
    }

    /// Simulates the store going away (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Synchronous identity lookup, used by relation loaders of other stores.
    pub fn lookup(&self, id: EntityId) -> Result<Option<T>, RepositoryError> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<EntityId, T>>, RepositoryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(RepositoryError::StoreUnavailable(format!(
                "in-memory {} store is offline",
                T::KIND
            )));
        }
        self.entities
            .read()
            .map_err(|_| RepositoryError::StoreUnavailable("lock poisoned".to_string()))
    }

    fn matching(
        &self,
        spec: &dyn Specification<T>,
        limit: Option<usize>,
    ) -> Result<Vec<T>, RepositoryError> {
        let map = self.read()?;
        let mut found = Vec::new();
        for entity in map.values() {
            if limit.is_some_and(|limit| found.len() >= limit) {
                break;
            }
            let matches = match spec.criteria() {
                Some(criteria) => criteria.evaluate(entity)?,
                None => true,
            };
            if matches {
                found.push(entity.clone());
            }
        }
        Ok(found)
    }

    fn attach(&self, entity: &mut T, includes: &[Include]) -> Result<(), RepositoryError> {
        for include in includes {
            let loader = self.relations.get(include.relation()).ok_or_else(|| {
                RepositoryError::Unsupported(format!(
                    "{} has no relation `{}`",
                    T::KIND,
                    include.relation()
                ))
            })?;
            loader(entity)?;
        }
        Ok(())
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> GenericRepository<T> for InMemoryRepository<T> {
    async fn get_by_id(&self, id: EntityId) -> Result<Option<T>, RepositoryError> {
        let found = self.lookup(id)?;
        tracing::debug!(entity = T::KIND, id, found = found.is_some(), "get_by_id");
        Ok(found)
    }

    async fn list_all(&self) -> Result<Vec<T>, RepositoryError> {
        let all: Vec<T> = self.read()?.values().cloned().collect();
        tracing::debug!(entity = T::KIND, count = all.len(), "list_all");
        Ok(all)
    }

    async fn get_entity_with_spec(
        &self,
        spec: &dyn Specification<T>,
    ) -> Result<Option<T>, RepositoryError> {
        let mut found = self.matching(spec, Some(1))?.into_iter().next();
        if let Some(entity) = found.as_mut() {
            self.attach(entity, spec.includes())?;
        }
        tracing::debug!(
            entity = T::KIND,
            found = found.is_some(),
            "get_entity_with_spec"
        );
        Ok(found)
    }

    async fn list(&self, spec: &dyn Specification<T>) -> Result<Vec<T>, RepositoryError> {
        let mut found = self.matching(spec, None)?;
        for entity in found.iter_mut() {
            self.attach(entity, spec.includes())?;
        }
        tracing::debug!(entity = T::KIND, count = found.len(), "list");
        Ok(found)
    }
}
