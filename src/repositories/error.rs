use thiserror::Error;

use crate::entities::EntityId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    /// The backing store could not be reached, timed out or failed the query.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Criteria could not be evaluated. `entity_id` is `None` when the failure is
    /// found before any entity is looked at.
    #[error("{}", describe_predicate_failure(.entity_id, .reason))]
    PredicateEvaluation {
        entity_id: Option<EntityId>,
        reason: String,
    },

    /// The store cannot honour part of a specification.
    #[error("unsupported specification: {0}")]
    Unsupported(String),
}

impl RepositoryError {
    pub fn predicate(entity_id: Option<EntityId>, reason: impl Into<String>) -> Self {
        RepositoryError::PredicateEvaluation {
            entity_id,
            reason: reason.into(),
        }
    }
}

fn describe_predicate_failure(entity_id: &Option<EntityId>, reason: &str) -> String {
    match entity_id {
        Some(id) => format!("cannot evaluate criteria against entity {id}: {reason}"),
        None => format!("cannot evaluate criteria: {reason}"),
    }
}
