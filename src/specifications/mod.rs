mod criteria;
mod products;

use crate::entities::Entity;

pub use criteria::{Criteria, Predicate};
pub use products::ProductsWithTypesAndBrands;

/// Comparison of a field against a value.
///
/// Ordering comparisons on text are not portable between stores: the
/// in-memory store compares by Unicode code point (`"Z" < "a"`), PostgreSQL
/// uses the collation of the column. Keep text criteria to `Equals` and
/// `NotEquals` when a specification must behave the same on both.
#[derive(Debug, Clone, PartialEq)]
pub enum CompType<T> {
    Equals(T),
    NotEquals(T),
    Gte(T),
    Lte(T),
    Lt(T),
    Gt(T),
}

impl<T> CompType<T> {
    pub fn value(&self) -> &T {
        match self {
            CompType::Equals(v)
            | CompType::NotEquals(v)
            | CompType::Gte(v)
            | CompType::Lte(v)
            | CompType::Lt(v)
            | CompType::Gt(v) => v,
        }
    }

    /// Converts the compared value while keeping the comparison kind.
    pub fn try_map<U, E>(&self, f: impl FnOnce(&T) -> Result<U, E>) -> Result<CompType<U>, E> {
        Ok(match self {
            CompType::Equals(v) => CompType::Equals(f(v)?),
            CompType::NotEquals(v) => CompType::NotEquals(f(v)?),
            CompType::Gte(v) => CompType::Gte(f(v)?),
            CompType::Lte(v) => CompType::Lte(f(v)?),
            CompType::Lt(v) => CompType::Lt(f(v)?),
            CompType::Gt(v) => CompType::Gt(f(v)?),
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompType::Equals(_) => "=",
            CompType::NotEquals(_) => "<>",
            CompType::Gte(_) => ">=",
            CompType::Lte(_) => "<=",
            CompType::Lt(_) => "<",
            CompType::Gt(_) => ">",
        }
    }
}

/// Eager-load directive: the name of a relation to attach to each loaded entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Include {
    relation: &'static str,
}

impl Include {
    pub fn new(relation: &'static str) -> Self {
        Self { relation }
    }

    pub fn relation(&self) -> &'static str {
        self.relation
    }
}

/// Filter criteria plus eager-load directives for entities of type `T`.
///
/// No criteria means "match everything". Includes are independent of each
/// other and only apply to specification-driven repository operations.
pub trait Specification<T: Entity>: Send + Sync {
    fn criteria(&self) -> Option<&Criteria<T>>;

    fn includes(&self) -> &[Include];
}

#[derive(Debug, Clone)]
pub struct BaseSpecification<T> {
    criteria: Option<Criteria<T>>,
    includes: Vec<Include>,
}

impl<T: Entity> BaseSpecification<T> {
    pub fn new() -> Self {
        Self {
            criteria: None,
            includes: Vec::new(),
        }
    }

    pub fn with_criteria(criteria: Criteria<T>) -> Self {
        Self {
            criteria: Some(criteria),
            includes: Vec::new(),
        }
    }

    pub fn include(mut self, relation: &'static str) -> Self {
        self.includes.push(Include::new(relation));
        self
    }
}

impl<T: Entity> Default for BaseSpecification<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Specification<T> for BaseSpecification<T> {
    fn criteria(&self) -> Option<&Criteria<T>> {
        self.criteria.as_ref()
    }

    fn includes(&self) -> &[Include] {
        &self.includes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FieldValue, ProductBrand};

    #[test]
    fn test_try_map_keeps_comparison() {
        let comp = CompType::Gte(FieldValue::Int(10));
        let mapped: Result<CompType<i64>, ()> = comp.try_map(|v| v.as_int().ok_or(()));
        assert_eq!(mapped, Ok(CompType::Gte(10)));
        assert_eq!(comp.symbol(), ">=");

        let failed: Result<CompType<String>, ()> =
            comp.try_map(|v| v.as_text().map(str::to_string).ok_or(()));
        assert_eq!(failed, Err(()));
    }

    #[test]
    fn test_base_specification_defaults_to_everything() {
        let spec = BaseSpecification::<ProductBrand>::default();
        assert!(spec.criteria().is_none());
        assert!(spec.includes().is_empty());
    }

    #[test]
    fn test_base_specification_keeps_includes_in_order() {
        let spec = BaseSpecification::<ProductBrand>::with_criteria(Criteria::eq("id", 1))
            .include("a")
            .include("b");
        assert!(spec.criteria().is_some());
        let relations: Vec<_> = spec.includes().iter().map(Include::relation).collect();
        assert_eq!(relations, vec!["a", "b"]);
    }
}
