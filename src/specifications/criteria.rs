use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::CompType;
use crate::entities::{Entity, FieldValue};
use crate::repositories::RepositoryError;

/// Opaque in-process filter. Must be pure: stores may call it any number of times.
///
/// A predicate that cannot decide for some entity returns `Err(reason)`; the
/// store reports that as [`RepositoryError::PredicateEvaluation`].
pub struct Predicate<T>(Arc<dyn Fn(&T) -> Result<bool, String> + Send + Sync>);

impl<T: 'static> Predicate<T> {
    pub fn new(f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(move |entity: &T| Ok(f(entity))))
    }

    pub fn fallible(f: impl Fn(&T) -> Result<bool, String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl<T> Predicate<T> {
    pub fn test(&self, entity: &T) -> Result<bool, String> {
        (self.0)(entity)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Filter over entities of type `T`.
///
/// Everything except [`Criteria::Predicate`] is plain data, so a store may
/// translate it into its own query language instead of evaluating it.
pub enum Criteria<T> {
    Field {
        name: &'static str,
        comp: CompType<FieldValue>,
    },
    /// Conjunction. Empty matches everything.
    All(Vec<Criteria<T>>),
    /// Disjunction. Empty matches nothing.
    Any(Vec<Criteria<T>>),
    Not(Box<Criteria<T>>),
    Predicate(Predicate<T>),
}

impl<T> Clone for Criteria<T> {
    fn clone(&self) -> Self {
        match self {
            Criteria::Field { name, comp } => Criteria::Field {
                name: *name,
                comp: comp.clone(),
            },
            Criteria::All(items) => Criteria::All(items.clone()),
            Criteria::Any(items) => Criteria::Any(items.clone()),
            Criteria::Not(inner) => Criteria::Not(inner.clone()),
            Criteria::Predicate(p) => Criteria::Predicate(p.clone()),
        }
    }
}

impl<T> fmt::Debug for Criteria<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::Field { name, comp } => {
                write!(f, "{name} {} {}", comp.symbol(), comp.value())
            }
            Criteria::All(items) => f.debug_tuple("All").field(items).finish(),
            Criteria::Any(items) => f.debug_tuple("Any").field(items).finish(),
            Criteria::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Criteria::Predicate(p) => p.fmt(f),
        }
    }
}

impl<T> Criteria<T> {
    pub fn field(name: &'static str, comp: CompType<FieldValue>) -> Self {
        Criteria::Field { name, comp }
    }

    pub fn eq(name: &'static str, value: impl Into<FieldValue>) -> Self {
        Criteria::field(name, CompType::Equals(value.into()))
    }

    pub fn predicate(f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self
    where
        T: 'static,
    {
        Criteria::Predicate(Predicate::new(f))
    }

    /// Like [`Criteria::predicate`], for closures that can fail on some entities.
    pub fn try_predicate(f: impl Fn(&T) -> Result<bool, String> + Send + Sync + 'static) -> Self
    where
        T: 'static,
    {
        Criteria::Predicate(Predicate::fallible(f))
    }

    pub fn and(self, other: Criteria<T>) -> Self {
        match self {
            Criteria::All(mut items) => {
                items.push(other);
                Criteria::All(items)
            }
            this => Criteria::All(vec![this, other]),
        }
    }

    pub fn or(self, other: Criteria<T>) -> Self {
        match self {
            Criteria::Any(mut items) => {
                items.push(other);
                Criteria::Any(items)
            }
            this => Criteria::Any(vec![this, other]),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Criteria::Not(inner) => *inner,
            this => Criteria::Not(Box::new(this)),
        }
    }
}

impl<T: Entity> Criteria<T> {
    /// Evaluates the criteria against one entity.
    ///
    /// Unknown fields, comparisons between different value types and failing
    /// predicates are reported as [`RepositoryError::PredicateEvaluation`]
    /// naming the entity.
    pub fn evaluate(&self, entity: &T) -> Result<bool, RepositoryError> {
        match self {
            Criteria::Field { name, comp } => {
                let actual = entity.field(name).ok_or_else(|| {
                    RepositoryError::predicate(
                        Some(entity.id()),
                        format!("{} has no field `{name}`", T::KIND),
                    )
                })?;
                let expected = comp.value();
                let ordering = actual.compare(expected).ok_or_else(|| {
                    RepositoryError::predicate(
                        Some(entity.id()),
                        format!(
                            "cannot compare {} field `{name}` with {} value {expected}",
                            actual.type_name(),
                            expected.type_name()
                        ),
                    )
                })?;
                Ok(match comp {
                    CompType::Equals(_) => ordering == Ordering::Equal,
                    CompType::NotEquals(_) => ordering != Ordering::Equal,
                    CompType::Gte(_) => ordering != Ordering::Less,
                    CompType::Lte(_) => ordering != Ordering::Greater,
                    CompType::Lt(_) => ordering == Ordering::Less,
                    CompType::Gt(_) => ordering == Ordering::Greater,
                })
            }
            Criteria::All(items) => {
                for item in items {
                    if !item.evaluate(entity)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Criteria::Any(items) => {
                for item in items {
                    if item.evaluate(entity)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Criteria::Not(inner) => Ok(!inner.evaluate(entity)?),
            Criteria::Predicate(p) => p
                .test(entity)
                .map_err(|reason| RepositoryError::predicate(Some(entity.id()), reason)),
        }
    }
}
