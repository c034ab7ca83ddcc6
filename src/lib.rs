//! Generic repository and specification pattern for read-only data access.
//!
//! A caller describes what it wants with a [`Specification`] (criteria plus
//! eager-load includes) and hands it to a [`GenericRepository`], which resolves
//! it against a store. Two stores ship with the crate: an in-process one in
//! [`adapters::memory`] and a PostgreSQL one in [`adapters::postgres`].

pub mod adapters;
pub mod config;
pub mod entities;
pub mod repositories;
pub mod specifications;
pub mod telemetry;

pub use entities::{Entity, EntityId, FieldValue};
pub use repositories::{GenericRepository, RepositoryError};
pub use specifications::{BaseSpecification, CompType, Criteria, Include, Specification};
