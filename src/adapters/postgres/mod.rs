//! PostgreSQL store backed by diesel-async and a deadpool connection pool.
//!
//! Criteria are translated to SQL; opaque predicates are rejected with
//! [`RepositoryError::Unsupported`].

mod migrations;
pub mod models;
pub mod repositories;
pub mod schema;

use crate::repositories::RepositoryError;

pub use migrations::{apply_migrations, revert_migrations, run_migrations, MIGRATIONS};
pub use repositories::{
    ProductBrandsRepo, ProductTypesRepo, ProductsRepo, Session, SessionFactory,
};

impl From<diesel::result::Error> for RepositoryError {
    fn from(error: diesel::result::Error) -> Self {
        RepositoryError::StoreUnavailable(error.to_string())
    }
}
