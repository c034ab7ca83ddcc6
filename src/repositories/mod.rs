mod error;
mod repo_trait;

pub use error::RepositoryError;
pub use repo_trait::GenericRepository;
