// A session is one pooled connection, borrowed for the length of one
// repository call. Only this adapter may reach the raw connection: the
// accessor lives on `SessionInternal`, which is private to `repositories`.
// Sessions never open transactions, every operation here is a plain read.

use std::future::Future;
use std::time::Duration;

use diesel::result::QueryResult;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

use super::SessionInternal;
use crate::config::{ConfigError, DatabaseSettings};
use crate::repositories::RepositoryError;

#[derive(Clone)]
pub struct SessionFactory {
    conn_pool: Pool<AsyncPgConnection>,
    timeout: Duration,
}

impl SessionFactory {
    pub fn new(conn_pool: Pool<AsyncPgConnection>, timeout: Duration) -> Self {
        Self { conn_pool, timeout }
    }

    pub fn from_settings(settings: &DatabaseSettings) -> Result<Self, ConfigError> {
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(settings.url.clone());
        let pool = Pool::builder(config)
            .max_size(settings.max_connections)
            .build()
            .map_err(|e| ConfigError::Pool(e.to_string()))?;
        Ok(Self::new(pool, settings.query_timeout))
    }

    /// Borrows a connection from the pool, waiting at most the configured timeout.
    pub async fn open(&self) -> Result<Session, RepositoryError> {
        let conn = tokio::time::timeout(self.timeout, self.conn_pool.get())
            .await
            .map_err(|_| {
                RepositoryError::StoreUnavailable(format!(
                    "no connection available within {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| RepositoryError::StoreUnavailable(e.to_string()))?;
        Ok(Session::new(conn, self.timeout))
    }
}

pub struct Session {
    conn: Object<AsyncPgConnection>,
    timeout: Duration,
}

impl Session {
    fn new(conn: Object<AsyncPgConnection>, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl SessionInternal for Session {
    fn get_conn(&mut self) -> &mut AsyncPgConnection {
        &mut self.conn
    }
}

/// Runs one query, failing with `StoreUnavailable` once `timeout` elapses.
pub(super) async fn bounded<T>(
    timeout: Duration,
    query: impl Future<Output = QueryResult<T>>,
) -> Result<T, RepositoryError> {
    tokio::time::timeout(timeout, query)
        .await
        .map_err(|_| {
            RepositoryError::StoreUnavailable(format!("query did not finish within {timeout:?}"))
        })?
        .map_err(RepositoryError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        };
        let err = bounded(Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, RepositoryError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_bounded_maps_query_errors() {
        let failed = async { Err::<i32, _>(diesel::result::Error::BrokenTransactionManager) };
        let err = bounded(Duration::from_secs(1), failed).await.unwrap_err();
        assert!(matches!(err, RepositoryError::StoreUnavailable(_)));

        let ok = async { Ok(3) };
        assert_eq!(bounded(Duration::from_secs(1), ok).await, Ok(3));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        let mut settings = DatabaseSettings::new("postgres://nobody@127.0.0.1:1/none");
        settings.query_timeout = Duration::from_secs(2);
        let sessions = SessionFactory::from_settings(&settings).unwrap();
        assert!(matches!(
            sessions.open().await,
            Err(RepositoryError::StoreUnavailable(_))
        ));
    }
}
