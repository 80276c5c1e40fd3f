mod errors;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod sqlite;

pub use errors::StoreError;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::records::{RecordStore, Route};
use crate::stats::StatsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
    Memory,
}

/// One storage port covering records and accounts, implemented per backend.
#[async_trait]
pub trait TimerStore: RecordStore + StatsStore {
    fn dialect(&self) -> Dialect;

    /// Creates missing tables and adds missing evolving columns. Safe to run repeatedly.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Opens the backend named by `database_url`.
///
/// `postgres://` and `postgresql://` select PostgreSQL, `sqlite:` selects SQLite and
/// `memory` keeps everything in process.
pub async fn connect(database_url: &str) -> Result<Arc<dyn TimerStore>, StoreError> {
    if database_url == "memory" {
        info!("Using in-memory store");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        let store = PostgresStore::connect(database_url).await?;
        info!("Connected to PostgreSQL store");
        return Ok(Arc::new(store));
    }

    if database_url.starts_with("sqlite:") {
        let store = SqliteStore::connect(database_url).await?;
        info!("Connected to SQLite store");
        return Ok(Arc::new(store));
    }

    Err(StoreError::Connection(
        "unsupported database url scheme".to_string(),
    ))
}

/// Rebuilds a route from stored integer columns, rejecting out-of-range values.
pub(crate) fn route_from_columns(
    map_name: String,
    bonus: i64,
    style: i64,
) -> Result<Route, StoreError> {
    let bonus = u16::try_from(bonus)
        .map_err(|_| StoreError::data_integrity(format!("bonus index {} out of range", bonus)))?;
    let style = u16::try_from(style)
        .map_err(|_| StoreError::data_integrity(format!("style id {} out of range", style)))?;
    Ok(Route::new(map_name, bonus, style))
}

/// Stored best times must be positive.
pub(crate) fn checked_ticks(ticks: i64) -> Result<i64, StoreError> {
    if ticks > 0 {
        Ok(ticks)
    } else {
        Err(StoreError::data_integrity(format!(
            "stored ticks {} are not positive",
            ticks
        )))
    }
}

/// Highest completion count a stored record may carry
pub const MAX_COMPLETION_COUNT: i64 = i32::MAX as i64;

/// Stored completion counts are at least 1 and fit a 32-bit counter.
pub(crate) fn checked_count(count: i64) -> Result<i64, StoreError> {
    if (1..=MAX_COMPLETION_COUNT).contains(&count) {
        Ok(count)
    } else {
        Err(StoreError::data_integrity(format!(
            "stored completion count {} is out of range",
            count
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_memory() {
        let store = connect("memory").await.unwrap();
        assert_eq!(store.dialect(), Dialect::Memory);
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_sqlite_memory() {
        let store = connect("sqlite::memory:").await.unwrap();
        assert_eq!(store.dialect(), Dialect::Sqlite);
        store.ensure_schema().await.unwrap();
    }

    #[test]
    fn test_route_from_columns_rejects_negative_bonus() {
        assert!(route_from_columns("m".to_string(), -1, 0)
            .unwrap_err()
            .is_data_integrity());
        assert_eq!(
            route_from_columns("m".to_string(), 2, 3).unwrap(),
            Route::new("m", 2, 3)
        );
    }

    #[test]
    fn test_checked_ticks() {
        assert!(checked_ticks(0).is_err());
        assert_eq!(checked_ticks(5).unwrap(), 5);
    }

    #[test]
    fn test_checked_count() {
        assert!(checked_count(0).unwrap_err().is_data_integrity());
        assert!(checked_count(9_223_372_036_854_775_000).is_err());
        assert_eq!(checked_count(MAX_COMPLETION_COUNT).unwrap(), MAX_COMPLETION_COUNT);
        assert_eq!(checked_count(3).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let err = connect("mysql://localhost/db").await.err().unwrap();
        assert!(err.is_connection());
    }
}
