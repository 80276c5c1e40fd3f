use thiserror::Error;

const PG_UNDEFINED_TABLE: &str = "42P01";
const PG_UNDEFINED_COLUMN: &str = "42703";

#[derive(Debug, Error)]
pub enum StoreError {
    /// Store unreachable or the pool gave up waiting
    #[error("Connection error: {0}")]
    Connection(String),

    /// A table or column the query expects is missing
    #[error("Schema error: {0}")]
    Schema(String),

    /// A stored row could not be read back
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Query error: {0}")]
    Query(String),
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }

    pub fn is_data_integrity(&self) -> bool {
        matches!(self, StoreError::DataIntegrity(_))
    }

    pub fn data_integrity(msg: impl Into<String>) -> Self {
        StoreError::DataIntegrity(msg.into())
    }

    /// Classifies a failure raised while creating or migrating `table`.
    pub(crate) fn schema(err: sqlx::Error, table: &str) -> Self {
        match StoreError::from(err) {
            StoreError::Connection(msg) => StoreError::Connection(msg),
            other => StoreError::Schema(format!("{}: {}", table, other)),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => StoreError::Connection(err.to_string()),
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => StoreError::DataIntegrity(err.to_string()),
            sqlx::Error::Database(db) => {
                let code = db.code();
                let message = db.message();
                let missing_relation = matches!(
                    code.as_deref(),
                    Some(PG_UNDEFINED_TABLE) | Some(PG_UNDEFINED_COLUMN)
                ) || message.contains("no such table")
                    || message.contains("no such column");

                if missing_relation {
                    StoreError::Schema(message.to_string())
                } else {
                    StoreError::Query(message.to_string())
                }
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}
