use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum RecomputeError {
    #[error("A recompute or reset is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Store(#[from] StoreError),
}
