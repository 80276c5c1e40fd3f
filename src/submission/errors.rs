use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Invalid submission: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
