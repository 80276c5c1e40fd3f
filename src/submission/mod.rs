pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;

pub use errors::SubmissionError;
pub use handlers::{submit_completion, submit_stage};
pub use models::{CompletionReceipt, CompletionRequest, ReplayMode, StageReceipt, StageRequest};
pub use service::{SubmissionService, SubmissionServiceBuilder};
