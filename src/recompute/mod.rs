pub mod errors;
pub mod handlers;
pub mod job;

pub use errors::RecomputeError;
pub use handlers::{cancel_recompute, reset_points, run_recompute};
pub use job::{Checkpoint, RecomputeJob, RecomputeOptions, RecomputeReport};
