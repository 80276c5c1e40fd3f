pub mod handlers;
pub mod service;
pub mod standing;

pub use service::LeaderboardQuery;
pub use standing::{percentile, standing_within, Placement};
