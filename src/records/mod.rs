pub mod models;
pub mod repository;
pub mod time;

pub use models::{
    CompletionRecord, CompletionSubmission, LeaderboardEntry, Route, RouteStanding,
    StageRecord, StageSubmission, StyleRecord, SubmitOutcome,
};
pub use repository::RecordStore;
pub use time::{format_ticks, MAX_TICKS, TICK_RATE};
