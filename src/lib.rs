// Library crate for the time-trial records and points service
// This file exposes the public API for the binary and integration tests

pub mod clock;
pub mod config;
pub mod event;
pub mod leaderboard;
pub mod points;
pub mod recompute;
pub mod records;
pub mod routes;
pub mod shared;
pub mod stats;
pub mod storage;
pub mod submission;

// Re-export commonly used types for easier access in tests
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use event::{ChatNotifier, EventBus, EventDispatcher, EventError, EventHandler, TimerEvent};
pub use leaderboard::{LeaderboardQuery, Placement};
pub use points::{PointsCalculator, ScoringConfig, Style};
pub use recompute::{Checkpoint, RecomputeError, RecomputeJob, RecomputeOptions, RecomputeReport};
pub use records::{CompletionRecord, RecordStore, Route, SubmitOutcome};
pub use shared::{AppError, AppState};
pub use stats::{PlayerAccount, StatsStore};
pub use storage::{InMemoryStore, SqliteStore, StoreError, TimerStore};
pub use submission::{
    CompletionReceipt, CompletionRequest, ReplayMode, StageRequest, SubmissionError,
    SubmissionService,
};
