use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::event::EventBus;
use crate::leaderboard::LeaderboardQuery;
use crate::points::PointsCalculator;
use crate::recompute::{RecomputeError, RecomputeJob};
use crate::storage::{StoreError, TimerStore};
use crate::submission::{SubmissionError, SubmissionService};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TimerStore>,
    pub leaderboard: LeaderboardQuery,
    pub submissions: Arc<SubmissionService>,
    pub recompute: Arc<RecomputeJob>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TimerStore>,
        config: &AppConfig,
        event_bus: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let calculator = Arc::new(PointsCalculator::new(config.scoring.clone()));

        let submissions = SubmissionService::builder(Arc::clone(&store))
            .with_calculator(Arc::clone(&calculator))
            .with_event_bus(event_bus.clone())
            .with_clock(Arc::clone(&clock))
            .with_replay_mode(config.replay)
            .build();

        let recompute = RecomputeJob::new(
            Arc::clone(&store),
            calculator,
            event_bus,
            config.recompute.styles.clone(),
        );

        Self {
            leaderboard: LeaderboardQuery::new(Arc::clone(&store))
                .with_min_points_for_rank(config.scoring.min_points_for_rank),
            submissions: Arc::new(submissions),
            recompute: Arc::new(recompute),
            store,
            clock,
        }
    }

    pub fn with_system_clock(store: Arc<dyn TimerStore>, config: &AppConfig, event_bus: EventBus) -> Self {
        Self::new(store, config, event_bus, Arc::new(SystemClock))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Storage unavailable: {}", msg),
            ),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Storage error at API edge");
        match err {
            StoreError::Connection(msg) => AppError::Unavailable(msg),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Validation(msg) => AppError::BadRequest(msg),
            SubmissionError::Store(err) => err.into(),
        }
    }
}

impl From<RecomputeError> for AppError {
    fn from(err: RecomputeError) -> Self {
        match err {
            RecomputeError::AlreadyRunning => AppError::Conflict(err.to_string()),
            RecomputeError::Store(err) => err.into(),
        }
    }
}
