use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use super::job::{RecomputeOptions, RecomputeReport};
use crate::shared::{AppError, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub accounts_reset: u64,
}

/// POST /admin/points/reset
#[instrument(name = "reset_points", skip(state))]
pub async fn reset_points(State(state): State<AppState>) -> Result<Json<ResetResponse>, AppError> {
    let accounts_reset = state.recompute.reset_all_points().await?;
    Ok(Json(ResetResponse { accounts_reset }))
}

/// POST /admin/recompute
///
/// Body is optional; without one every configured style is rebuilt from scratch. The run
/// lives on its own task and finishes even if the client disconnects first.
#[instrument(name = "run_recompute", skip(state, options))]
pub async fn run_recompute(
    State(state): State<AppState>,
    options: Option<Json<RecomputeOptions>>,
) -> Result<Json<RecomputeReport>, AppError> {
    let options = options.map(|Json(options)| options).unwrap_or_default();
    let report = state
        .recompute
        .spawn_cancellable(options)
        .await
        .map_err(|e| {
            error!(error = %e, "Recompute task failed");
            AppError::Internal
        })??;

    info!(run_id = %report.run_id, cancelled = report.cancelled, "Recompute request served");
    Ok(Json(report))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub cancelling: bool,
}

/// POST /admin/recompute/cancel
pub async fn cancel_recompute(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelling: state.recompute.request_cancel(),
    })
}
