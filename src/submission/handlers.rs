use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::models::{CompletionReceipt, CompletionRequest, StageReceipt, StageRequest};
use crate::shared::{AppError, AppState};

/// POST /completions
///
/// Responds once the record is durable. Notifications follow asynchronously.
#[instrument(name = "submit_completion", skip(state, request))]
pub async fn submit_completion(
    State(state): State<AppState>,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<CompletionReceipt>, AppError> {
    let receipt = state.submissions.submit_completion(request).await?;

    info!(
        points_awarded = receipt.points_awarded,
        is_improvement = receipt.outcome.is_improvement,
        "Completion accepted"
    );

    Ok(Json(receipt))
}

/// POST /stages
#[instrument(name = "submit_stage", skip(state, request))]
pub async fn submit_stage(
    State(state): State<AppState>,
    Json(request): Json<StageRequest>,
) -> Result<Json<StageReceipt>, AppError> {
    let receipt = state.submissions.submit_stage(request).await?;
    Ok(Json(receipt))
}
