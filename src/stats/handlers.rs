use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::models::{PlayerAccount, PlayerPreferences};
use crate::shared::{AppError, AppState};

/// GET /players/:player_id
#[instrument(name = "get_player", skip(state))]
pub async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerAccount>, AppError> {
    state
        .store
        .account(&player_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Player {} not found", player_id)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub player_name: String,
}

/// POST /players/:player_id/connect
///
/// Called when a player joins the server; creates the account on first visit.
#[instrument(name = "connect_player", skip(state, request))]
pub async fn connect_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<PlayerAccount>, AppError> {
    if player_id.trim().is_empty() {
        return Err(AppError::BadRequest("player id is empty".to_string()));
    }

    let account = state
        .store
        .touch_account(&player_id, &request.player_name, state.clock.now_unix())
        .await?;

    info!(
        player_id = %account.player_id,
        times_connected = account.times_connected,
        "Player connected"
    );

    Ok(Json(account))
}

/// PUT /players/:player_id/preferences
#[instrument(name = "update_preferences", skip(state, preferences))]
pub async fn update_preferences(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Json(preferences): Json<PlayerPreferences>,
) -> Result<StatusCode, AppError> {
    if state.store.update_preferences(&player_id, &preferences).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Player {} not found", player_id)))
    }
}
