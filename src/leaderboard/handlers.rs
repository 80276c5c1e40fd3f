use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::Placement;
use crate::records::{LeaderboardEntry, Route};
use crate::shared::{AppError, AppState};
use crate::stats::PointsStanding;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Without an explicit `bonus`, the path may carry a legacy `<map>_bonus<N>` key.
fn route_from_path(map_name: String, bonus: Option<u16>, style: u16) -> Route {
    match bonus {
        Some(bonus) => Route::new(map_name, bonus, style),
        None => Route::parse_legacy(&map_name, style),
    }
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub bonus: Option<u16>,
    #[serde(default)]
    pub style: u16,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub route: Route,
    pub records: Vec<LeaderboardEntry>,
}

/// GET /leaderboards/:map
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(map_name): Path<String>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let route = route_from_path(map_name, params.bonus, params.style);
    let records = state
        .leaderboard
        .sorted_records(&route, clamp_limit(params.limit))
        .await?;

    debug!(route = %route, count = records.len(), "Leaderboard read");
    Ok(Json(LeaderboardResponse { route, records }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StageLeaderboardResponse {
    pub route: Route,
    pub stage: u16,
    pub records: Vec<LeaderboardEntry>,
}

/// GET /leaderboards/:map/stages/:stage
#[instrument(name = "get_stage_leaderboard", skip(state))]
pub async fn get_stage_leaderboard(
    State(state): State<AppState>,
    Path((map_name, stage)): Path<(String, u16)>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<StageLeaderboardResponse>, AppError> {
    let route = route_from_path(map_name, params.bonus, params.style);
    let records = state
        .leaderboard
        .sorted_stage_records(&route, stage, clamp_limit(params.limit))
        .await?;

    debug!(route = %route, stage, count = records.len(), "Stage leaderboard read");
    Ok(Json(StageLeaderboardResponse {
        route,
        stage,
        records,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RankParams {
    pub bonus: Option<u16>,
    #[serde(default)]
    pub style: u16,
    pub ticks: i64,
    #[serde(default)]
    pub player_id: String,
}

/// GET /leaderboards/:map/rank
///
/// Where `ticks` would land on the route right now.
#[instrument(name = "get_rank", skip(state))]
pub async fn get_rank(
    State(state): State<AppState>,
    Path(map_name): Path<String>,
    Query(params): Query<RankParams>,
) -> Result<Json<Placement>, AppError> {
    if params.ticks <= 0 {
        return Err(AppError::BadRequest("ticks must be positive".to_string()));
    }

    let route = route_from_path(map_name, params.bonus, params.style);
    let placement = state
        .leaderboard
        .placement(&route, &params.player_id, params.ticks)
        .await?;

    Ok(Json(placement))
}

#[derive(Debug, Deserialize)]
pub struct TopPointsParams {
    pub limit: Option<u32>,
}

/// GET /points/top
#[instrument(name = "top_points", skip(state))]
pub async fn top_points(
    State(state): State<AppState>,
    Query(params): Query<TopPointsParams>,
) -> Result<Json<Vec<PointsStanding>>, AppError> {
    let standings = state.leaderboard.top_points(clamp_limit(params.limit)).await?;
    Ok(Json(standings))
}
