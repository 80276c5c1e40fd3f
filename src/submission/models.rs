use serde::{Deserialize, Serialize};

use super::errors::SubmissionError;
use crate::records::{Route, SubmitOutcome, MAX_TICKS};

/// A finished run reported by the game server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    #[serde(flatten)]
    pub route: Route,
    pub player_id: String,
    #[serde(default)]
    pub player_name: String,
    pub ticks: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRequest {
    #[serde(flatten)]
    pub route: Route,
    pub stage: u16,
    pub player_id: String,
    #[serde(default)]
    pub player_name: String,
    pub ticks: i64,
    #[serde(default)]
    pub aux_data: String,
}

pub(crate) fn validate_run(route: &Route, player_id: &str, ticks: i64) -> Result<(), SubmissionError> {
    if route.map_name.trim().is_empty() {
        return Err(SubmissionError::Validation("map name is empty".to_string()));
    }
    if player_id.trim().is_empty() {
        return Err(SubmissionError::Validation("player id is empty".to_string()));
    }
    if ticks <= 0 {
        return Err(SubmissionError::Validation(format!(
            "ticks must be positive, got {}",
            ticks
        )));
    }
    if ticks > MAX_TICKS {
        return Err(SubmissionError::Validation(format!(
            "ticks must not exceed {}, got {}",
            MAX_TICKS, ticks
        )));
    }
    Ok(())
}

/// What a completion changed, returned once the record is durable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReceipt {
    #[serde(flatten)]
    pub outcome: SubmitOutcome,
    /// Rank the time took, absent when the leaderboard could not be read
    pub rank: Option<i64>,
    pub points_awarded: u32,
    /// Absent when scoring is disabled or the total could not be updated
    pub total_points: Option<i64>,
    pub replay_requested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReceipt {
    pub stage: u16,
    #[serde(flatten)]
    pub outcome: SubmitOutcome,
}

/// When the replay of an improving run is kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayMode {
    #[default]
    EveryImprovement,
    /// Only runs that take the route's #1 spot
    OnlyRouteRecord,
    Disabled,
}
