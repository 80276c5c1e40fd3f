use serde::{Deserialize, Serialize};
use std::fmt;

const LEGACY_BONUS_MARKER: &str = "_bonus";

/// Identity of a scored path: map × bonus index × movement style.
///
/// `bonus == 0` is the main route and `style == 0` the default ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Route {
    pub map_name: String,
    #[serde(default)]
    pub bonus: u16,
    #[serde(default)]
    pub style: u16,
}

impl Route {
    pub fn new(map_name: impl Into<String>, bonus: u16, style: u16) -> Self {
        Self {
            map_name: map_name.into(),
            bonus,
            style,
        }
    }

    /// Main route with the default style
    pub fn main(map_name: impl Into<String>) -> Self {
        Self::new(map_name, 0, 0)
    }

    pub fn is_bonus(&self) -> bool {
        self.bonus != 0
    }

    pub fn is_default_style(&self) -> bool {
        self.style == 0
    }

    /// Main route ridden with the default style. Only these routes earn placement points.
    pub fn is_standard(&self) -> bool {
        !self.is_bonus() && self.is_default_style()
    }

    /// Splits a legacy `<map>_bonus<N>` key into map and bonus index.
    ///
    /// Keys without a numeric suffix are main routes.
    pub fn parse_legacy(key: &str, style: u16) -> Self {
        if let Some(index) = key.rfind(LEGACY_BONUS_MARKER) {
            let (map, suffix) = key.split_at(index);
            let digits = &suffix[LEGACY_BONUS_MARKER.len()..];
            if !map.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            {
                if let Ok(bonus) = digits.parse::<u16>() {
                    return Self::new(map, bonus, style);
                }
            }
        }

        Self::new(key, 0, style)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#b{}s{}", self.map_name, self.bonus, self.style)
    }
}

/// Best time of one player on one route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub route: Route,
    pub player_id: String,
    pub player_name: String,
    pub best_ticks: i64,
    pub formatted_time: String,
    pub best_timestamp: i64,
    pub completion_count: i64,
    pub last_completion_timestamp: i64,
}

/// Best time of one player on one stage of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub route: Route,
    pub stage: u16,
    pub player_id: String,
    pub player_name: String,
    pub best_ticks: i64,
    pub formatted_time: String,
    pub aux_data: String,
    pub best_timestamp: i64,
    pub completion_count: i64,
    pub last_completion_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSubmission {
    pub route: Route,
    pub player_id: String,
    pub player_name: String,
    pub ticks: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSubmission {
    pub route: Route,
    pub stage: u16,
    pub player_id: String,
    pub player_name: String,
    pub ticks: i64,
    pub aux_data: String,
    pub timestamp: i64,
}

/// Result of an improve-or-insert write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// True when this submission set a new best, including the first completion
    pub is_improvement: bool,
    pub previous_best: Option<i64>,
    pub best_ticks: i64,
    pub completion_count: i64,
}

impl SubmitOutcome {
    pub fn first(ticks: i64) -> Self {
        Self {
            is_improvement: true,
            previous_best: None,
            best_ticks: ticks,
            completion_count: 1,
        }
    }

    pub fn repeat(previous_best: i64, previous_count: i64, ticks: i64) -> Self {
        Self {
            is_improvement: ticks < previous_best,
            previous_best: Some(previous_best),
            best_ticks: previous_best.min(ticks),
            completion_count: previous_count + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: String,
    pub player_name: String,
    pub ticks: i64,
    pub formatted_time: String,
}

/// One row of the per-style export consumed by the recompute job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRecord {
    pub route: Route,
    pub player_id: String,
    pub player_name: String,
    pub ticks: i64,
    pub completion_count: i64,
}

/// Aggregate counts over a route relative to one player and one time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStanding {
    /// Records stored for the route, the player's own included
    pub total: i64,
    /// Records strictly faster than the queried time
    pub faster: i64,
    /// Records belonging to other players
    pub others: i64,
    /// Records of other players strictly slower than the queried time
    pub slower_others: i64,
    pub route_best: Option<i64>,
}
