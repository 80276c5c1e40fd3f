use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::Route;

/// Facts published after a write has committed.
///
/// Consumers (chat notifications, replay capture) receive them asynchronously; a slow
/// or failing consumer never affects the write that produced the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimerEvent {
    /// A completion was stored, improving or not
    CompletionSaved {
        player_id: String,
        route: Route,
        ticks: i64,
        completion_count: i64,
    },

    /// A completion set a new personal best
    RecordImproved {
        player_id: String,
        player_name: String,
        route: Route,
        previous_best: Option<i64>,
        new_best: i64,
        rank: Option<i64>,
    },

    /// Points were credited to a player's total
    PointsAwarded {
        player_id: String,
        player_name: String,
        delta: i64,
        new_total: i64,
    },

    /// The replay of this run should be kept
    ReplayRequested {
        player_id: String,
        route: Route,
        ticks: i64,
    },

    /// A stage completion set a new personal best on that stage
    StageImproved {
        player_id: String,
        route: Route,
        stage: u16,
        previous_best: Option<i64>,
        new_best: i64,
    },

    /// A recompute run finished or was cancelled
    RecomputeFinished {
        run_id: Uuid,
        players_credited: u64,
        cancelled: bool,
    },
}

impl TimerEvent {
    pub fn player_id(&self) -> Option<&str> {
        match self {
            TimerEvent::CompletionSaved { player_id, .. }
            | TimerEvent::RecordImproved { player_id, .. }
            | TimerEvent::PointsAwarded { player_id, .. }
            | TimerEvent::ReplayRequested { player_id, .. }
            | TimerEvent::StageImproved { player_id, .. } => Some(player_id),
            TimerEvent::RecomputeFinished { .. } => None,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            TimerEvent::CompletionSaved { .. } => "CompletionSaved",
            TimerEvent::RecordImproved { .. } => "RecordImproved",
            TimerEvent::PointsAwarded { .. } => "PointsAwarded",
            TimerEvent::ReplayRequested { .. } => "ReplayRequested",
            TimerEvent::StageImproved { .. } => "StageImproved",
            TimerEvent::RecomputeFinished { .. } => "RecomputeFinished",
        }
    }
}
