use async_trait::async_trait;
use futures::stream::BoxStream;

use super::models::{
    CompletionRecord, CompletionSubmission, LeaderboardEntry, Route, RouteStanding,
    StageRecord, StageSubmission, StyleRecord, SubmitOutcome,
};
use crate::storage::StoreError;

/// Persistence of best-time records per route, player and stage
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Improve-or-insert the player's best time and count the completion.
    ///
    /// Concurrent calls for the same key are serialized: the stored best ends at the
    /// minimum of all committed times and every call is counted.
    async fn submit_completion(
        &self,
        submission: &CompletionSubmission,
    ) -> Result<SubmitOutcome, StoreError>;

    /// Same contract as `submit_completion`, on the independent per-stage best line.
    async fn submit_stage_completion(
        &self,
        submission: &StageSubmission,
    ) -> Result<SubmitOutcome, StoreError>;

    /// Number of completions stored for the player on the route, 0 when absent
    async fn completion_count(&self, route: &Route, player_id: &str) -> Result<i64, StoreError>;

    async fn personal_best(
        &self,
        route: &Route,
        player_id: &str,
    ) -> Result<Option<CompletionRecord>, StoreError>;

    async fn stage_best(
        &self,
        route: &Route,
        stage: u16,
        player_id: &str,
    ) -> Result<Option<StageRecord>, StoreError>;

    /// Records ordered by ticks, then earlier best timestamp, then player id
    async fn sorted_records(
        &self,
        route: &Route,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError>;

    /// Stage records of one route, in the same order as `sorted_records`
    async fn sorted_stage_records(
        &self,
        route: &Route,
        stage: u16,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError>;

    /// Records strictly faster than `ticks`
    async fn count_faster(&self, route: &Route, ticks: i64) -> Result<i64, StoreError>;

    /// Route aggregates relative to `player_id` and `ticks`, read in one round trip
    async fn route_standing(
        &self,
        route: &Route,
        player_id: &str,
        ticks: i64,
    ) -> Result<RouteStanding, StoreError>;

    /// Every record of a style ordered by map, bonus, ticks and player id.
    ///
    /// Rows that fail to decode surface as `StoreError::DataIntegrity` items so the
    /// consumer can skip them.
    fn records_for_style(
        &self,
        style: u16,
        limit: Option<u32>,
    ) -> BoxStream<'_, Result<StyleRecord, StoreError>>;
}
