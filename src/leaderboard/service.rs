use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::standing::Placement;
use crate::records::{LeaderboardEntry, Route, StyleRecord};
use crate::stats::PointsStanding;
use crate::storage::{StoreError, TimerStore};

/// Read-only ranking queries over the stored records.
#[derive(Clone)]
pub struct LeaderboardQuery {
    store: Arc<dyn TimerStore>,
    min_points_for_rank: i64,
}

impl LeaderboardQuery {
    pub fn new(store: Arc<dyn TimerStore>) -> Self {
        Self {
            store,
            min_points_for_rank: 0,
        }
    }

    pub fn with_min_points_for_rank(mut self, min_points: i64) -> Self {
        self.min_points_for_rank = min_points;
        self
    }

    /// Records ascending by ticks; ties go to the earlier time, then the lower player id.
    pub async fn sorted_records(
        &self,
        route: &Route,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.store.sorted_records(route, limit).await
    }

    /// Current #1 entry of the route
    pub async fn route_record(&self, route: &Route) -> Result<Option<LeaderboardEntry>, StoreError> {
        Ok(self.store.sorted_records(route, 1).await?.into_iter().next())
    }

    /// Stage records of the route, ordered like `sorted_records`
    pub async fn sorted_stage_records(
        &self,
        route: &Route,
        stage: u16,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.store.sorted_stage_records(route, stage, limit).await
    }

    pub async fn stage_record(
        &self,
        route: &Route,
        stage: u16,
    ) -> Result<Option<LeaderboardEntry>, StoreError> {
        Ok(self
            .store
            .sorted_stage_records(route, stage, 1)
            .await?
            .into_iter()
            .next())
    }

    /// 1 + records strictly faster than `ticks`. Equal times share a rank.
    pub async fn rank_of(&self, route: &Route, ticks: i64) -> Result<i64, StoreError> {
        Ok(self.store.count_faster(route, ticks).await? + 1)
    }

    /// Share of other players' records strictly slower than `ticks`, 1.0 when there are none.
    pub async fn percentile_of(
        &self,
        route: &Route,
        player_id: &str,
        ticks: i64,
    ) -> Result<f64, StoreError> {
        Ok(self.placement(route, player_id, ticks).await?.percentile)
    }

    /// Record count, rank, percentile and route best in one round trip
    #[instrument(skip(self), fields(route = %route))]
    pub async fn placement(
        &self,
        route: &Route,
        player_id: &str,
        ticks: i64,
    ) -> Result<Placement, StoreError> {
        let standing = self.store.route_standing(route, player_id, ticks).await?;
        let placement = Placement::from(standing);

        debug!(
            rank = placement.rank,
            record_count = placement.record_count,
            percentile = placement.percentile,
            "Placement captured"
        );
        Ok(placement)
    }

    /// Every record of a style, ordered by map, bonus, ticks and player id
    pub fn all_records_for_style(
        &self,
        style: u16,
        limit: Option<u32>,
    ) -> BoxStream<'_, Result<StyleRecord, StoreError>> {
        self.store.records_for_style(style, limit)
    }

    /// Points ranking, leaving out accounts below the configured minimum
    pub async fn top_points(&self, limit: u32) -> Result<Vec<PointsStanding>, StoreError> {
        self.store.top_points(limit, self.min_points_for_rank).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CompletionSubmission, RecordStore, StageSubmission};
    use crate::stats::StatsStore;
    use crate::storage::InMemoryStore;
    use futures::TryStreamExt;

    async fn seeded(route: &Route, times: &[(&str, i64)]) -> LeaderboardQuery {
        let store = Arc::new(InMemoryStore::new());
        for (index, (player, ticks)) in times.iter().enumerate() {
            store
                .submit_completion(&CompletionSubmission {
                    route: route.clone(),
                    player_id: player.to_string(),
                    player_name: player.to_string(),
                    ticks: *ticks,
                    timestamp: index as i64,
                })
                .await
                .unwrap();
        }
        LeaderboardQuery::new(store)
    }

    #[tokio::test]
    async fn test_rank_of_new_time() {
        let route = Route::main("kz_a");
        let query = seeded(&route, &[("a", 1000), ("b", 1200), ("c", 1500)]).await;

        assert_eq!(query.rank_of(&route, 1100).await.unwrap(), 2);
        assert_eq!(query.rank_of(&route, 900).await.unwrap(), 1);
        assert_eq!(query.rank_of(&route, 2000).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_tied_time_shares_existing_rank() {
        let route = Route::main("kz_a");
        let query = seeded(&route, &[("a", 1000), ("b", 1200), ("c", 1500)]).await;

        assert_eq!(query.rank_of(&route, 1200).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rank_on_empty_route_is_one() {
        let route = Route::main("empty");
        let query = seeded(&route, &[]).await;

        assert_eq!(query.rank_of(&route, 1).await.unwrap(), 1);
        assert_eq!(query.percentile_of(&route, "a", 1).await.unwrap(), 1.0);
        assert!(query.route_record(&route).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_percentile_excludes_own_record() {
        let route = Route::main("kz_a");
        let query = seeded(&route, &[("a", 1000), ("b", 1200), ("c", 1500), ("d", 1300)]).await;

        // d's stored 1300 is ignored; of a, b, c only b and c are slower than 1100
        let percentile = query.percentile_of(&route, "d", 1100).await.unwrap();

        assert!((percentile - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_sorted_records_and_route_record() {
        let route = Route::main("kz_a");
        let query = seeded(&route, &[("b", 1200), ("a", 1000), ("c", 1500)]).await;

        let records = query.sorted_records(&route, 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].player_id, "a");
        assert_eq!(records[1].player_id, "b");

        let best = query.route_record(&route).await.unwrap().unwrap();
        assert_eq!(best.ticks, 1000);
    }

    #[tokio::test]
    async fn test_stage_record_is_fastest_on_that_stage() {
        let store = Arc::new(InMemoryStore::new());
        let route = Route::main("surf_stages");
        for (stage, player, ticks) in [(1, "a", 300), (1, "b", 280), (2, "c", 50)] {
            store
                .submit_stage_completion(&StageSubmission {
                    route: route.clone(),
                    stage,
                    player_id: player.to_string(),
                    player_name: player.to_string(),
                    ticks,
                    aux_data: String::new(),
                    timestamp: 1,
                })
                .await
                .unwrap();
        }
        let query = LeaderboardQuery::new(store);

        let best = query.stage_record(&route, 1).await.unwrap().unwrap();
        assert_eq!(best.player_id, "b");
        assert_eq!(query.sorted_stage_records(&route, 1, 10).await.unwrap().len(), 2);
        assert!(query.stage_record(&route, 4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_records_for_style_streams_one_style() {
        let route = Route::new("kz_a", 0, 5);
        let query = seeded(&route, &[("a", 10), ("b", 20)]).await;

        let rows: Vec<StyleRecord> = query
            .all_records_for_style(5, None)
            .try_collect()
            .await
            .unwrap();
        let none: Vec<StyleRecord> = query
            .all_records_for_style(0, None)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_top_points_applies_minimum() {
        let store = Arc::new(InMemoryStore::new());
        store.add_points("a", "A", 50).await.unwrap();
        store.add_points("b", "B", 500).await.unwrap();
        let query = LeaderboardQuery::new(store).with_min_points_for_rank(100);

        let top = query.top_points(10).await.unwrap();

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].player_id, "b");
    }
}
