use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use timetrial::{
    records::{
        CompletionRecord, CompletionSubmission, LeaderboardEntry, RecordStore, Route,
        RouteStanding, StageRecord, StageSubmission, StyleRecord, SubmitOutcome,
    },
    stats::{PlayerAccount, PlayerPreferences, PointsStanding, StatsStore},
    storage::{Dialect, InMemoryStore, StoreError, TimerStore},
    EventError, EventHandler, TimerEvent,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// In-memory store whose reads, writes or point updates can be made to fail or stall
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_standing: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    fail_points: Arc<AtomicBool>,
    points_delay_ms: Arc<AtomicU64>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn fail_standing(&self, fail: bool) {
        self.fail_standing.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_points(&self, fail: bool) {
        self.fail_points.store(fail, Ordering::SeqCst);
    }

    /// Holds every `add_points` call for `delay` before it applies.
    pub fn delay_points(&self, delay: Duration) {
        self.points_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Connection("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn submit_completion(
        &self,
        submission: &CompletionSubmission,
    ) -> Result<SubmitOutcome, StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.submit_completion(submission).await
    }

    async fn submit_stage_completion(
        &self,
        submission: &StageSubmission,
    ) -> Result<SubmitOutcome, StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.submit_stage_completion(submission).await
    }

    async fn completion_count(&self, route: &Route, player_id: &str) -> Result<i64, StoreError> {
        self.inner.completion_count(route, player_id).await
    }

    async fn personal_best(
        &self,
        route: &Route,
        player_id: &str,
    ) -> Result<Option<CompletionRecord>, StoreError> {
        self.inner.personal_best(route, player_id).await
    }

    async fn stage_best(
        &self,
        route: &Route,
        stage: u16,
        player_id: &str,
    ) -> Result<Option<StageRecord>, StoreError> {
        self.inner.stage_best(route, stage, player_id).await
    }

    async fn sorted_records(
        &self,
        route: &Route,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.inner.sorted_records(route, limit).await
    }

    async fn sorted_stage_records(
        &self,
        route: &Route,
        stage: u16,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.inner.sorted_stage_records(route, stage, limit).await
    }

    async fn count_faster(&self, route: &Route, ticks: i64) -> Result<i64, StoreError> {
        Self::check(&self.fail_standing)?;
        self.inner.count_faster(route, ticks).await
    }

    async fn route_standing(
        &self,
        route: &Route,
        player_id: &str,
        ticks: i64,
    ) -> Result<RouteStanding, StoreError> {
        Self::check(&self.fail_standing)?;
        self.inner.route_standing(route, player_id, ticks).await
    }

    fn records_for_style(
        &self,
        style: u16,
        limit: Option<u32>,
    ) -> BoxStream<'_, Result<StyleRecord, StoreError>> {
        self.inner.records_for_style(style, limit)
    }
}

#[async_trait]
impl StatsStore for FlakyStore {
    async fn touch_account(
        &self,
        player_id: &str,
        player_name: &str,
        connected_at: i64,
    ) -> Result<PlayerAccount, StoreError> {
        self.inner
            .touch_account(player_id, player_name, connected_at)
            .await
    }

    async fn add_points(
        &self,
        player_id: &str,
        player_name: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        Self::check(&self.fail_points)?;
        let delay = self.points_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.add_points(player_id, player_name, delta).await
    }

    async fn account(&self, player_id: &str) -> Result<Option<PlayerAccount>, StoreError> {
        self.inner.account(player_id).await
    }

    async fn reset_all_points(&self) -> Result<u64, StoreError> {
        self.inner.reset_all_points().await
    }

    async fn top_points(
        &self,
        limit: u32,
        min_points: i64,
    ) -> Result<Vec<PointsStanding>, StoreError> {
        self.inner.top_points(limit, min_points).await
    }

    async fn update_preferences(
        &self,
        player_id: &str,
        preferences: &PlayerPreferences,
    ) -> Result<bool, StoreError> {
        self.inner.update_preferences(player_id, preferences).await
    }
}

#[async_trait]
impl TimerStore for FlakyStore {
    fn dialect(&self) -> Dialect {
        Dialect::Memory
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)
    }
}

/// Event handler that keeps everything it receives
#[derive(Default)]
pub struct CollectingHandler {
    events: RwLock<Vec<TimerEvent>>,
}

impl CollectingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn events(&self) -> Vec<TimerEvent> {
        self.events.read().await.clone()
    }

    pub async fn event_types(&self) -> Vec<&'static str> {
        self.events
            .read()
            .await
            .iter()
            .map(|event| event.event_type())
            .collect()
    }
}

#[async_trait]
impl EventHandler for CollectingHandler {
    async fn handle(&self, event: &TimerEvent) -> Result<(), EventError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "CollectingHandler"
    }
}
