use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{Dialect, StoreError, TimerStore};
use crate::records::{
    format_ticks, CompletionRecord, CompletionSubmission, LeaderboardEntry, RecordStore, Route,
    RouteStanding, StageRecord, StageSubmission, StyleRecord, SubmitOutcome,
};
use crate::stats::{PlayerAccount, PlayerPreferences, PointsStanding, StatsStore};

#[derive(Default)]
struct MemoryState {
    completions: HashMap<(Route, String), CompletionRecord>,
    stages: HashMap<(Route, u16, String), StageRecord>,
    accounts: HashMap<String, PlayerAccount>,
}

/// In-memory implementation of the storage port for development and testing
///
/// Every write takes the state lock for its whole read-modify-write, which gives the
/// same per-key atomicity the SQL adapters get from transactions. Data is lost when
/// the process exits.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completion records across all routes
    pub async fn record_count(&self) -> usize {
        self.state.read().await.completions.len()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    #[instrument(skip(self, submission), fields(route = %submission.route, player_id = %submission.player_id))]
    async fn submit_completion(
        &self,
        submission: &CompletionSubmission,
    ) -> Result<SubmitOutcome, StoreError> {
        let mut state = self.state.write().await;
        let key = (submission.route.clone(), submission.player_id.clone());

        let outcome = match state.completions.get_mut(&key) {
            Some(record) => {
                let outcome = SubmitOutcome::repeat(
                    record.best_ticks,
                    record.completion_count,
                    submission.ticks,
                );
                if outcome.is_improvement {
                    record.best_ticks = submission.ticks;
                    record.formatted_time = format_ticks(submission.ticks);
                    record.best_timestamp = submission.timestamp;
                }
                record.completion_count = outcome.completion_count;
                record.last_completion_timestamp = submission.timestamp;
                record.player_name = submission.player_name.clone();
                outcome
            }
            None => {
                state.completions.insert(
                    key,
                    CompletionRecord {
                        route: submission.route.clone(),
                        player_id: submission.player_id.clone(),
                        player_name: submission.player_name.clone(),
                        best_ticks: submission.ticks,
                        formatted_time: format_ticks(submission.ticks),
                        best_timestamp: submission.timestamp,
                        completion_count: 1,
                        last_completion_timestamp: submission.timestamp,
                    },
                );
                SubmitOutcome::first(submission.ticks)
            }
        };

        debug!(
            is_improvement = outcome.is_improvement,
            completion_count = outcome.completion_count,
            "Completion stored in memory"
        );
        Ok(outcome)
    }

    #[instrument(skip(self, submission), fields(route = %submission.route, stage = submission.stage, player_id = %submission.player_id))]
    async fn submit_stage_completion(
        &self,
        submission: &StageSubmission,
    ) -> Result<SubmitOutcome, StoreError> {
        let mut state = self.state.write().await;
        let key = (
            submission.route.clone(),
            submission.stage,
            submission.player_id.clone(),
        );

        let outcome = match state.stages.get_mut(&key) {
            Some(record) => {
                let outcome = SubmitOutcome::repeat(
                    record.best_ticks,
                    record.completion_count,
                    submission.ticks,
                );
                if outcome.is_improvement {
                    record.best_ticks = submission.ticks;
                    record.formatted_time = format_ticks(submission.ticks);
                    record.aux_data = submission.aux_data.clone();
                    record.best_timestamp = submission.timestamp;
                }
                record.completion_count = outcome.completion_count;
                record.last_completion_timestamp = submission.timestamp;
                record.player_name = submission.player_name.clone();
                outcome
            }
            None => {
                state.stages.insert(
                    key,
                    StageRecord {
                        route: submission.route.clone(),
                        stage: submission.stage,
                        player_id: submission.player_id.clone(),
                        player_name: submission.player_name.clone(),
                        best_ticks: submission.ticks,
                        formatted_time: format_ticks(submission.ticks),
                        aux_data: submission.aux_data.clone(),
                        best_timestamp: submission.timestamp,
                        completion_count: 1,
                        last_completion_timestamp: submission.timestamp,
                    },
                );
                SubmitOutcome::first(submission.ticks)
            }
        };

        debug!(
            is_improvement = outcome.is_improvement,
            "Stage completion stored in memory"
        );
        Ok(outcome)
    }

    async fn completion_count(&self, route: &Route, player_id: &str) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .completions
            .get(&(route.clone(), player_id.to_string()))
            .map(|r| r.completion_count)
            .unwrap_or(0))
    }

    async fn personal_best(
        &self,
        route: &Route,
        player_id: &str,
    ) -> Result<Option<CompletionRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .completions
            .get(&(route.clone(), player_id.to_string()))
            .cloned())
    }

    async fn stage_best(
        &self,
        route: &Route,
        stage: u16,
        player_id: &str,
    ) -> Result<Option<StageRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .stages
            .get(&(route.clone(), stage, player_id.to_string()))
            .cloned())
    }

    #[instrument(skip(self), fields(route = %route))]
    async fn sorted_records(
        &self,
        route: &Route,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let state = self.state.read().await;
        let mut records: Vec<&CompletionRecord> = state
            .completions
            .values()
            .filter(|r| &r.route == route)
            .collect();
        records.sort_by(|a, b| {
            a.best_ticks
                .cmp(&b.best_ticks)
                .then(a.best_timestamp.cmp(&b.best_timestamp))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        Ok(records
            .into_iter()
            .take(limit as usize)
            .map(|r| LeaderboardEntry {
                player_id: r.player_id.clone(),
                player_name: r.player_name.clone(),
                ticks: r.best_ticks,
                formatted_time: r.formatted_time.clone(),
            })
            .collect())
    }

    #[instrument(skip(self), fields(route = %route))]
    async fn sorted_stage_records(
        &self,
        route: &Route,
        stage: u16,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let state = self.state.read().await;
        let mut records: Vec<&StageRecord> = state
            .stages
            .values()
            .filter(|r| &r.route == route && r.stage == stage)
            .collect();
        records.sort_by(|a, b| {
            a.best_ticks
                .cmp(&b.best_ticks)
                .then(a.best_timestamp.cmp(&b.best_timestamp))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        Ok(records
            .into_iter()
            .take(limit as usize)
            .map(|r| LeaderboardEntry {
                player_id: r.player_id.clone(),
                player_name: r.player_name.clone(),
                ticks: r.best_ticks,
                formatted_time: r.formatted_time.clone(),
            })
            .collect())
    }

    async fn count_faster(&self, route: &Route, ticks: i64) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .completions
            .values()
            .filter(|r| &r.route == route && r.best_ticks < ticks)
            .count() as i64)
    }

    async fn route_standing(
        &self,
        route: &Route,
        player_id: &str,
        ticks: i64,
    ) -> Result<RouteStanding, StoreError> {
        let state = self.state.read().await;
        let mut standing = RouteStanding::default();

        for record in state.completions.values().filter(|r| &r.route == route) {
            standing.total += 1;
            if record.best_ticks < ticks {
                standing.faster += 1;
            }
            if record.player_id != player_id {
                standing.others += 1;
                if record.best_ticks > ticks {
                    standing.slower_others += 1;
                }
            }
            standing.route_best = Some(
                standing
                    .route_best
                    .map_or(record.best_ticks, |best| best.min(record.best_ticks)),
            );
        }

        Ok(standing)
    }

    fn records_for_style(
        &self,
        style: u16,
        limit: Option<u32>,
    ) -> BoxStream<'_, Result<StyleRecord, StoreError>> {
        let state = Arc::clone(&self.state);

        stream::once(async move {
            let state = state.read().await;
            let mut rows: Vec<StyleRecord> = state
                .completions
                .values()
                .filter(|r| r.route.style == style)
                .map(|r| StyleRecord {
                    route: r.route.clone(),
                    player_id: r.player_id.clone(),
                    player_name: r.player_name.clone(),
                    ticks: r.best_ticks,
                    completion_count: r.completion_count,
                })
                .collect();
            rows.sort_by(|a, b| {
                a.route
                    .map_name
                    .cmp(&b.route.map_name)
                    .then(a.route.bonus.cmp(&b.route.bonus))
                    .then(a.ticks.cmp(&b.ticks))
                    .then_with(|| a.player_id.cmp(&b.player_id))
            });
            if let Some(limit) = limit {
                rows.truncate(limit as usize);
            }
            stream::iter(rows.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }
}

#[async_trait]
impl StatsStore for InMemoryStore {
    #[instrument(skip(self))]
    async fn touch_account(
        &self,
        player_id: &str,
        player_name: &str,
        connected_at: i64,
    ) -> Result<PlayerAccount, StoreError> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerAccount::new(player_id, player_name));

        if !player_name.is_empty() {
            account.player_name = player_name.to_string();
        }
        account.times_connected += 1;
        account.last_connected = connected_at;

        debug!(times_connected = account.times_connected, "Account touched in memory");
        Ok(account.clone())
    }

    #[instrument(skip(self))]
    async fn add_points(
        &self,
        player_id: &str,
        player_name: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerAccount::new(player_id, player_name));

        if !player_name.is_empty() {
            account.player_name = player_name.to_string();
        }
        account.global_points += delta;

        debug!(global_points = account.global_points, "Points added in memory");
        Ok(account.global_points)
    }

    async fn account(&self, player_id: &str) -> Result<Option<PlayerAccount>, StoreError> {
        Ok(self.state.read().await.accounts.get(player_id).cloned())
    }

    #[instrument(skip(self))]
    async fn reset_all_points(&self) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        for account in state.accounts.values_mut() {
            account.global_points = 0;
        }
        let touched = state.accounts.len() as u64;

        debug!(accounts = touched, "Points reset in memory");
        Ok(touched)
    }

    async fn top_points(
        &self,
        limit: u32,
        min_points: i64,
    ) -> Result<Vec<PointsStanding>, StoreError> {
        let state = self.state.read().await;
        let mut accounts: Vec<&PlayerAccount> = state
            .accounts
            .values()
            .filter(|a| a.global_points >= min_points)
            .collect();
        accounts.sort_by(|a, b| {
            b.global_points
                .cmp(&a.global_points)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        Ok(accounts
            .into_iter()
            .take(limit as usize)
            .enumerate()
            .map(|(index, a)| PointsStanding {
                position: index as u32 + 1,
                player_id: a.player_id.clone(),
                player_name: a.player_name.clone(),
                global_points: a.global_points,
            })
            .collect())
    }

    async fn update_preferences(
        &self,
        player_id: &str,
        preferences: &PlayerPreferences,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.accounts.get_mut(player_id) {
            Some(account) => {
                account.preferences = preferences.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TimerStore for InMemoryStore {
    fn dialect(&self) -> Dialect {
        Dialect::Memory
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
