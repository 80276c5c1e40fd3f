use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::schema::{missing_columns, INDEXES, TABLES};
use super::{checked_count, checked_ticks, route_from_columns, Dialect, StoreError, TimerStore};
use crate::records::{
    format_ticks, CompletionRecord, CompletionSubmission, LeaderboardEntry, RecordStore, Route,
    RouteStanding, StageRecord, StageSubmission, StyleRecord, SubmitOutcome,
};
use crate::stats::{PlayerAccount, PlayerPreferences, PointsStanding, StatsStore};

const SELECT_COMPLETION_BEST: &str = "SELECT best_ticks, completion_count
    FROM completion_records
    WHERE map_name = ?1 AND bonus = ?2 AND style = ?3 AND player_id = ?4";

const UPSERT_COMPLETION: &str = "INSERT INTO completion_records
    (map_name, bonus, style, player_id, player_name, best_ticks, formatted_time,
     best_timestamp, completion_count, last_completion_timestamp)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?8)
    ON CONFLICT (map_name, bonus, style, player_id) DO UPDATE SET
        completion_count = completion_records.completion_count + 1,
        last_completion_timestamp = excluded.last_completion_timestamp,
        player_name = excluded.player_name,
        formatted_time = CASE WHEN excluded.best_ticks < completion_records.best_ticks
            THEN excluded.formatted_time ELSE completion_records.formatted_time END,
        best_timestamp = CASE WHEN excluded.best_ticks < completion_records.best_ticks
            THEN excluded.best_timestamp ELSE completion_records.best_timestamp END,
        best_ticks = MIN(completion_records.best_ticks, excluded.best_ticks)";

const SELECT_STAGE_BEST: &str = "SELECT best_ticks, completion_count
    FROM stage_records
    WHERE map_name = ?1 AND bonus = ?2 AND style = ?3 AND stage = ?4 AND player_id = ?5";

const UPSERT_STAGE: &str = "INSERT INTO stage_records
    (map_name, bonus, style, stage, player_id, player_name, best_ticks, formatted_time,
     aux_data, best_timestamp, completion_count, last_completion_timestamp)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?10)
    ON CONFLICT (map_name, bonus, style, stage, player_id) DO UPDATE SET
        completion_count = stage_records.completion_count + 1,
        last_completion_timestamp = excluded.last_completion_timestamp,
        player_name = excluded.player_name,
        formatted_time = CASE WHEN excluded.best_ticks < stage_records.best_ticks
            THEN excluded.formatted_time ELSE stage_records.formatted_time END,
        aux_data = CASE WHEN excluded.best_ticks < stage_records.best_ticks
            THEN excluded.aux_data ELSE stage_records.aux_data END,
        best_timestamp = CASE WHEN excluded.best_ticks < stage_records.best_ticks
            THEN excluded.best_timestamp ELSE stage_records.best_timestamp END,
        best_ticks = MIN(stage_records.best_ticks, excluded.best_ticks)";

const SELECT_COMPLETION: &str = "SELECT map_name, bonus, style, player_id, player_name,
    best_ticks, formatted_time, best_timestamp, completion_count, last_completion_timestamp
    FROM completion_records
    WHERE map_name = ?1 AND bonus = ?2 AND style = ?3 AND player_id = ?4";

const SELECT_STAGE: &str = "SELECT map_name, bonus, style, stage, player_id, player_name,
    best_ticks, formatted_time, aux_data, best_timestamp, completion_count,
    last_completion_timestamp
    FROM stage_records
    WHERE map_name = ?1 AND bonus = ?2 AND style = ?3 AND stage = ?4 AND player_id = ?5";

const SELECT_SORTED: &str = "SELECT player_id, player_name, best_ticks, formatted_time
    FROM completion_records
    WHERE map_name = ?1 AND bonus = ?2 AND style = ?3
    ORDER BY best_ticks, best_timestamp, player_id
    LIMIT ?4";

const SELECT_SORTED_STAGE: &str = "SELECT player_id, player_name, best_ticks, formatted_time
    FROM stage_records
    WHERE map_name = ?1 AND bonus = ?2 AND style = ?3 AND stage = ?4
    ORDER BY best_ticks, best_timestamp, player_id
    LIMIT ?5";

const COUNT_FASTER: &str = "SELECT COUNT(*) AS faster
    FROM completion_records
    WHERE map_name = ?1 AND bonus = ?2 AND style = ?3 AND best_ticks < ?4";

const ROUTE_STANDING: &str = "SELECT
    COUNT(*) AS total,
    COALESCE(SUM(CASE WHEN best_ticks < ?5 THEN 1 ELSE 0 END), 0) AS faster,
    COALESCE(SUM(CASE WHEN player_id <> ?4 THEN 1 ELSE 0 END), 0) AS others,
    COALESCE(SUM(CASE WHEN player_id <> ?4 AND best_ticks > ?5 THEN 1 ELSE 0 END), 0)
        AS slower_others,
    MIN(best_ticks) AS route_best
    FROM completion_records
    WHERE map_name = ?1 AND bonus = ?2 AND style = ?3";

const SELECT_STYLE_RECORDS: &str = "SELECT map_name, bonus, style, player_id, player_name,
    best_ticks, completion_count
    FROM completion_records
    WHERE style = ?1
    ORDER BY map_name, bonus, best_ticks, player_id
    LIMIT ?2";

const TOUCH_ACCOUNT: &str = "INSERT INTO player_accounts
    (player_id, player_name, times_connected, last_connected)
    VALUES (?1, ?2, 1, ?3)
    ON CONFLICT (player_id) DO UPDATE SET
        times_connected = player_accounts.times_connected + 1,
        last_connected = excluded.last_connected,
        player_name = CASE WHEN excluded.player_name = ''
            THEN player_accounts.player_name ELSE excluded.player_name END
    RETURNING player_id, player_name, global_points, times_connected,
        last_connected, hide_timer_hud, hide_keys, sounds_enabled, player_fov, hud_type, is_vip";

const ADD_POINTS: &str = "INSERT INTO player_accounts (player_id, player_name, global_points)
    VALUES (?1, ?2, ?3)
    ON CONFLICT (player_id) DO UPDATE SET
        global_points = player_accounts.global_points + excluded.global_points,
        player_name = CASE WHEN excluded.player_name = ''
            THEN player_accounts.player_name ELSE excluded.player_name END
    RETURNING global_points";

const SELECT_ACCOUNT: &str = "SELECT player_id, player_name, global_points, times_connected,
    last_connected, hide_timer_hud, hide_keys, sounds_enabled, player_fov, hud_type, is_vip
    FROM player_accounts
    WHERE player_id = ?1";

const RESET_POINTS: &str = "UPDATE player_accounts SET global_points = 0";

const TOP_POINTS: &str = "SELECT player_id, player_name, global_points
    FROM player_accounts
    WHERE global_points >= ?1
    ORDER BY global_points DESC, player_id
    LIMIT ?2";

const UPDATE_PREFERENCES: &str = "UPDATE player_accounts SET
    hide_timer_hud = ?2, hide_keys = ?3, sounds_enabled = ?4,
    player_fov = ?5, hud_type = ?6, is_vip = ?7
    WHERE player_id = ?1";

fn log_failure(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        warn!(error = %e, operation, "SQLite operation failed");
        StoreError::from(e)
    }
}

fn route_from_row(row: &SqliteRow) -> Result<Route, StoreError> {
    route_from_columns(
        row.try_get("map_name")?,
        row.try_get("bonus")?,
        row.try_get("style")?,
    )
}

fn completion_from_row(row: &SqliteRow) -> Result<CompletionRecord, StoreError> {
    Ok(CompletionRecord {
        route: route_from_row(row)?,
        player_id: row.try_get("player_id")?,
        player_name: row.try_get("player_name")?,
        best_ticks: checked_ticks(row.try_get("best_ticks")?)?,
        formatted_time: row.try_get("formatted_time")?,
        best_timestamp: row.try_get("best_timestamp")?,
        completion_count: row.try_get("completion_count")?,
        last_completion_timestamp: row.try_get("last_completion_timestamp")?,
    })
}

fn stage_from_row(row: &SqliteRow) -> Result<StageRecord, StoreError> {
    let stage: i64 = row.try_get("stage")?;
    Ok(StageRecord {
        route: route_from_row(row)?,
        stage: u16::try_from(stage)
            .map_err(|_| StoreError::data_integrity(format!("stage {} out of range", stage)))?,
        player_id: row.try_get("player_id")?,
        player_name: row.try_get("player_name")?,
        best_ticks: checked_ticks(row.try_get("best_ticks")?)?,
        formatted_time: row.try_get("formatted_time")?,
        aux_data: row.try_get("aux_data")?,
        best_timestamp: row.try_get("best_timestamp")?,
        completion_count: row.try_get("completion_count")?,
        last_completion_timestamp: row.try_get("last_completion_timestamp")?,
    })
}

fn entry_from_row(row: &SqliteRow) -> Result<LeaderboardEntry, StoreError> {
    Ok(LeaderboardEntry {
        player_id: row.try_get("player_id")?,
        player_name: row.try_get("player_name")?,
        ticks: row.try_get("best_ticks")?,
        formatted_time: row.try_get("formatted_time")?,
    })
}

fn style_record_from_row(row: &SqliteRow) -> Result<StyleRecord, StoreError> {
    Ok(StyleRecord {
        route: route_from_row(row)?,
        player_id: row.try_get("player_id")?,
        player_name: row.try_get("player_name")?,
        ticks: checked_ticks(row.try_get("best_ticks")?)?,
        completion_count: checked_count(row.try_get("completion_count")?)?,
    })
}

fn account_from_row(row: &SqliteRow) -> Result<PlayerAccount, StoreError> {
    Ok(PlayerAccount {
        player_id: row.try_get("player_id")?,
        player_name: row.try_get("player_name")?,
        global_points: row.try_get("global_points")?,
        times_connected: row.try_get("times_connected")?,
        last_connected: row.try_get("last_connected")?,
        preferences: PlayerPreferences {
            hide_timer_hud: row.try_get("hide_timer_hud")?,
            hide_keys: row.try_get("hide_keys")?,
            sounds_enabled: row.try_get("sounds_enabled")?,
            player_fov: row.try_get("player_fov")?,
            hud_type: row.try_get("hud_type")?,
            is_vip: row.try_get("is_vip")?,
        },
    })
}

/// SQLite implementation of the storage port
///
/// The pool holds a single connection, so transactions from concurrent tasks queue on
/// the pool instead of failing with "database is locked".
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `database_url`, e.g.
    /// `sqlite://records.db` or `sqlite::memory:`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let in_memory = database_url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(database_url)
            .map_err(log_failure("parse_url"))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        // An in-memory database lives only as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(log_failure("connect"))?;

        Ok(Self::new(pool))
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", table))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::schema(e, table))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    #[instrument(skip(self, submission), fields(route = %submission.route, player_id = %submission.player_id))]
    async fn submit_completion(
        &self,
        submission: &CompletionSubmission,
    ) -> Result<SubmitOutcome, StoreError> {
        let route = &submission.route;
        let mut tx = self.pool.begin().await.map_err(log_failure("begin"))?;

        let existing = sqlx::query(SELECT_COMPLETION_BEST)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(&submission.player_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(log_failure("read_completion"))?;

        let outcome = match existing {
            Some(row) => SubmitOutcome::repeat(
                row.try_get("best_ticks")?,
                row.try_get("completion_count")?,
                submission.ticks,
            ),
            None => SubmitOutcome::first(submission.ticks),
        };

        sqlx::query(UPSERT_COMPLETION)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(&submission.player_id)
            .bind(&submission.player_name)
            .bind(submission.ticks)
            .bind(format_ticks(submission.ticks))
            .bind(submission.timestamp)
            .execute(&mut *tx)
            .await
            .map_err(log_failure("upsert_completion"))?;
        tx.commit().await.map_err(log_failure("commit"))?;

        debug!(
            is_improvement = outcome.is_improvement,
            completion_count = outcome.completion_count,
            "Completion stored in SQLite"
        );
        Ok(outcome)
    }

    #[instrument(skip(self, submission), fields(route = %submission.route, stage = submission.stage, player_id = %submission.player_id))]
    async fn submit_stage_completion(
        &self,
        submission: &StageSubmission,
    ) -> Result<SubmitOutcome, StoreError> {
        let route = &submission.route;
        let mut tx = self.pool.begin().await.map_err(log_failure("begin"))?;

        let existing = sqlx::query(SELECT_STAGE_BEST)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(i64::from(submission.stage))
            .bind(&submission.player_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(log_failure("read_stage"))?;

        let outcome = match existing {
            Some(row) => SubmitOutcome::repeat(
                row.try_get("best_ticks")?,
                row.try_get("completion_count")?,
                submission.ticks,
            ),
            None => SubmitOutcome::first(submission.ticks),
        };

        sqlx::query(UPSERT_STAGE)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(i64::from(submission.stage))
            .bind(&submission.player_id)
            .bind(&submission.player_name)
            .bind(submission.ticks)
            .bind(format_ticks(submission.ticks))
            .bind(&submission.aux_data)
            .bind(submission.timestamp)
            .execute(&mut *tx)
            .await
            .map_err(log_failure("upsert_stage"))?;
        tx.commit().await.map_err(log_failure("commit"))?;

        debug!(
            is_improvement = outcome.is_improvement,
            "Stage completion stored in SQLite"
        );
        Ok(outcome)
    }

    async fn completion_count(&self, route: &Route, player_id: &str) -> Result<i64, StoreError> {
        Ok(self
            .personal_best(route, player_id)
            .await?
            .map(|r| r.completion_count)
            .unwrap_or(0))
    }

    async fn personal_best(
        &self,
        route: &Route,
        player_id: &str,
    ) -> Result<Option<CompletionRecord>, StoreError> {
        let row = sqlx::query(SELECT_COMPLETION)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_failure("personal_best"))?;

        row.as_ref().map(completion_from_row).transpose()
    }

    async fn stage_best(
        &self,
        route: &Route,
        stage: u16,
        player_id: &str,
    ) -> Result<Option<StageRecord>, StoreError> {
        let row = sqlx::query(SELECT_STAGE)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(i64::from(stage))
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_failure("stage_best"))?;

        row.as_ref().map(stage_from_row).transpose()
    }

    #[instrument(skip(self), fields(route = %route))]
    async fn sorted_records(
        &self,
        route: &Route,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows = sqlx::query(SELECT_SORTED)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(log_failure("sorted_records"))?;

        rows.iter().map(entry_from_row).collect()
    }

    #[instrument(skip(self), fields(route = %route))]
    async fn sorted_stage_records(
        &self,
        route: &Route,
        stage: u16,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows = sqlx::query(SELECT_SORTED_STAGE)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(i64::from(stage))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(log_failure("sorted_stage_records"))?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn count_faster(&self, route: &Route, ticks: i64) -> Result<i64, StoreError> {
        let row = sqlx::query(COUNT_FASTER)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(ticks)
            .fetch_one(&self.pool)
            .await
            .map_err(log_failure("count_faster"))?;

        Ok(row.try_get("faster")?)
    }

    #[instrument(skip(self), fields(route = %route))]
    async fn route_standing(
        &self,
        route: &Route,
        player_id: &str,
        ticks: i64,
    ) -> Result<RouteStanding, StoreError> {
        let row = sqlx::query(ROUTE_STANDING)
            .bind(&route.map_name)
            .bind(i64::from(route.bonus))
            .bind(i64::from(route.style))
            .bind(player_id)
            .bind(ticks)
            .fetch_one(&self.pool)
            .await
            .map_err(log_failure("route_standing"))?;

        Ok(RouteStanding {
            total: row.try_get("total")?,
            faster: row.try_get("faster")?,
            others: row.try_get("others")?,
            slower_others: row.try_get("slower_others")?,
            route_best: row.try_get("route_best")?,
        })
    }

    fn records_for_style(
        &self,
        style: u16,
        limit: Option<u32>,
    ) -> BoxStream<'_, Result<StyleRecord, StoreError>> {
        sqlx::query(SELECT_STYLE_RECORDS)
            .bind(i64::from(style))
            .bind(limit.map(i64::from).unwrap_or(-1))
            .fetch(&self.pool)
            .map(|row| style_record_from_row(&row?))
            .boxed()
    }
}

#[async_trait]
impl StatsStore for SqliteStore {
    #[instrument(skip(self))]
    async fn touch_account(
        &self,
        player_id: &str,
        player_name: &str,
        connected_at: i64,
    ) -> Result<PlayerAccount, StoreError> {
        let row = sqlx::query(TOUCH_ACCOUNT)
            .bind(player_id)
            .bind(player_name)
            .bind(connected_at)
            .fetch_one(&self.pool)
            .await
            .map_err(log_failure("touch_account"))?;

        account_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn add_points(
        &self,
        player_id: &str,
        player_name: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(ADD_POINTS)
            .bind(player_id)
            .bind(player_name)
            .bind(delta)
            .fetch_one(&self.pool)
            .await
            .map_err(log_failure("add_points"))?;

        let total: i64 = row.try_get("global_points")?;
        debug!(global_points = total, "Points added in SQLite");
        Ok(total)
    }

    async fn account(&self, player_id: &str) -> Result<Option<PlayerAccount>, StoreError> {
        let row = sqlx::query(SELECT_ACCOUNT)
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_failure("account"))?;

        row.as_ref().map(account_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn reset_all_points(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(RESET_POINTS)
            .execute(&self.pool)
            .await
            .map_err(log_failure("reset_all_points"))?;

        info!(accounts = result.rows_affected(), "Points reset in SQLite");
        Ok(result.rows_affected())
    }

    async fn top_points(
        &self,
        limit: u32,
        min_points: i64,
    ) -> Result<Vec<PointsStanding>, StoreError> {
        let rows = sqlx::query(TOP_POINTS)
            .bind(min_points)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(log_failure("top_points"))?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| -> Result<PointsStanding, StoreError> {
                Ok(PointsStanding {
                    position: index as u32 + 1,
                    player_id: row.try_get("player_id")?,
                    player_name: row.try_get("player_name")?,
                    global_points: row.try_get("global_points")?,
                })
            })
            .collect()
    }

    async fn update_preferences(
        &self,
        player_id: &str,
        preferences: &PlayerPreferences,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(UPDATE_PREFERENCES)
            .bind(player_id)
            .bind(preferences.hide_timer_hud)
            .bind(preferences.hide_keys)
            .bind(preferences.sounds_enabled)
            .bind(preferences.player_fov)
            .bind(preferences.hud_type)
            .bind(preferences.is_vip)
            .execute(&self.pool)
            .await
            .map_err(log_failure("update_preferences"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TimerStore for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    #[instrument(skip(self))]
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for table in TABLES {
            sqlx::query(table.create_sqlite)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::schema(e, table.name))?;

            let existing = self.table_columns(table.name).await?;
            for column in missing_columns(table, &existing) {
                info!(table = table.name, column = column.name, "Adding missing column");
                let sql = format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    table.name, column.name, column.sqlite
                );
                sqlx::query(&sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::schema(e, table.name))?;
            }
        }

        for index in INDEXES {
            sqlx::query(index)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::schema(e, "index"))?;
        }

        info!("SQLite schema ready");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(log_failure("health_check"))?;
        Ok(())
    }
}
