use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::schema::{INDEXES, TABLES};
use super::{checked_count, checked_ticks, route_from_columns, Dialect, StoreError, TimerStore};
use crate::records::{
    format_ticks, CompletionRecord, CompletionSubmission, LeaderboardEntry, RecordStore, Route,
    RouteStanding, StageRecord, StageSubmission, StyleRecord, SubmitOutcome,
};
use crate::stats::{PlayerAccount, PlayerPreferences, PointsStanding, StatsStore};

const SELECT_COMPLETION_FOR_UPDATE: &str = "SELECT best_ticks, completion_count
    FROM completion_records
    WHERE map_name = $1 AND bonus = $2 AND style = $3 AND player_id = $4
    FOR UPDATE";

const INSERT_COMPLETION: &str = "INSERT INTO completion_records
    (map_name, bonus, style, player_id, player_name, best_ticks, formatted_time,
     best_timestamp, completion_count, last_completion_timestamp)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1, $8)
    ON CONFLICT (map_name, bonus, style, player_id) DO NOTHING";

const UPDATE_COMPLETION: &str = "UPDATE completion_records SET
    completion_count = completion_count + 1,
    last_completion_timestamp = $8,
    player_name = $5,
    formatted_time = CASE WHEN $6 < best_ticks THEN $7 ELSE formatted_time END,
    best_timestamp = CASE WHEN $6 < best_ticks THEN $8 ELSE best_timestamp END,
    best_ticks = LEAST(best_ticks, $6)
    WHERE map_name = $1 AND bonus = $2 AND style = $3 AND player_id = $4";

const SELECT_STAGE_FOR_UPDATE: &str = "SELECT best_ticks, completion_count
    FROM stage_records
    WHERE map_name = $1 AND bonus = $2 AND style = $3 AND stage = $4 AND player_id = $5
    FOR UPDATE";

const INSERT_STAGE: &str = "INSERT INTO stage_records
    (map_name, bonus, style, stage, player_id, player_name, best_ticks, formatted_time,
     aux_data, best_timestamp, completion_count, last_completion_timestamp)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1, $10)
    ON CONFLICT (map_name, bonus, style, stage, player_id) DO NOTHING";

const UPDATE_STAGE: &str = "UPDATE stage_records SET
    completion_count = completion_count + 1,
    last_completion_timestamp = $10,
    player_name = $6,
    formatted_time = CASE WHEN $7 < best_ticks THEN $8 ELSE formatted_time END,
    aux_data = CASE WHEN $7 < best_ticks THEN $9 ELSE aux_data END,
    best_timestamp = CASE WHEN $7 < best_ticks THEN $10 ELSE best_timestamp END,
    best_ticks = LEAST(best_ticks, $7)
    WHERE map_name = $1 AND bonus = $2 AND style = $3 AND stage = $4 AND player_id = $5";

const SELECT_COMPLETION: &str = "SELECT map_name, bonus, style, player_id, player_name,
    best_ticks, formatted_time, best_timestamp, completion_count, last_completion_timestamp
    FROM completion_records
    WHERE map_name = $1 AND bonus = $2 AND style = $3 AND player_id = $4";

const SELECT_STAGE: &str = "SELECT map_name, bonus, style, stage, player_id, player_name,
    best_ticks, formatted_time, aux_data, best_timestamp, completion_count,
    last_completion_timestamp
    FROM stage_records
    WHERE map_name = $1 AND bonus = $2 AND style = $3 AND stage = $4 AND player_id = $5";

const SELECT_SORTED: &str = "SELECT player_id, player_name, best_ticks, formatted_time
    FROM completion_records
    WHERE map_name = $1 AND bonus = $2 AND style = $3
    ORDER BY best_ticks, best_timestamp, player_id
    LIMIT $4";

const SELECT_SORTED_STAGE: &str = "SELECT player_id, player_name, best_ticks, formatted_time
    FROM stage_records
    WHERE map_name = $1 AND bonus = $2 AND style = $3 AND stage = $4
    ORDER BY best_ticks, best_timestamp, player_id
    LIMIT $5";

const COUNT_FASTER: &str = "SELECT COUNT(*) AS faster
    FROM completion_records
    WHERE map_name = $1 AND bonus = $2 AND style = $3 AND best_ticks < $4";

const ROUTE_STANDING: &str = "SELECT
    COUNT(*) AS total,
    COALESCE(SUM(CASE WHEN best_ticks < $5 THEN 1 ELSE 0 END), 0) AS faster,
    COALESCE(SUM(CASE WHEN player_id <> $4 THEN 1 ELSE 0 END), 0) AS others,
    COALESCE(SUM(CASE WHEN player_id <> $4 AND best_ticks > $5 THEN 1 ELSE 0 END), 0)
        AS slower_others,
    MIN(best_ticks) AS route_best
    FROM completion_records
    WHERE map_name = $1 AND bonus = $2 AND style = $3";

const SELECT_STYLE_RECORDS: &str = "SELECT map_name, bonus, style, player_id, player_name,
    best_ticks, completion_count
    FROM completion_records
    WHERE style = $1
    ORDER BY map_name COLLATE \"C\", bonus, best_ticks, player_id COLLATE \"C\"
    LIMIT $2";

const TOUCH_ACCOUNT: &str = "INSERT INTO player_accounts
    (player_id, player_name, times_connected, last_connected)
    VALUES ($1, $2, 1, $3)
    ON CONFLICT (player_id) DO UPDATE SET
        times_connected = player_accounts.times_connected + 1,
        last_connected = EXCLUDED.last_connected,
        player_name = CASE WHEN EXCLUDED.player_name = ''
            THEN player_accounts.player_name ELSE EXCLUDED.player_name END
    RETURNING player_id, player_name, global_points, times_connected,
        last_connected, hide_timer_hud, hide_keys, sounds_enabled, player_fov, hud_type, is_vip";

const ADD_POINTS: &str = "INSERT INTO player_accounts (player_id, player_name, global_points)
    VALUES ($1, $2, $3)
    ON CONFLICT (player_id) DO UPDATE SET
        global_points = player_accounts.global_points + EXCLUDED.global_points,
        player_name = CASE WHEN EXCLUDED.player_name = ''
            THEN player_accounts.player_name ELSE EXCLUDED.player_name END
    RETURNING global_points";

const SELECT_ACCOUNT: &str = "SELECT player_id, player_name, global_points, times_connected,
    last_connected, hide_timer_hud, hide_keys, sounds_enabled, player_fov, hud_type, is_vip
    FROM player_accounts
    WHERE player_id = $1";

const RESET_POINTS: &str = "UPDATE player_accounts SET global_points = 0";

const TOP_POINTS: &str = "SELECT player_id, player_name, global_points
    FROM player_accounts
    WHERE global_points >= $1
    ORDER BY global_points DESC, player_id
    LIMIT $2";

const UPDATE_PREFERENCES: &str = "UPDATE player_accounts SET
    hide_timer_hud = $2, hide_keys = $3, sounds_enabled = $4,
    player_fov = $5, hud_type = $6, is_vip = $7
    WHERE player_id = $1";

fn log_failure(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        warn!(error = %e, operation, "PostgreSQL operation failed");
        StoreError::from(e)
    }
}

fn route_from_row(row: &PgRow) -> Result<Route, StoreError> {
    let bonus: i32 = row.try_get("bonus")?;
    let style: i32 = row.try_get("style")?;
    route_from_columns(row.try_get("map_name")?, bonus.into(), style.into())
}

fn completion_from_row(row: &PgRow) -> Result<CompletionRecord, StoreError> {
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

fn stage_from_row(row: &PgRow) -> Result<StageRecord, StoreError> {
    let stage: i32 = row.try_get("stage")?;
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

fn entry_from_row(row: &PgRow) -> Result<LeaderboardEntry, StoreError> {
    Ok(LeaderboardEntry {
        player_id: row.try_get("player_id")?,
        player_name: row.try_get("player_name")?,
        ticks: row.try_get("best_ticks")?,
        formatted_time: row.try_get("formatted_time")?,
    })
}

fn style_record_from_row(row: &PgRow) -> Result<StyleRecord, StoreError> {
    Ok(StyleRecord {
        route: route_from_row(row)?,
        player_id: row.try_get("player_id")?,
        player_name: row.try_get("player_name")?,
        ticks: checked_ticks(row.try_get("best_ticks")?)?,
        completion_count: checked_count(row.try_get("completion_count")?)?,
    })
}

fn account_from_row(row: &PgRow) -> Result<PlayerAccount, StoreError> {
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

/// PostgreSQL implementation of the storage port
///
/// Best-time writes run in a transaction holding a row lock, so concurrent finishes on
/// the same key serialize on the database.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(log_failure("connect"))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    #[instrument(skip(self, submission), fields(route = %submission.route, player_id = %submission.player_id))]
    async fn submit_completion(
        &self,
        submission: &CompletionSubmission,
    ) -> Result<SubmitOutcome, StoreError> {
        let route = &submission.route;
        let mut tx = self.pool.begin().await.map_err(log_failure("begin"))?;

        let mut existing = sqlx::query(SELECT_COMPLETION_FOR_UPDATE)
            .bind(&route.map_name)
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
            .bind(&submission.player_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(log_failure("lock_completion"))?;

        if existing.is_none() {
            let inserted = sqlx::query(INSERT_COMPLETION)
                .bind(&route.map_name)
                .bind(i32::from(route.bonus))
                .bind(i32::from(route.style))
                .bind(&submission.player_id)
                .bind(&submission.player_name)
                .bind(submission.ticks)
                .bind(format_ticks(submission.ticks))
                .bind(submission.timestamp)
                .execute(&mut *tx)
                .await
                .map_err(log_failure("insert_completion"))?;

            if inserted.rows_affected() == 1 {
                tx.commit().await.map_err(log_failure("commit"))?;
                debug!("First completion stored in database");
                return Ok(SubmitOutcome::first(submission.ticks));
            }

            // Another writer inserted the row first; lock it and take the update path.
            existing = sqlx::query(SELECT_COMPLETION_FOR_UPDATE)
                .bind(&route.map_name)
                .bind(i32::from(route.bonus))
                .bind(i32::from(route.style))
                .bind(&submission.player_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(log_failure("lock_completion"))?;
        }

        let row = existing.ok_or_else(|| {
            StoreError::data_integrity("completion row vanished inside transaction")
        })?;
        let outcome = SubmitOutcome::repeat(
            row.try_get("best_ticks")?,
            row.try_get("completion_count")?,
            submission.ticks,
        );

        sqlx::query(UPDATE_COMPLETION)
            .bind(&route.map_name)
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
            .bind(&submission.player_id)
            .bind(&submission.player_name)
            .bind(submission.ticks)
            .bind(format_ticks(submission.ticks))
            .bind(submission.timestamp)
            .execute(&mut *tx)
            .await
            .map_err(log_failure("update_completion"))?;
        tx.commit().await.map_err(log_failure("commit"))?;

        debug!(
            is_improvement = outcome.is_improvement,
            completion_count = outcome.completion_count,
            "Completion stored in database"
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

        let mut existing = sqlx::query(SELECT_STAGE_FOR_UPDATE)
            .bind(&route.map_name)
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
            .bind(i32::from(submission.stage))
            .bind(&submission.player_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(log_failure("lock_stage"))?;

        if existing.is_none() {
            let inserted = sqlx::query(INSERT_STAGE)
                .bind(&route.map_name)
                .bind(i32::from(route.bonus))
                .bind(i32::from(route.style))
                .bind(i32::from(submission.stage))
                .bind(&submission.player_id)
                .bind(&submission.player_name)
                .bind(submission.ticks)
                .bind(format_ticks(submission.ticks))
                .bind(&submission.aux_data)
                .bind(submission.timestamp)
                .execute(&mut *tx)
                .await
                .map_err(log_failure("insert_stage"))?;

            if inserted.rows_affected() == 1 {
                tx.commit().await.map_err(log_failure("commit"))?;
                return Ok(SubmitOutcome::first(submission.ticks));
            }

            existing = sqlx::query(SELECT_STAGE_FOR_UPDATE)
                .bind(&route.map_name)
                .bind(i32::from(route.bonus))
                .bind(i32::from(route.style))
                .bind(i32::from(submission.stage))
                .bind(&submission.player_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(log_failure("lock_stage"))?;
        }

        let row = existing
            .ok_or_else(|| StoreError::data_integrity("stage row vanished inside transaction"))?;
        let outcome = SubmitOutcome::repeat(
            row.try_get("best_ticks")?,
            row.try_get("completion_count")?,
            submission.ticks,
        );

        sqlx::query(UPDATE_STAGE)
            .bind(&route.map_name)
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
            .bind(i32::from(submission.stage))
            .bind(&submission.player_id)
            .bind(&submission.player_name)
            .bind(submission.ticks)
            .bind(format_ticks(submission.ticks))
            .bind(&submission.aux_data)
            .bind(submission.timestamp)
            .execute(&mut *tx)
            .await
            .map_err(log_failure("update_stage"))?;
        tx.commit().await.map_err(log_failure("commit"))?;

        debug!(
            is_improvement = outcome.is_improvement,
            "Stage completion stored in database"
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

    #[instrument(skip(self), fields(route = %route))]
    async fn personal_best(
        &self,
        route: &Route,
        player_id: &str,
    ) -> Result<Option<CompletionRecord>, StoreError> {
        let row = sqlx::query(SELECT_COMPLETION)
            .bind(&route.map_name)
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
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
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
            .bind(i32::from(stage))
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
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
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
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
            .bind(i32::from(stage))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(log_failure("sorted_stage_records"))?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn count_faster(&self, route: &Route, ticks: i64) -> Result<i64, StoreError> {
        let row = sqlx::query(COUNT_FASTER)
            .bind(&route.map_name)
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
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
            .bind(i32::from(route.bonus))
            .bind(i32::from(route.style))
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
            .bind(i32::from(style))
            .bind(limit.map(i64::from).unwrap_or(i64::MAX))
            .fetch(&self.pool)
            .map(|row| style_record_from_row(&row?))
            .boxed()
    }
}

#[async_trait]
impl StatsStore for PostgresStore {
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
        debug!(global_points = total, "Points added in database");
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

        info!(accounts = result.rows_affected(), "Points reset in database");
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
impl TimerStore for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    #[instrument(skip(self))]
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for table in TABLES {
            sqlx::query(table.create_postgres)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::schema(e, table.name))?;

            for column in table.evolving {
                let sql = format!(
                    "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
                    table.name, column.name, column.postgres
                );
                sqlx::query(&sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::schema(e, table.name))?;
            }
            debug!(table = table.name, "Table ensured");
        }

        for index in INDEXES {
            sqlx::query(index)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::schema(e, "index"))?;
        }

        info!("PostgreSQL schema ready");
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
