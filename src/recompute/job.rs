use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::errors::RecomputeError;
use crate::event::{EventBus, TimerEvent};
use crate::leaderboard::{standing_within, Placement};
use crate::points::{PointsCalculator, ScoringAttempt};
use crate::records::{Route, StyleRecord};
use crate::storage::TimerStore;

/// Last route group whose points were credited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub style: u16,
    pub map_name: String,
    pub bonus: u16,
}

impl Checkpoint {
    fn covers(&self, route: &Route) -> bool {
        match route.style.cmp(&self.style) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => {
                (route.map_name.as_str(), route.bonus) <= (self.map_name.as_str(), self.bonus)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecomputeOptions {
    /// Overrides the configured style set
    pub styles: Option<Vec<u16>>,
    /// Continue after this route group without resetting totals
    pub resume_from: Option<Checkpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeReport {
    pub run_id: Uuid,
    pub routes: u64,
    pub records: u64,
    /// Rows that could not be decoded
    pub skipped: u64,
    pub players_credited: u64,
    pub cancelled: bool,
    pub checkpoint: Option<Checkpoint>,
}

/// Rebuilds every player's point total from stored records.
///
/// Each record is worth its single-completion value times its completion count, capped
/// at the configured maximum. Running the job twice yields the same totals.
pub struct RecomputeJob {
    store: Arc<dyn TimerStore>,
    calculator: Arc<PointsCalculator>,
    event_bus: EventBus,
    styles: Vec<u16>,
    running: Mutex<()>,
    cancel_requested: Arc<AtomicBool>,
}

/// Points owed per player, gathered while a style's rows are streamed
#[derive(Default)]
struct PendingTotals {
    players: HashMap<String, (String, i64)>,
}

impl PendingTotals {
    fn credit(&mut self, player_id: &str, player_name: &str, points: i64) {
        let entry = self
            .players
            .entry(player_id.to_string())
            .or_insert_with(|| (player_name.to_string(), 0));
        if entry.0.is_empty() {
            entry.0 = player_name.to_string();
        }
        entry.1 = entry.1.saturating_add(points);
    }
}

impl RecomputeJob {
    pub fn new(
        store: Arc<dyn TimerStore>,
        calculator: Arc<PointsCalculator>,
        event_bus: EventBus,
        styles: Vec<u16>,
    ) -> Self {
        Self {
            store,
            calculator,
            event_bus,
            styles,
            running: Mutex::new(()),
            cancel_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn styles(&self) -> &[u16] {
        &self.styles
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Asks the current run to stop after its route group. False when nothing is running.
    pub fn request_cancel(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.cancel_requested.store(true, Ordering::SeqCst);
        true
    }

    /// Runs with the job's own cancel flag, the one `request_cancel` sets.
    pub async fn run_cancellable(
        &self,
        options: RecomputeOptions,
    ) -> Result<RecomputeReport, RecomputeError> {
        if self.is_running() {
            return Err(RecomputeError::AlreadyRunning);
        }
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.run(options, Arc::clone(&self.cancel_requested)).await
    }

    /// Runs `run_cancellable` on its own task.
    ///
    /// Dropping the returned handle detaches the run instead of stopping it, so a caller
    /// that goes away between the reset and the final credit cannot leave totals partial.
    pub fn spawn_cancellable(
        self: &Arc<Self>,
        options: RecomputeOptions,
    ) -> JoinHandle<Result<RecomputeReport, RecomputeError>> {
        let job = Arc::clone(self);
        tokio::spawn(async move { job.run_cancellable(options).await })
    }

    /// Zeroes every total. Idempotent.
    #[instrument(skip(self))]
    pub async fn reset_all_points(&self) -> Result<u64, RecomputeError> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| RecomputeError::AlreadyRunning)?;

        let reset = self.store.reset_all_points().await?;
        info!(accounts = reset, "Point totals reset");
        Ok(reset)
    }

    /// Runs the recompute. `cancel` is checked between route groups.
    #[instrument(skip(self, options, cancel))]
    pub async fn run(
        &self,
        options: RecomputeOptions,
        cancel: Arc<AtomicBool>,
    ) -> Result<RecomputeReport, RecomputeError> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| RecomputeError::AlreadyRunning)?;

        let run_id = Uuid::new_v4();
        let styles: BTreeSet<u16> = options
            .styles
            .unwrap_or_else(|| self.styles.clone())
            .into_iter()
            .collect();

        match &options.resume_from {
            Some(checkpoint) => info!(
                %run_id,
                style = checkpoint.style,
                map_name = %checkpoint.map_name,
                bonus = checkpoint.bonus,
                "Resuming recompute"
            ),
            None => {
                let reset = self.store.reset_all_points().await?;
                info!(%run_id, accounts = reset, styles = styles.len(), "Starting recompute");
            }
        }

        let mut report = RecomputeReport {
            run_id,
            routes: 0,
            records: 0,
            skipped: 0,
            players_credited: 0,
            cancelled: false,
            checkpoint: options.resume_from.clone(),
        };
        let mut credited = BTreeSet::new();

        for style in styles {
            if options
                .resume_from
                .as_ref()
                .is_some_and(|checkpoint| style < checkpoint.style)
            {
                continue;
            }

            let mut pending = PendingTotals::default();
            let outcome = self
                .score_style(style, options.resume_from.as_ref(), &cancel, &mut pending, &mut report)
                .await;

            // The style's read cursor is released before crediting; SQLite runs on a
            // single connection.
            self.flush(pending, &mut credited).await?;
            outcome?;

            if report.cancelled {
                break;
            }
        }

        report.players_credited = credited.len() as u64;

        info!(
            %run_id,
            routes = report.routes,
            records = report.records,
            skipped = report.skipped,
            players_credited = report.players_credited,
            cancelled = report.cancelled,
            "Recompute finished"
        );

        self.event_bus.emit(TimerEvent::RecomputeFinished {
            run_id,
            players_credited: report.players_credited,
            cancelled: report.cancelled,
        });

        Ok(report)
    }

    async fn score_style(
        &self,
        style: u16,
        resume_from: Option<&Checkpoint>,
        cancel: &AtomicBool,
        pending: &mut PendingTotals,
        report: &mut RecomputeReport,
    ) -> Result<(), RecomputeError> {
        let mut rows = self.store.records_for_style(style, None);
        let mut group: Vec<StyleRecord> = Vec::new();

        while let Some(item) = rows.next().await {
            let record = match item {
                Ok(record) => record,
                Err(e) if e.is_data_integrity() => {
                    warn!(style, error = %e, "Skipping unreadable record");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if resume_from.is_some_and(|checkpoint| checkpoint.covers(&record.route)) {
                continue;
            }

            let same_route = group.first().map_or(true, |first| {
                first.route.map_name == record.route.map_name && first.route.bonus == record.route.bonus
            });
            if !same_route {
                self.score_group(&group, pending, report);
                group.clear();

                if cancel.load(Ordering::SeqCst) {
                    report.cancelled = true;
                    return Ok(());
                }
            }
            group.push(record);
        }

        if !group.is_empty() {
            self.score_group(&group, pending, report);
            if cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
            }
        }

        Ok(())
    }

    fn score_group(&self, group: &[StyleRecord], pending: &mut PendingTotals, report: &mut RecomputeReport) {
        let Some(first) = group.first() else {
            return;
        };
        let route = &first.route;
        let cap = self.calculator.config().completion_cap();

        let mut sorted_ticks: Vec<i64> = group.iter().map(|r| r.ticks).collect();
        sorted_ticks.sort_unstable();

        for record in group {
            let placement = Placement::from(standing_within(&sorted_ticks, record.ticks));
            let single = self.calculator.calculate(&ScoringAttempt {
                route,
                ticks: record.ticks,
                is_improvement: true,
                completion_count: 0,
                placement: Some(&placement),
            });
            let multiplier = cap.map_or(record.completion_count, |cap| record.completion_count.min(cap));
            let points = i64::from(single).saturating_mul(multiplier.max(0));

            if points > 0 {
                pending.credit(&record.player_id, &record.player_name, points);
            }
        }

        debug!(route = %route, records = group.len(), "Route group scored");
        report.routes += 1;
        report.records += group.len() as u64;
        report.checkpoint = Some(Checkpoint {
            style: route.style,
            map_name: route.map_name.clone(),
            bonus: route.bonus,
        });
    }

    async fn flush(
        &self,
        pending: PendingTotals,
        credited: &mut BTreeSet<String>,
    ) -> Result<(), RecomputeError> {
        for (player_id, (player_name, points)) in pending.players {
            self.store.add_points(&player_id, &player_name, points).await?;
            credited.insert(player_id);
        }
        Ok(())
    }
}
