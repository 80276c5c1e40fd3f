use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::{
    errors::SubmissionError,
    models::{
        validate_run, CompletionReceipt, CompletionRequest, ReplayMode, StageReceipt,
        StageRequest,
    },
};
use crate::clock::{Clock, SystemClock};
use crate::event::{EventBus, TimerEvent};
use crate::leaderboard::{LeaderboardQuery, Placement};
use crate::points::{PointsCalculator, ScoringAttempt, ScoringConfig};
use crate::records::{CompletionSubmission, StageSubmission, SubmitOutcome};
use crate::storage::TimerStore;

/// Runs one completion through record storage, scoring and the player's total.
///
/// The record write is the only step that can fail a submission. Everything after it
/// degrades: a missing placement pays 0 points and a failed total update is logged.
pub struct SubmissionService {
    store: Arc<dyn TimerStore>,
    leaderboard: LeaderboardQuery,
    calculator: Arc<PointsCalculator>,
    event_bus: EventBus,
    clock: Arc<dyn Clock>,
    replay_mode: ReplayMode,
}

impl SubmissionService {
    pub fn builder(store: Arc<dyn TimerStore>) -> SubmissionServiceBuilder {
        SubmissionServiceBuilder::new(store)
    }

    pub fn calculator(&self) -> &Arc<PointsCalculator> {
        &self.calculator
    }

    pub fn replay_mode(&self) -> ReplayMode {
        self.replay_mode
    }

    #[instrument(
        skip(self, request),
        fields(route = %request.route, player_id = %request.player_id, ticks = request.ticks)
    )]
    pub async fn submit_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionReceipt, SubmissionError> {
        validate_run(&request.route, &request.player_id, request.ticks)?;

        let placement = match self
            .leaderboard
            .placement(&request.route, &request.player_id, request.ticks)
            .await
        {
            Ok(placement) => Some(placement),
            Err(e) => {
                warn!(error = %e, "Could not capture placement, completion will pay no points");
                None
            }
        };

        let submission = CompletionSubmission {
            route: request.route.clone(),
            player_id: request.player_id.clone(),
            player_name: request.player_name.clone(),
            ticks: request.ticks,
            timestamp: self.clock.now_unix(),
        };
        let outcome = self.store.submit_completion(&submission).await.map_err(|e| {
            error!(error = %e, "Completion was not saved");
            SubmissionError::from(e)
        })?;

        debug!(
            is_improvement = outcome.is_improvement,
            completion_count = outcome.completion_count,
            "Completion saved"
        );

        let (points_awarded, total_points) =
            self.award_points(&request, &outcome, placement.as_ref()).await;
        let replay_requested = self.wants_replay(&outcome, request.ticks, placement.as_ref());
        let rank = placement.map(|p| p.rank);

        self.event_bus.emit(TimerEvent::CompletionSaved {
            player_id: request.player_id.clone(),
            route: request.route.clone(),
            ticks: request.ticks,
            completion_count: outcome.completion_count,
        });
        if outcome.is_improvement {
            self.event_bus.emit(TimerEvent::RecordImproved {
                player_id: request.player_id.clone(),
                player_name: request.player_name.clone(),
                route: request.route.clone(),
                previous_best: outcome.previous_best,
                new_best: outcome.best_ticks,
                rank,
            });
        }
        if let (true, Some(new_total)) = (points_awarded > 0, total_points) {
            self.event_bus.emit(TimerEvent::PointsAwarded {
                player_id: request.player_id.clone(),
                player_name: request.player_name.clone(),
                delta: i64::from(points_awarded),
                new_total,
            });
        }
        if replay_requested {
            self.event_bus.emit(TimerEvent::ReplayRequested {
                player_id: request.player_id.clone(),
                route: request.route.clone(),
                ticks: request.ticks,
            });
        }

        info!(
            is_improvement = outcome.is_improvement,
            points_awarded,
            rank = ?rank,
            "Completion processed"
        );

        Ok(CompletionReceipt {
            outcome,
            rank,
            points_awarded,
            total_points,
            replay_requested,
        })
    }

    /// Stage runs keep their own best line and are never scored.
    #[instrument(
        skip(self, request),
        fields(route = %request.route, stage = request.stage, player_id = %request.player_id)
    )]
    pub async fn submit_stage(&self, request: StageRequest) -> Result<StageReceipt, SubmissionError> {
        validate_run(&request.route, &request.player_id, request.ticks)?;

        let submission = StageSubmission {
            route: request.route.clone(),
            stage: request.stage,
            player_id: request.player_id.clone(),
            player_name: request.player_name.clone(),
            ticks: request.ticks,
            aux_data: request.aux_data.clone(),
            timestamp: self.clock.now_unix(),
        };
        let outcome = self
            .store
            .submit_stage_completion(&submission)
            .await
            .map_err(|e| {
                error!(error = %e, "Stage completion was not saved");
                SubmissionError::from(e)
            })?;

        if outcome.is_improvement {
            self.event_bus.emit(TimerEvent::StageImproved {
                player_id: request.player_id,
                route: request.route,
                stage: request.stage,
                previous_best: outcome.previous_best,
                new_best: outcome.best_ticks,
            });
        }

        debug!(is_improvement = outcome.is_improvement, "Stage completion saved");
        Ok(StageReceipt {
            stage: request.stage,
            outcome,
        })
    }

    /// Spawns the submission and returns immediately; failures are only logged.
    pub fn submit_detached(self: &Arc<Self>, request: CompletionRequest) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let route = request.route.clone();
            let player_id = request.player_id.clone();
            if let Err(e) = service.submit_completion(request).await {
                error!(route = %route, player_id = %player_id, error = %e, "Detached submission failed");
            }
        })
    }

    async fn award_points(
        &self,
        request: &CompletionRequest,
        outcome: &SubmitOutcome,
        placement: Option<&Placement>,
    ) -> (u32, Option<i64>) {
        let scoring = self.calculator.is_enabled();
        let points = match placement {
            Some(placement) if scoring => self.calculator.calculate(&ScoringAttempt {
                route: &request.route,
                ticks: request.ticks,
                is_improvement: outcome.is_improvement,
                completion_count: outcome.completion_count,
                placement: Some(placement),
            }),
            _ => 0,
        };

        // Runs even for 0 points so the account exists after the first completion
        match self
            .store
            .add_points(&request.player_id, &request.player_name, i64::from(points))
            .await
        {
            Ok(total) => (points, scoring.then_some(total)),
            Err(e) => {
                warn!(error = %e, points, "Record saved but points were not credited");
                (0, None)
            }
        }
    }

    fn wants_replay(&self, outcome: &SubmitOutcome, ticks: i64, placement: Option<&Placement>) -> bool {
        if !outcome.is_improvement {
            return false;
        }
        match self.replay_mode {
            ReplayMode::EveryImprovement => true,
            ReplayMode::OnlyRouteRecord => placement.is_some_and(|p| p.beats_route_record(ticks)),
            ReplayMode::Disabled => false,
        }
    }
}

pub struct SubmissionServiceBuilder {
    store: Arc<dyn TimerStore>,
    calculator: Option<Arc<PointsCalculator>>,
    event_bus: Option<EventBus>,
    clock: Option<Arc<dyn Clock>>,
    replay_mode: ReplayMode,
    min_points_for_rank: i64,
}

impl SubmissionServiceBuilder {
    fn new(store: Arc<dyn TimerStore>) -> Self {
        Self {
            store,
            calculator: None,
            event_bus: None,
            clock: None,
            replay_mode: ReplayMode::default(),
            min_points_for_rank: 0,
        }
    }

    pub fn with_calculator(mut self, calculator: Arc<PointsCalculator>) -> Self {
        self.min_points_for_rank = calculator.config().min_points_for_rank;
        self.calculator = Some(calculator);
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_replay_mode(mut self, replay_mode: ReplayMode) -> Self {
        self.replay_mode = replay_mode;
        self
    }

    pub fn build(self) -> SubmissionService {
        let leaderboard = LeaderboardQuery::new(Arc::clone(&self.store))
            .with_min_points_for_rank(self.min_points_for_rank);

        SubmissionService {
            store: self.store,
            leaderboard,
            calculator: self
                .calculator
                .unwrap_or_else(|| Arc::new(PointsCalculator::new(ScoringConfig::default()))),
            event_bus: self.event_bus.unwrap_or_default(),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            replay_mode: self.replay_mode,
        }
    }
}
