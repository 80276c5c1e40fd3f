use std::sync::Arc;
use tokio::task::JoinHandle;

use timetrial::{
    records::Route, CompletionRequest, EventBus, EventDispatcher, FixedClock, PointsCalculator,
    RecomputeJob, ReplayMode, ScoringConfig, SubmissionService,
};

use super::mocks::{CollectingHandler, FlakyStore};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestHarness {
    pub store: Arc<FlakyStore>,
    pub event_bus: EventBus,
    pub clock: Arc<FixedClock>,
    pub service: Arc<SubmissionService>,
    pub recompute: Arc<RecomputeJob>,
    pub events: Arc<CollectingHandler>,
    pub _dispatcher_handle: JoinHandle<()>,
}

impl TestHarness {
    /// Gives the dispatcher time to deliver emitted events.
    pub async fn settle(&self) {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    pub async fn points_of(&self, player_id: &str) -> i64 {
        use timetrial::StatsStore;
        self.store
            .account(player_id)
            .await
            .unwrap()
            .map_or(0, |account| account.global_points)
    }
}

pub struct TestHarnessBuilder {
    scoring: ScoringConfig,
    replay_mode: ReplayMode,
    styles: Vec<u16>,
    store: Option<Arc<FlakyStore>>,
}

impl TestHarnessBuilder {
    pub fn new() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            replay_mode: ReplayMode::EveryImprovement,
            styles: vec![0],
            store: None,
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_replay_mode(mut self, replay_mode: ReplayMode) -> Self {
        self.replay_mode = replay_mode;
        self
    }

    pub fn with_styles(mut self, styles: Vec<u16>) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_store(mut self, store: Arc<FlakyStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> TestHarness {
        let store = self.store.unwrap_or_else(|| Arc::new(FlakyStore::new()));
        let event_bus = EventBus::new(256);
        let clock = Arc::new(FixedClock::new(1_700_000_000));
        let calculator = Arc::new(PointsCalculator::new(self.scoring));

        let events = CollectingHandler::new();
        let mut dispatcher = EventDispatcher::new(event_bus.clone());
        dispatcher.add_handler(events.clone());
        let dispatcher_handle = dispatcher.start_listening();

        let service = SubmissionService::builder(store.clone())
            .with_calculator(Arc::clone(&calculator))
            .with_event_bus(event_bus.clone())
            .with_clock(clock.clone())
            .with_replay_mode(self.replay_mode)
            .build();

        let recompute = RecomputeJob::new(store.clone(), calculator, event_bus.clone(), self.styles);

        TestHarness {
            store,
            event_bus,
            clock,
            service: Arc::new(service),
            recompute: Arc::new(recompute),
            events,
            _dispatcher_handle: dispatcher_handle,
        }
    }
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn completion(route: &Route, player_id: &str, ticks: i64) -> CompletionRequest {
    CompletionRequest {
        route: route.clone(),
        player_id: player_id.to_string(),
        player_name: format!("Player {}", player_id),
        ticks,
    }
}
