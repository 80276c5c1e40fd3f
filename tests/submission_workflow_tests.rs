mod utils;

use std::sync::Arc;
use timetrial::{
    points::curves::top10_curve, records::Route, RecordStore, ReplayMode, ScoringConfig,
    SubmissionError, TimerEvent,
};
use utils::{completion, TestHarnessBuilder};

#[tokio::test]
async fn test_first_completion_on_empty_route() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_beginner");

    let receipt = harness
        .service
        .submit_completion(completion(&route, "a", 1000))
        .await
        .unwrap();

    let config = ScoringConfig::default();
    let expected = config.baseline + top10_curve(100.0, 1, &config.top10_fractions);
    assert!(receipt.outcome.is_improvement);
    assert_eq!(receipt.outcome.completion_count, 1);
    assert_eq!(receipt.rank, Some(1));
    assert_eq!(receipt.points_awarded, expected.round() as u32);
    assert_eq!(harness.points_of("a").await, i64::from(receipt.points_awarded));
}

#[tokio::test]
async fn test_new_player_slots_into_existing_leaderboard() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_beginner");
    for (player, ticks) in [("a", 1000), ("b", 1200), ("c", 1500)] {
        harness
            .service
            .submit_completion(completion(&route, player, ticks))
            .await
            .unwrap();
    }

    let receipt = harness
        .service
        .submit_completion(completion(&route, "d", 1100))
        .await
        .unwrap();

    assert_eq!(receipt.rank, Some(2));
    assert!(receipt.outcome.is_improvement);
    assert_eq!(receipt.outcome.previous_best, None);
    // 25 + 0.8 of the 100 ceiling
    assert_eq!(receipt.points_awarded, 105);
}

#[tokio::test]
async fn test_capped_repeats_pay_nothing_until_improved() {
    let scoring = ScoringConfig {
        max_completions: 5,
        ..ScoringConfig::default()
    };
    let harness = TestHarnessBuilder::new().with_scoring(scoring).build();
    let route = Route::main("kz_climb");

    for _ in 0..6 {
        harness
            .service
            .submit_completion(completion(&route, "a", 1000))
            .await
            .unwrap();
    }
    let total_before = harness.points_of("a").await;

    let repeat = harness
        .service
        .submit_completion(completion(&route, "a", 1050))
        .await
        .unwrap();
    assert!(!repeat.outcome.is_improvement);
    assert_eq!(repeat.points_awarded, 0);
    assert_eq!(harness.points_of("a").await, total_before);

    let improved = harness
        .service
        .submit_completion(completion(&route, "a", 950))
        .await
        .unwrap();
    assert!(improved.outcome.is_improvement);
    assert_eq!(improved.points_awarded, 125);
    assert_eq!(improved.outcome.completion_count, 8);
}

#[tokio::test]
async fn test_concurrent_submissions_keep_minimum() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_race");

    let first = harness.service.submit_detached(completion(&route, "a", 900));
    let second = harness.service.submit_detached(completion(&route, "a", 850));
    first.await.unwrap();
    second.await.unwrap();

    let record = harness
        .store
        .personal_best(&route, "a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.best_ticks, 850);
    assert_eq!(record.completion_count, 2);
}

#[tokio::test]
async fn test_many_concurrent_writers_on_one_key() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_race");

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let service = Arc::clone(&harness.service);
            let request = completion(&route, "a", 2000 - i * 10);
            tokio::spawn(async move { service.submit_completion(request).await })
        })
        .collect();
    let mut improvements = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().outcome.is_improvement {
            improvements += 1;
        }
    }

    let record = harness
        .store
        .personal_best(&route, "a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.best_ticks, 1810);
    assert_eq!(record.completion_count, 20);
    assert!(improvements >= 1);
}

#[tokio::test]
async fn test_placement_failure_saves_record_with_zero_points() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_a");
    harness.store.fail_standing(true);

    let receipt = harness
        .service
        .submit_completion(completion(&route, "a", 1000))
        .await
        .unwrap();

    assert_eq!(receipt.points_awarded, 0);
    assert_eq!(receipt.rank, None);
    assert_eq!(harness.store.completion_count(&route, "a").await.unwrap(), 1);
}

#[tokio::test]
async fn test_points_failure_keeps_the_record() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_a");
    harness.store.fail_points(true);

    let receipt = harness
        .service
        .submit_completion(completion(&route, "a", 1000))
        .await
        .unwrap();

    assert_eq!(receipt.points_awarded, 0);
    assert_eq!(receipt.total_points, None);
    assert!(receipt.outcome.is_improvement);
}

#[tokio::test]
async fn test_write_failure_aborts_without_events() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_a");
    harness.store.fail_writes(true);

    let err = harness
        .service
        .submit_completion(completion(&route, "a", 1000))
        .await
        .unwrap_err();
    harness.settle().await;

    assert!(matches!(err, SubmissionError::Store(e) if e.is_connection()));
    assert!(harness.events.events().await.is_empty());
    assert_eq!(harness.points_of("a").await, 0);
}

#[tokio::test]
async fn test_oversized_ticks_are_rejected_before_the_write() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_a");

    let service = Arc::clone(&harness.service);
    let request = completion(&route, "a", i64::MAX / 100);
    let err = tokio::spawn(async move { service.submit_completion(request).await })
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, SubmissionError::Validation(_)));
    assert!(harness
        .store
        .personal_best(&route, "a")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_events_reach_handlers_after_commit() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_a");

    harness
        .service
        .submit_completion(completion(&route, "a", 1000))
        .await
        .unwrap();
    harness.settle().await;

    let events = harness.events.events().await;
    assert_eq!(events.len(), 4);
    assert!(events.iter().any(|event| matches!(
        event,
        TimerEvent::RecordImproved { previous_best: None, new_best: 1000, rank: Some(1), .. }
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        TimerEvent::PointsAwarded { delta: 125, new_total: 125, .. }
    )));
}

#[tokio::test]
async fn test_replay_disabled_emits_no_request() {
    let harness = TestHarnessBuilder::new()
        .with_replay_mode(ReplayMode::Disabled)
        .build();
    let route = Route::main("surf_a");

    let receipt = harness
        .service
        .submit_completion(completion(&route, "a", 1000))
        .await
        .unwrap();
    harness.settle().await;

    assert!(!receipt.replay_requested);
    assert!(!harness
        .events
        .event_types()
        .await
        .contains(&"ReplayRequested"));
}

#[tokio::test]
async fn test_bonus_and_style_routes_pay_fixed_amounts() {
    let harness = TestHarnessBuilder::new().build();

    let bonus = harness
        .service
        .submit_completion(completion(&Route::new("surf_a", 1, 0), "a", 500))
        .await
        .unwrap();
    let styled = harness
        .service
        .submit_completion(completion(&Route::new("surf_a", 0, 2), "a", 800))
        .await
        .unwrap();
    let styled_bonus = harness
        .service
        .submit_completion(completion(&Route::new("surf_a", 1, 2), "a", 600))
        .await
        .unwrap();

    assert_eq!(bonus.points_awarded, 25);
    assert_eq!(styled.points_awarded, 33);
    assert_eq!(styled_bonus.points_awarded, 0);
    assert_eq!(harness.points_of("a").await, 58);
}

#[tokio::test]
async fn test_stage_runs_are_not_scored() {
    let harness = TestHarnessBuilder::new().build();
    let route = Route::main("surf_stages");

    let receipt = harness
        .service
        .submit_stage(timetrial::StageRequest {
            route: route.clone(),
            stage: 1,
            player_id: "a".to_string(),
            player_name: "A".to_string(),
            ticks: 300,
            aux_data: "900".to_string(),
        })
        .await
        .unwrap();

    assert!(receipt.outcome.is_improvement);
    assert_eq!(harness.points_of("a").await, 0);
    let stage = harness
        .store
        .stage_best(&route, 1, "a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stage.aux_data, "900");
    assert_eq!(stage.best_timestamp, 1_700_000_000);
}
