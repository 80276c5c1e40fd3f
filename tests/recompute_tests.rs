mod utils;

use axum::{body::Body, http::Request};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use timetrial::{
    records::Route, routes, AppConfig, AppState, Checkpoint, RecomputeError, RecomputeOptions,
    ScoringConfig, StatsStore, TimerEvent,
};
use tower::ServiceExt;
use utils::{completion, TestHarness, TestHarnessBuilder};

async fn submit_all(harness: &TestHarness, runs: &[(Route, &str, i64)]) {
    for (route, player, ticks) in runs {
        harness
            .service
            .submit_completion(completion(route, player, *ticks))
            .await
            .unwrap();
    }
}

fn not_cancelled() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let harness = TestHarnessBuilder::new().with_styles(vec![0, 2]).build();
    let main = Route::main("surf_a");
    submit_all(
        &harness,
        &[
            (main.clone(), "a", 1000),
            (main.clone(), "b", 1200),
            (main.clone(), "a", 1100),
            (Route::new("surf_a", 1, 0), "b", 400),
            (Route::new("surf_a", 0, 2), "c", 900),
        ],
    )
    .await;

    harness
        .recompute
        .run(RecomputeOptions::default(), not_cancelled())
        .await
        .unwrap();
    let first: Vec<i64> = futures_points(&harness, &["a", "b", "c"]).await;

    harness
        .recompute
        .run(RecomputeOptions::default(), not_cancelled())
        .await
        .unwrap();
    let second: Vec<i64> = futures_points(&harness, &["a", "b", "c"]).await;

    assert_eq!(first, second);
    // a: (25 + 100) x 2; b: (25 + 80) + 25; c: 25 x 1.3
    assert_eq!(first, vec![250, 130, 33]);
}

async fn futures_points(harness: &TestHarness, players: &[&str]) -> Vec<i64> {
    let mut totals = Vec::new();
    for player in players {
        totals.push(harness.points_of(player).await);
    }
    totals
}

#[tokio::test]
async fn test_recompute_discards_drifted_totals() {
    let harness = TestHarnessBuilder::new().build();
    submit_all(&harness, &[(Route::main("m"), "a", 1000)]).await;
    harness.store.add_points("a", "", 5000).await.unwrap();
    harness.store.add_points("ghost", "Ghost", 70).await.unwrap();

    let report = harness
        .recompute
        .run(RecomputeOptions::default(), not_cancelled())
        .await
        .unwrap();

    assert_eq!(harness.points_of("a").await, 125);
    assert_eq!(harness.points_of("ghost").await, 0);
    assert_eq!(report.players_credited, 1);
}

#[tokio::test]
async fn test_unconfigured_styles_are_ignored() {
    let harness = TestHarnessBuilder::new().with_styles(vec![0]).build();
    submit_all(&harness, &[(Route::new("m", 0, 4), "a", 1000)]).await;

    let report = harness
        .recompute
        .run(RecomputeOptions::default(), not_cancelled())
        .await
        .unwrap();

    assert_eq!(report.records, 0);
    assert_eq!(harness.points_of("a").await, 0);

    let report = harness
        .recompute
        .run(
            RecomputeOptions {
                styles: Some(vec![4]),
                resume_from: None,
            },
            not_cancelled(),
        )
        .await
        .unwrap();
    assert_eq!(report.records, 1);
    // 400vel multiplies the baseline by 1.5
    assert_eq!(harness.points_of("a").await, 38);
}

#[tokio::test]
async fn test_uncapped_count_multiplies_fully() {
    let scoring = ScoringConfig {
        max_completions: 0,
        ..ScoringConfig::default()
    };
    let harness = TestHarnessBuilder::new().with_scoring(scoring).build();
    let route = Route::main("m");
    let runs: Vec<(Route, &str, i64)> = (0..12).map(|_| (route.clone(), "a", 1000)).collect();
    submit_all(&harness, &runs).await;

    harness
        .recompute
        .run(RecomputeOptions::default(), not_cancelled())
        .await
        .unwrap();

    assert_eq!(harness.points_of("a").await, 125 * 12);
}

#[tokio::test]
async fn test_cancel_then_resume_matches_full_run() {
    let harness = TestHarnessBuilder::new().build();
    submit_all(
        &harness,
        &[
            (Route::main("a_map"), "a", 1000),
            (Route::main("b_map"), "a", 1000),
            (Route::main("b_map"), "b", 900),
            (Route::main("c_map"), "b", 1000),
        ],
    )
    .await;

    harness
        .recompute
        .run(RecomputeOptions::default(), not_cancelled())
        .await
        .unwrap();
    let full = futures_points(&harness, &["a", "b"]).await;

    let partial = harness
        .recompute
        .run(RecomputeOptions::default(), Arc::new(AtomicBool::new(true)))
        .await
        .unwrap();
    assert!(partial.cancelled);
    assert_eq!(
        partial.checkpoint,
        Some(Checkpoint {
            style: 0,
            map_name: "a_map".to_string(),
            bonus: 0
        })
    );

    let resumed = harness
        .recompute
        .run(
            RecomputeOptions {
                styles: None,
                resume_from: partial.checkpoint.clone(),
            },
            not_cancelled(),
        )
        .await
        .unwrap();

    assert!(!resumed.cancelled);
    assert_eq!(resumed.routes, 2);
    assert_eq!(futures_points(&harness, &["a", "b"]).await, full);
}

#[tokio::test]
async fn test_reset_and_run_announce_completion() {
    let harness = TestHarnessBuilder::new().build();
    submit_all(&harness, &[(Route::main("m"), "a", 1000)]).await;

    assert_eq!(harness.recompute.reset_all_points().await.unwrap(), 1);
    assert_eq!(harness.points_of("a").await, 0);

    let report = harness
        .recompute
        .run(RecomputeOptions::default(), not_cancelled())
        .await
        .unwrap();
    harness.settle().await;

    let events = harness.events.events().await;
    assert!(events.iter().any(|event| matches!(
        event,
        TimerEvent::RecomputeFinished { run_id, cancelled: false, players_credited: 1 }
            if *run_id == report.run_id
    )));
}

#[tokio::test]
async fn test_overlapping_runs_are_rejected() {
    let harness = Arc::new(TestHarnessBuilder::new().build());
    let runs: Vec<(Route, &str, i64)> = (0..200)
        .map(|i| (Route::main(format!("map_{:03}", i)), "a", 1000))
        .collect();
    submit_all(&harness, &runs).await;

    let background = {
        let harness = Arc::clone(&harness);
        tokio::spawn(async move {
            harness
                .recompute
                .run(RecomputeOptions::default(), not_cancelled())
                .await
        })
    };

    let mut rejected = false;
    while !background.is_finished() {
        if let Err(RecomputeError::AlreadyRunning) = harness.recompute.reset_all_points().await {
            rejected = true;
            break;
        }
        tokio::task::yield_now().await;
    }

    let report = background.await.unwrap().unwrap();
    assert_eq!(report.routes, 200);
    if rejected {
        assert_eq!(harness.points_of("a").await, 125 * 200);
    }
}

#[tokio::test]
async fn test_recompute_finishes_after_the_request_is_dropped() {
    let harness = TestHarnessBuilder::new().build();
    submit_all(&harness, &[(Route::main("m"), "a", 1000)]).await;
    assert_eq!(harness.points_of("a").await, 125);

    let state = AppState::new(
        harness.store.clone(),
        &AppConfig::default(),
        harness.event_bus.clone(),
        harness.clock.clone(),
    );
    let recompute = Arc::clone(&state.recompute);
    harness.store.delay_points(Duration::from_millis(300));

    let request = Request::builder()
        .method("POST")
        .uri("/admin/recompute")
        .body(Body::empty())
        .unwrap();
    let dropped = tokio::time::timeout(
        Duration::from_millis(50),
        routes::router(state).oneshot(request),
    )
    .await
    .is_err();
    assert!(dropped);
    assert!(recompute.is_running());

    for _ in 0..100 {
        if !recompute.is_running() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(!recompute.is_running());
    assert_eq!(harness.points_of("a").await, 125);
}

#[tokio::test]
async fn test_detached_run_reports_through_its_handle() {
    let harness = TestHarnessBuilder::new().build();
    submit_all(&harness, &[(Route::main("m"), "a", 1000)]).await;

    let report = harness
        .recompute
        .spawn_cancellable(RecomputeOptions::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.records, 1);
    assert_eq!(harness.points_of("a").await, 125);
}
