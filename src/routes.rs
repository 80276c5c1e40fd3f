use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::shared::{AppError, AppState};
use crate::{leaderboard, recompute, stats, submission};

/// GET /health
async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.health_check().await?;
    Ok(Json(json!({
        "status": "ok",
        "backend": format!("{:?}", state.store.dialect()).to_lowercase(),
    })))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/leaderboards/:map", get(leaderboard::handlers::get_leaderboard))
        .route("/leaderboards/:map/rank", get(leaderboard::handlers::get_rank))
        .route(
            "/leaderboards/:map/stages/:stage",
            get(leaderboard::handlers::get_stage_leaderboard),
        )
        .route("/points/top", get(leaderboard::handlers::top_points))
        .route("/players/:player_id", get(stats::get_player))
        .route("/players/:player_id/connect", post(stats::connect_player))
        .route("/players/:player_id/preferences", put(stats::update_preferences))
        .route("/completions", post(submission::submit_completion))
        .route("/stages", post(submission::submit_stage))
        .route("/admin/points/reset", post(recompute::reset_points))
        .route("/admin/recompute", post(recompute::run_recompute))
        .route("/admin/recompute/cancel", post(recompute::cancel_recompute))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::stats::StatsStore;
    use crate::storage::InMemoryStore;
    use axum::{body::Body, http::{Request, StatusCode}};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_backend() {
        let app = router(AppStateBuilder::new().build());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["backend"], "memory");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = router(AppStateBuilder::new().build());

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_configured_minimum_hides_low_totals() {
        let store = Arc::new(InMemoryStore::new());
        store.add_points("low", "Low", 40).await.unwrap();
        store.add_points("high", "High", 400).await.unwrap();
        let mut config = AppConfig::default();
        config.scoring.min_points_for_rank = 100;
        let app = router(
            AppStateBuilder::new()
                .with_store(store)
                .with_config(config)
                .build(),
        );

        let response = app
            .oneshot(Request::builder().uri("/points/top").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        let standings = value.as_array().unwrap();
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0]["player_id"], "high");
    }

    #[tokio::test]
    async fn test_stage_leaderboard_is_routed() {
        let app = router(AppStateBuilder::new().build());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/leaderboards/surf_a/stages/2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
