// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler, points::points_handler, profile::profile_handler,
        referral::referral_handler, tasks::tasks_handler,
    },
    middleware::{admin_guard, wallet_identity},
    AppState,
};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let wallet_routes = Router::new()
        .nest("/profile", profile_handler())
        .nest("/tasks", tasks_handler())
        .nest("/referral", referral_handler())
        .nest("/points", points_handler())
        .layer(middleware::from_fn(wallet_identity));

    let admin_routes = Router::new()
        .nest("/admin", admin_handler())
        .layer(middleware::from_fn(admin_guard));

    let api_route = Router::new()
        .merge(wallet_routes)
        .merge(admin_routes)
        .route("/leaderboard", get(crate::handler::points::get_leaderboard))
        .layer(Extension(app_state));

    Router::new()
        .nest("/api", api_route)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
