//! # Web API Module
//!
//! Axum REST API implementing the wire contract: task type registration
//! and lookup, task creation with dedup marking, the claim endpoint,
//! progress and completion reports, and the dead-letter listing.
//! Authentication and CORS policy are external collaborators and are not
//! configured here.

pub mod errors;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes, the trace layer, and the
/// configured request timeout.
pub fn create_app(app_state: AppState) -> Router {
    let request_timeout = Duration::from_millis(app_state.config.web.request_timeout_ms);

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(app_state)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/task-types",
            post(handlers::task_types::register_task_type)
                .get(handlers::task_types::list_task_types),
        )
        .route(
            "/task-types/:name",
            get(handlers::task_types::get_task_type)
                .delete(handlers::task_types::deactivate_task_type),
        )
        .route(
            "/tasks",
            post(handlers::tasks::create_task).get(handlers::tasks::list_tasks),
        )
        .route("/tasks/claim", post(handlers::tasks::claim_task))
        .route("/tasks/:id", get(handlers::tasks::get_task))
        .route("/tasks/:id/progress", post(handlers::tasks::update_progress))
        .route("/tasks/:id/complete", post(handlers::tasks::complete_task))
        .route("/dead-letters", get(handlers::tasks::list_dead_letters))
}
