use axum::{routing::{get, post}, Router};

use super::handlers::{health, pull_requests, statistics, teams, users};
use super::state::AppState;

/// Build the application router without transport layers
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Team routes
        .route("/team/add", post(teams::create_team))
        .route("/team/get", get(teams::get_team))
        .route("/team/deactivate", post(teams::deactivate_team))
        // User routes
        .route("/users/setIsActive", post(users::set_is_active))
        .route("/users/getReview", get(users::get_review))
        // Pull request routes
        .route(
            "/pullRequest/create",
            post(pull_requests::create_pull_request),
        )
        .route(
            "/pullRequest/merge",
            post(pull_requests::merge_pull_request),
        )
        .route(
            "/pullRequest/reassign",
            post(pull_requests::reassign_reviewer),
        )
        .route("/statistics", get(statistics::get_statistics))
        // Shared state
        .with_state(state)
}
