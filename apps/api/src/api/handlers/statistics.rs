use axum::{extract::State, Json};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::repositories::ReviewStatistics;

/// Counters over pull requests and review assignments
///
/// GET /statistics
pub async fn get_statistics(
    State(state): State<AppState>,
) -> Result<Json<ReviewStatistics>, ApiError> {
    let stats = state.pull_requests.statistics().await?;

    Ok(Json(stats))
}
