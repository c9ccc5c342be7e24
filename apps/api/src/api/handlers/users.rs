use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::handlers::pull_requests::PullRequestShortResponse;
use crate::api::state::AppState;
use crate::domain::repositories::User;
use crate::domain::user::UserId;

#[derive(Debug, Deserialize)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub team_name: Option<String>,
    pub is_active: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            username: user.username.clone(),
            team_name: user.team_name.as_ref().map(ToString::to_string),
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SetIsActiveResponse {
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

/// Pull requests a user is assigned to review
#[derive(Debug, Serialize)]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShortResponse>,
}

/// Flip a user's active flag
///
/// POST /users/setIsActive
pub async fn set_is_active(
    State(state): State<AppState>,
    Json(req): Json<SetIsActiveRequest>,
) -> Result<Json<SetIsActiveResponse>, ApiError> {
    let user_id = UserId::new(req.user_id)?;

    let user = state.users.set_is_active(&user_id, req.is_active).await?;

    tracing::info!(user_id = %user.id, is_active = user.is_active, "User activity changed");

    Ok(Json(SetIsActiveResponse {
        user: UserResponse::from(&user),
    }))
}

/// List the pull requests a user reviews
///
/// GET /users/getReview?user_id=
pub async fn get_review(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserReviewsResponse>, ApiError> {
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::bad_request("user_id query parameter required"))?;
    let user_id = UserId::new(user_id)?;

    let pull_requests = state.pull_requests.find_by_reviewer(&user_id).await?;

    Ok(Json(UserReviewsResponse {
        user_id: user_id.to_string(),
        pull_requests: pull_requests
            .iter()
            .map(PullRequestShortResponse::from)
            .collect(),
    }))
}
