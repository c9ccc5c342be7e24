use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::pull_request::{PullRequest, PullRequestId, PullRequestShort};
use crate::domain::user::UserId;
use crate::engine::{CreateOutcome, ReassignOutcome};

/// Request body for opening a pull request
#[derive(Debug, Deserialize)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MergePullRequestRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

/// Full pull request with its reviewers
#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<&PullRequest> for PullRequestResponse {
    fn from(pr: &PullRequest) -> Self {
        Self {
            pull_request_id: pr.id().to_string(),
            pull_request_name: pr.name().to_string(),
            author_id: pr.author_id().to_string(),
            status: pr.status().to_string(),
            assigned_reviewers: pr.reviewers().iter().map(ToString::to_string).collect(),
            created_at: pr.created_at(),
            merged_at: pr.merged_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PullRequestShortResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

impl From<&PullRequestShort> for PullRequestShortResponse {
    fn from(pr: &PullRequestShort) -> Self {
        Self {
            pull_request_id: pr.id.to_string(),
            pull_request_name: pr.name.clone(),
            author_id: pr.author_id.to_string(),
            status: pr.status.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PullRequestEnvelope {
    pub pr: PullRequestResponse,
}

#[derive(Debug, Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequestResponse,
    pub replaced_by: String,
}

/// Open a pull request and assign reviewers
///
/// POST /pullRequest/create
pub async fn create_pull_request(
    State(state): State<AppState>,
    Json(req): Json<CreatePullRequestRequest>,
) -> Result<(StatusCode, Json<PullRequestEnvelope>), ApiError> {
    let id = PullRequestId::new(req.pull_request_id)?;
    let author_id = UserId::new(req.author_id)?;

    let outcome = state
        .reviewers
        .create_pull_request(id, req.pull_request_name, author_id)
        .await?;

    match outcome {
        CreateOutcome::Created(pr) => Ok((
            StatusCode::CREATED,
            Json(PullRequestEnvelope {
                pr: PullRequestResponse::from(&pr),
            }),
        )),
        CreateOutcome::AlreadyExists => {
            Err(ApiError::conflict("PR_EXISTS", "PR id already exists"))
        }
        CreateOutcome::AuthorNotFound => Err(ApiError::not_found("author not found")),
    }
}

/// Merge a pull request; merging twice is a no-op
///
/// POST /pullRequest/merge
pub async fn merge_pull_request(
    State(state): State<AppState>,
    Json(req): Json<MergePullRequestRequest>,
) -> Result<Json<PullRequestEnvelope>, ApiError> {
    let id = PullRequestId::new(req.pull_request_id)?;

    let pr = state
        .pull_requests
        .merge(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("pull request not found"))?;

    tracing::info!(pr_id = %pr.id(), "Pull request merged");

    Ok(Json(PullRequestEnvelope {
        pr: PullRequestResponse::from(&pr),
    }))
}

/// Replace one reviewer with a random active teammate of theirs
///
/// POST /pullRequest/reassign
pub async fn reassign_reviewer(
    State(state): State<AppState>,
    Json(req): Json<ReassignRequest>,
) -> Result<Json<ReassignResponse>, ApiError> {
    let id = PullRequestId::new(req.pull_request_id)?;
    let old_reviewer = UserId::new(req.old_user_id)?;

    let (replaced_by, pr) = match state.reviewers.reassign_reviewer(&id, &old_reviewer).await? {
        ReassignOutcome::Reassigned {
            replaced_by,
            pull_request,
        } => (replaced_by, pull_request),
        ReassignOutcome::PullRequestNotFound => {
            return Err(ApiError::not_found("pull request not found"));
        }
        ReassignOutcome::AlreadyMerged => {
            return Err(ApiError::conflict("PR_MERGED", "cannot reassign on merged PR"));
        }
        ReassignOutcome::NotAssigned => {
            return Err(ApiError::conflict("NOT_ASSIGNED", "reviewer is not assigned to this PR"));
        }
        ReassignOutcome::NoCandidate => {
            return Err(ApiError::conflict(
                "NO_CANDIDATE",
                "no active replacement candidate in team",
            ));
        }
    };

    Ok(Json(ReassignResponse {
        pr: PullRequestResponse::from(&pr),
        replaced_by: replaced_by.to_string(),
    }))
}
