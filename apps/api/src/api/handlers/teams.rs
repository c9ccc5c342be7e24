use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::repositories::StoreError;
use crate::domain::team::{Team, TeamMember, TeamName};
use crate::domain::user::UserId;

/// Team member as sent and returned over the wire
#[derive(Debug, Deserialize, Serialize)]
pub struct TeamMemberBody {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

/// Request body for creating a team
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMemberBody>,
}

/// Team with its members ordered by user id
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team_name: String,
    pub members: Vec<TeamMemberBody>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            team_name: team.name().to_string(),
            members: team
                .members()
                .iter()
                .map(|member| TeamMemberBody {
                    user_id: member.user_id.to_string(),
                    username: member.username.clone(),
                    is_active: member.is_active,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTeamResponse {
    pub team: TeamResponse,
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateTeamRequest {
    pub team_name: String,
}

/// Outcome of a team deactivation
#[derive(Debug, Serialize)]
pub struct DeactivateTeamResponse {
    pub deactivated_users: usize,
    pub reassigned_prs: usize,
    /// Wall-clock time of the whole cascade, e.g. `1.52ms`
    pub duration: String,
}

/// Create a team, upserting its members
///
/// POST /team/add
pub async fn create_team(
    State(state): State<AppState>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreateTeamResponse>), ApiError> {
    let members = req
        .members
        .into_iter()
        .map(|member| {
            Ok(TeamMember::new(
                UserId::new(member.user_id)?,
                member.username,
                member.is_active,
            ))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let team = Team::new(TeamName::new(req.team_name)?, members)?;

    state
        .teams
        .create(&team)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "TEAM_EXISTS",
                "team_name already exists",
            ),
            other => ApiError::from(other),
        })?;

    tracing::info!(team = %team.name(), members = team.members().len(), "Team created");

    Ok((
        StatusCode::CREATED,
        Json(CreateTeamResponse {
            team: TeamResponse::from(&team),
        }),
    ))
}

/// Get a team with its members
///
/// GET /team/get?team_name=
pub async fn get_team(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<TeamResponse>, ApiError> {
    let name = query
        .team_name
        .ok_or_else(|| ApiError::bad_request("team_name query parameter required"))?;
    let name = TeamName::new(name)?;

    let team = state
        .teams
        .find_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::not_found("team not found"))?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Deactivate every active member of a team and repair their open reviews
///
/// POST /team/deactivate
pub async fn deactivate_team(
    State(state): State<AppState>,
    Json(req): Json<DeactivateTeamRequest>,
) -> Result<Json<DeactivateTeamResponse>, ApiError> {
    let name = TeamName::new(req.team_name)?;

    let start = Instant::now();
    let report = state.reviewers.deactivate_team(&name).await?;
    let duration = start.elapsed();

    Ok(Json(DeactivateTeamResponse {
        deactivated_users: report.deactivated_users,
        reassigned_prs: report.reassigned_prs,
        duration: format!("{:?}", duration),
    }))
}
