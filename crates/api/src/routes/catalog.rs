//! Catalog route handlers.
//!
//! Reads are public. Creating, updating and deleting leagues, teams, jersey
//! types and jerseys requires an admin token.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use fanatik_core::{
    JerseyFilter, JerseyId, JerseyTypeId, LeagueId, Page, PageRequest, SortKey, TeamId,
};

use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::catalog::{
    Jersey, JerseyInput, JerseyType, JerseyTypeInput, League, LeagueInput, Team, TeamInput,
};
use crate::routes::auth::MessageResponse;
use crate::routes::extract::{JsonBody, PathParam, QueryParams, not_found, required};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// `GET /catalog/jerseys` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct JerseyListQuery {
    pub team_id: Option<TeamId>,
    pub league_id: Option<LeagueId>,
    pub jersey_type_id: Option<JerseyTypeId>,
    pub main_color: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub search: Option<String>,
}

impl JerseyListQuery {
    /// Validate into a filter, sort key and page request.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown sort key, `page < 1` or
    /// `limit < 0`.
    pub fn into_parts(self) -> Result<(JerseyFilter, Option<SortKey>, PageRequest)> {
        let sort = SortKey::parse_optional(self.sort_by.as_deref())?;
        let page = PageRequest::new(self.page, self.limit)?;
        let filter = JerseyFilter {
            team_id: self.team_id,
            league_id: self.league_id,
            jersey_type_id: self.jersey_type_id,
            main_color: self
                .main_color
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty()),
            ..JerseyFilter::default()
        }
        .with_search(self.search.as_deref());
        Ok((filter, sort, page))
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamListQuery {
    pub league_id: Option<LeagueId>,
}

// =============================================================================
// Input Validation
// =============================================================================

fn validate_prices(input: &JerseyTypeInput) -> Result<()> {
    required(&input.name, "name")?;
    if input.original_price.is_negative() || input.current_price.is_negative() {
        return Err(AppError::BadRequest(
            "Prices cannot be negative".to_owned(),
        ));
    }
    Ok(())
}

fn validate_jersey(input: &JerseyInput) -> Result<()> {
    required(&input.season, "season")?;
    required(&input.main_color, "main_color")?;
    if input
        .images
        .iter()
        .any(|image| image.image_base64.trim().is_empty())
    {
        return Err(AppError::BadRequest("image_base64 is required".to_owned()));
    }
    Ok(())
}

fn trimmed_league(input: LeagueInput) -> Result<LeagueInput> {
    let name = required(&input.name, "name")?.to_owned();
    Ok(LeagueInput { name, ..input })
}

fn trimmed_team(input: TeamInput) -> Result<TeamInput> {
    let name = required(&input.name, "name")?.to_owned();
    Ok(TeamInput { name, ..input })
}

// =============================================================================
// Jersey Types
// =============================================================================

pub async fn list_types(State(state): State<AppState>) -> Result<Json<Vec<JerseyType>>> {
    let types = CatalogRepository::new(state.pool())
        .list_jersey_types()
        .await?;
    Ok(Json(types))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create_type(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonBody(body): JsonBody<JerseyTypeInput>,
) -> Result<(StatusCode, Json<JerseyType>)> {
    validate_prices(&body)?;
    let created = CatalogRepository::new(state.pool())
        .create_jersey_type(&body)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_type(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<JerseyTypeId>,
    JsonBody(body): JsonBody<JerseyTypeInput>,
) -> Result<Json<JerseyType>> {
    validate_prices(&body)?;
    let updated = CatalogRepository::new(state.pool())
        .update_jersey_type(id, &body)
        .await
        .map_err(not_found("Jersey type not found"))?;
    Ok(Json(updated))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_type(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<JerseyTypeId>,
) -> Result<Json<MessageResponse>> {
    CatalogRepository::new(state.pool())
        .delete_jersey_type(id)
        .await
        .map_err(not_found("Jersey type not found"))?;
    Ok(Json(MessageResponse {
        message: "Jersey type deleted",
    }))
}

// =============================================================================
// Leagues
// =============================================================================

pub async fn list_leagues(State(state): State<AppState>) -> Result<Json<Vec<League>>> {
    let leagues = CatalogRepository::new(state.pool()).list_leagues().await?;
    Ok(Json(leagues))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create_league(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonBody(body): JsonBody<LeagueInput>,
) -> Result<(StatusCode, Json<League>)> {
    let input = trimmed_league(body)?;
    let created = CatalogRepository::new(state.pool())
        .create_league(&input)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_league(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<LeagueId>,
) -> Result<Json<MessageResponse>> {
    CatalogRepository::new(state.pool())
        .delete_league(id)
        .await
        .map_err(not_found("League not found"))?;
    Ok(Json(MessageResponse {
        message: "League deleted",
    }))
}

// =============================================================================
// Teams
// =============================================================================

pub async fn list_teams(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TeamListQuery>,
) -> Result<Json<Vec<Team>>> {
    let teams = CatalogRepository::new(state.pool())
        .list_teams(query.league_id)
        .await?;
    Ok(Json(teams))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create_team(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonBody(body): JsonBody<TeamInput>,
) -> Result<(StatusCode, Json<Team>)> {
    let input = trimmed_team(body)?;
    let created = CatalogRepository::new(state.pool())
        .create_team(&input)
        .await
        .map_err(not_found("League not found"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_team(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<TeamId>,
) -> Result<Json<MessageResponse>> {
    CatalogRepository::new(state.pool())
        .delete_team(id)
        .await
        .map_err(not_found("Team not found"))?;
    Ok(Json(MessageResponse {
        message: "Team deleted",
    }))
}

// =============================================================================
// Jerseys
// =============================================================================

/// Filtered, sorted, paginated jersey listing.
#[instrument(skip(state))]
pub async fn list_jerseys(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<JerseyListQuery>,
) -> Result<Json<Page<Jersey>>> {
    let (filter, sort, page) = query.into_parts()?;
    let jerseys = CatalogRepository::new(state.pool())
        .list_jerseys(&filter, sort, page)
        .await?;
    Ok(Json(jerseys))
}

pub async fn get_jersey(
    State(state): State<AppState>,
    PathParam(id): PathParam<JerseyId>,
) -> Result<Json<Jersey>> {
    let jersey = CatalogRepository::new(state.pool())
        .get_jersey(id)
        .await
        .map_err(not_found("Jersey not found"))?;
    Ok(Json(jersey))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create_jersey(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonBody(body): JsonBody<JerseyInput>,
) -> Result<(StatusCode, Json<Jersey>)> {
    validate_jersey(&body)?;
    let created = CatalogRepository::new(state.pool())
        .create_jersey(&body)
        .await
        .map_err(not_found("Team or jersey type not found"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_jersey(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<JerseyId>,
    JsonBody(body): JsonBody<JerseyInput>,
) -> Result<Json<Jersey>> {
    validate_jersey(&body)?;
    let updated = CatalogRepository::new(state.pool())
        .update_jersey(id, &body)
        .await
        .map_err(not_found("Jersey, team or jersey type not found"))?;
    Ok(Json(updated))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_jersey(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<JerseyId>,
) -> Result<Json<MessageResponse>> {
    CatalogRepository::new(state.pool())
        .delete_jersey(id)
        .await
        .map_err(not_found("Jersey not found"))?;
    Ok(Json(MessageResponse {
        message: "Jersey deleted",
    }))
}
