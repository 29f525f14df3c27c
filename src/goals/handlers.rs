use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::{
    dashboard::{filter_and_sort, summarize, DashboardSummary, GoalView},
    dto::ListQuery,
    repo_types::{Goal, ProgressSample},
    services,
};
use crate::{
    auth::extractors::CurrentSession,
    error::ServiceResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
    validation::{GoalInput, GoalPatch, ProgressInput},
};

pub fn goal_routes() -> Router<AppState> {
    Router::new()
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/:id", patch(update_goal).delete(delete_goal))
        .route("/goals/:id/progress", get(get_progress).post(log_progress))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[instrument(skip(state, session), fields(user_id = %session.user.id))]
pub async fn list_goals(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiQuery(q): ApiQuery<ListQuery>,
) -> ServiceResult<Json<Vec<GoalView>>> {
    let goals = services::get_goals_by_user_id(&state, session.user.id).await?;
    Ok(Json(filter_and_sort(
        goals,
        q.status,
        q.sort,
        OffsetDateTime::now_utc(),
    )))
}

#[instrument(skip(state, session, body), fields(user_id = %session.user.id))]
pub async fn create_goal(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiJson(body): ApiJson<GoalInput>,
) -> ServiceResult<(StatusCode, HeaderMap, Json<Goal>)> {
    let goal = services::create_goal(&state, session.user.id, body).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/goals/{}", goal.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(goal)))
}

#[instrument(skip(state, session, body), fields(user_id = %session.user.id))]
pub async fn update_goal(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<GoalPatch>,
) -> ServiceResult<Json<Goal>> {
    let goal = services::update_goal(&state, session.user.id, id, body).await?;
    Ok(Json(goal))
}

#[instrument(skip(state, session), fields(user_id = %session.user.id))]
pub async fn delete_goal(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiPath(id): ApiPath<Uuid>,
) -> ServiceResult<StatusCode> {
    services::delete_goal(&state, session.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, session, body), fields(user_id = %session.user.id))]
pub async fn log_progress(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ProgressInput>,
) -> ServiceResult<(StatusCode, Json<Goal>)> {
    let goal = services::log_progress(&state, session.user.id, id, body).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

#[instrument(skip(state, session), fields(user_id = %session.user.id))]
pub async fn get_progress(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiPath(id): ApiPath<Uuid>,
) -> ServiceResult<Json<Vec<ProgressSample>>> {
    let samples = services::get_progress(&state, session.user.id, id).await?;
    Ok(Json(samples))
}

#[instrument(skip(state, session), fields(user_id = %session.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ServiceResult<Json<DashboardSummary>> {
    let goals = services::get_goals_by_user_id(&state, session.user.id).await?;
    Ok(Json(summarize(&goals, OffsetDateTime::now_utc())))
}
