use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::repo_types::{Goal, ProgressSample};
use crate::{
    error::{ServiceError, ServiceResult},
    state::AppState,
    validation::{
        validate_goal, validate_goal_patch, validate_progress, GoalInput, GoalPatch,
        ProgressInput,
    },
};

fn not_found(user_id: Uuid, goal_id: Uuid) -> ServiceError {
    warn!(%user_id, %goal_id, "goal not found");
    ServiceError::NotFound("Goal")
}

#[instrument(skip(state, input))]
pub async fn create_goal(state: &AppState, user_id: Uuid, input: GoalInput) -> ServiceResult<Goal> {
    let now = OffsetDateTime::now_utc();
    let new_goal = validate_goal(input, now).map_err(ServiceError::Validation)?;

    let goal = state
        .goals
        .insert(user_id, &new_goal, now)
        .await
        .map_err(|e| ServiceError::storage("Error creating goal", e))?;
    info!(goal_id = %goal.id, %user_id, "goal created");
    Ok(goal)
}

#[instrument(skip(state))]
pub async fn get_goals_by_user_id(state: &AppState, user_id: Uuid) -> ServiceResult<Vec<Goal>> {
    state
        .goals
        .list_by_user(user_id)
        .await
        .map_err(|e| ServiceError::storage("Error fetching goals", e))
}

#[instrument(skip(state, patch))]
pub async fn update_goal(
    state: &AppState,
    user_id: Uuid,
    goal_id: Uuid,
    patch: GoalPatch,
) -> ServiceResult<Goal> {
    let now = OffsetDateTime::now_utc();
    let changes = validate_goal_patch(patch, now).map_err(ServiceError::Validation)?;

    let goal = state
        .goals
        .update(user_id, goal_id, &changes, now)
        .await
        .map_err(|e| ServiceError::storage("Error updating goal", e))?
        .ok_or_else(|| not_found(user_id, goal_id))?;
    info!(%goal_id, "goal updated");
    Ok(goal)
}

#[instrument(skip(state))]
pub async fn delete_goal(state: &AppState, user_id: Uuid, goal_id: Uuid) -> ServiceResult<()> {
    let deleted = state
        .goals
        .delete(user_id, goal_id)
        .await
        .map_err(|e| ServiceError::storage("Error deleting goal", e))?;
    if !deleted {
        return Err(not_found(user_id, goal_id));
    }
    info!(%goal_id, "goal deleted");
    Ok(())
}

/// Appends a sample stamped with the server clock.
///
/// There is no dedup key: a retried call logs a second sample.
#[instrument(skip(state, input))]
pub async fn log_progress(
    state: &AppState,
    user_id: Uuid,
    goal_id: Uuid,
    input: ProgressInput,
) -> ServiceResult<Goal> {
    let progress = validate_progress(input).map_err(ServiceError::Validation)?;
    let sample = ProgressSample {
        date: OffsetDateTime::now_utc(),
        metric: progress.metric,
    };

    let goal = state
        .goals
        .append_progress(user_id, goal_id, sample)
        .await
        .map_err(|e| ServiceError::storage("Error logging progress", e))?
        .ok_or_else(|| not_found(user_id, goal_id))?;
    info!(%goal_id, metric = sample.metric, samples = goal.progress.len(), "progress logged");
    Ok(goal)
}

#[instrument(skip(state))]
pub async fn get_progress(
    state: &AppState,
    user_id: Uuid,
    goal_id: Uuid,
) -> ServiceResult<Vec<ProgressSample>> {
    let goal = state
        .goals
        .find(user_id, goal_id)
        .await
        .map_err(|e| ServiceError::storage("Error fetching progress", e))?
        .ok_or_else(|| not_found(user_id, goal_id))?;
    Ok(goal.progress)
}
