use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Goal, GoalRow, ProgressSample};
use crate::validation::{GoalChanges, NewGoal};

/// Goal documents, each scoped to its owner. Lookups for a goal owned by
/// someone else behave exactly like lookups for a missing goal.
#[async_trait]
pub trait GoalStore: Send + Sync {
    async fn insert(&self, user_id: Uuid, goal: &NewGoal, now: OffsetDateTime)
        -> anyhow::Result<Goal>;
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Goal>>;
    async fn find(&self, user_id: Uuid, goal_id: Uuid) -> anyhow::Result<Option<Goal>>;
    async fn update(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        changes: &GoalChanges,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Goal>>;
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, user_id: Uuid, goal_id: Uuid) -> anyhow::Result<bool>;
    /// Appends in a single statement; concurrent appends never drop samples.
    async fn append_progress(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        sample: ProgressSample,
    ) -> anyhow::Result<Option<Goal>>;
}

#[derive(Clone)]
pub struct PgGoalStore {
    db: PgPool,
}

impl PgGoalStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GoalStore for PgGoalStore {
    async fn insert(
        &self,
        user_id: Uuid,
        goal: &NewGoal,
        now: OffsetDateTime,
    ) -> anyhow::Result<Goal> {
        let row = sqlx::query_as::<_, GoalRow>(
            r#"
            INSERT INTO goals (id, user_id, title, description, due_date, progress, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, '[]'::jsonb, $6, $6)
            RETURNING id, user_id, title, description, due_date, progress, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.due_date)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .context("insert goal")?;
        Ok(row.into())
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Goal>> {
        let rows = sqlx::query_as::<_, GoalRow>(
            r#"
            SELECT id, user_id, title, description, due_date, progress, created_at, updated_at
            FROM goals
            WHERE user_id = $1
            ORDER BY due_date ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list goals by user")?;
        Ok(rows.into_iter().map(Goal::from).collect())
    }

    async fn find(&self, user_id: Uuid, goal_id: Uuid) -> anyhow::Result<Option<Goal>> {
        let row = sqlx::query_as::<_, GoalRow>(
            r#"
            SELECT id, user_id, title, description, due_date, progress, created_at, updated_at
            FROM goals
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(goal_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find goal")?;
        Ok(row.map(Goal::from))
    }

    async fn update(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        changes: &GoalChanges,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Goal>> {
        let row = sqlx::query_as::<_, GoalRow>(
            r#"
            UPDATE goals
               SET title       = COALESCE($3, title),
                   description = CASE WHEN $4 THEN $5 ELSE description END,
                   due_date    = COALESCE($6, due_date),
                   updated_at  = $7
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, due_date, progress, created_at, updated_at
            "#,
        )
        .bind(goal_id)
        .bind(user_id)
        .bind(&changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .bind(changes.due_date)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("update goal")?;
        Ok(row.map(Goal::from))
    }

    async fn delete(&self, user_id: Uuid, goal_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
            .bind(goal_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete goal")?;
        Ok(res.rows_affected() > 0)
    }

    async fn append_progress(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        sample: ProgressSample,
    ) -> anyhow::Result<Option<Goal>> {
        let row = sqlx::query_as::<_, GoalRow>(
            r#"
            UPDATE goals
               SET progress   = progress || $3,
                   updated_at = $4
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, due_date, progress, created_at, updated_at
            "#,
        )
        .bind(goal_id)
        .bind(user_id)
        .bind(Json(vec![sample]))
        .bind(sample.date)
        .fetch_optional(&self.db)
        .await
        .context("append progress")?;
        Ok(row.map(Goal::from))
    }
}
