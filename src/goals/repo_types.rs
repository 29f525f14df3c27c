use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// One measurement appended to a goal. Owned by its goal, no identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub metric: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    /// Append-only, in logging order.
    pub progress: Vec<ProgressSample>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct GoalRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: OffsetDateTime,
    pub progress: Json<Vec<ProgressSample>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<GoalRow> for Goal {
    fn from(r: GoalRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            due_date: r.due_date,
            progress: r.progress.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Overdue,
}

/// A sample metric at or above this value marks the goal as reached.
pub const COMPLETION_METRIC: f64 = 100.0;

impl Goal {
    pub fn latest_metric(&self) -> Option<f64> {
        self.progress.last().map(|s| s.metric)
    }

    pub fn status(&self, now: OffsetDateTime) -> GoalStatus {
        if self.latest_metric().is_some_and(|m| m >= COMPLETION_METRIC) {
            GoalStatus::Completed
        } else if self.due_date < now {
            GoalStatus::Overdue
        } else {
            GoalStatus::Active
        }
    }

    /// Share of the `created_at..due_date` window that has elapsed, in percent.
    ///
    /// This is time-based only; logged metrics do not move it.
    pub fn time_elapsed_pct(&self, now: OffsetDateTime) -> f64 {
        let total = (self.due_date - self.created_at).as_seconds_f64();
        if total <= 0.0 {
            return 100.0;
        }
        let elapsed = (now - self.created_at).as_seconds_f64();
        (elapsed / total * 100.0).clamp(0.0, 100.0)
    }
}
