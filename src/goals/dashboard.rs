//! Read-side views over a user's goals: derived status, list filtering and
//! ordering, and the dashboard summary.
//!
//! Two notions of progress live side by side here. `time_elapsed_pct` is how
//! far the clock has moved from creation towards the due date; it ignores
//! logged samples. `latest_metric` is the last logged measurement. Neither is
//! presented as "the" progress.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Goal, GoalStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
    Overdue,
}

impl StatusFilter {
    fn accepts(self, status: GoalStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => status == GoalStatus::Active,
            StatusFilter::Completed => status == GoalStatus::Completed,
            StatusFilter::Overdue => status == GoalStatus::Overdue,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalSort {
    #[default]
    DueDate,
    Title,
    /// Most samples first, then latest due date.
    Progress,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub status: GoalStatus,
    pub time_elapsed_pct: f64,
    pub latest_metric: Option<f64>,
}

impl GoalView {
    pub fn new(goal: Goal, now: OffsetDateTime) -> Self {
        Self {
            status: goal.status(now),
            time_elapsed_pct: goal.time_elapsed_pct(now),
            latest_metric: goal.latest_metric(),
            goal,
        }
    }
}

fn compare(sort: GoalSort, a: &Goal, b: &Goal) -> Ordering {
    match sort {
        GoalSort::DueDate => a.due_date.cmp(&b.due_date),
        GoalSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        GoalSort::Progress => b
            .progress
            .len()
            .cmp(&a.progress.len())
            .then_with(|| b.due_date.cmp(&a.due_date)),
    }
}

pub fn filter_and_sort(
    goals: Vec<Goal>,
    filter: StatusFilter,
    sort: GoalSort,
    now: OffsetDateTime,
) -> Vec<GoalView> {
    let mut goals: Vec<Goal> = goals
        .into_iter()
        .filter(|g| filter.accepts(g.status(now)))
        .collect();
    goals.sort_by(|a, b| compare(sort, a, b));
    goals.into_iter().map(|g| GoalView::new(g, now)).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgressPoint {
    pub id: Uuid,
    pub title: String,
    pub status: GoalStatus,
    pub time_elapsed_pct: f64,
    pub latest_metric: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub goal_count: usize,
    pub active: usize,
    pub completed: usize,
    pub overdue: usize,
    pub overall_time_elapsed_pct: f64,
    pub total_samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_for: Option<String>,
    pub goals: Vec<GoalProgressPoint>,
}

pub fn summarize(goals: &[Goal], now: OffsetDateTime) -> DashboardSummary {
    let mut summary = DashboardSummary {
        goal_count: goals.len(),
        active: 0,
        completed: 0,
        overdue: 0,
        overall_time_elapsed_pct: 0.0,
        total_samples: 0,
        tracking_for: goals
            .iter()
            .map(|g| g.created_at)
            .min()
            .map(|start| format_duration(start, now)),
        goals: Vec::with_capacity(goals.len()),
    };

    let mut pct_sum = 0.0;
    for g in goals {
        let status = g.status(now);
        match status {
            GoalStatus::Active => summary.active += 1,
            GoalStatus::Completed => summary.completed += 1,
            GoalStatus::Overdue => summary.overdue += 1,
        }
        let pct = g.time_elapsed_pct(now);
        pct_sum += pct;
        summary.total_samples += g.progress.len();
        summary.goals.push(GoalProgressPoint {
            id: g.id,
            title: g.title.clone(),
            status,
            time_elapsed_pct: pct,
            latest_metric: g.latest_metric(),
        });
    }
    if !goals.is_empty() {
        summary.overall_time_elapsed_pct = pct_sum / goals.len() as f64;
    }
    summary
}

/// "1 year, 2 months, 3 days" style span, using 365-day years and 30-day
/// months. Spans under a day (or negative) read "0 days".
pub fn format_duration(start: OffsetDateTime, end: OffsetDateTime) -> String {
    let days = (end - start).whole_days().max(0);
    let (years, rest) = (days / 365, days % 365);
    let (months, days) = (rest / 30, rest % 30);

    let mut parts = Vec::new();
    for (n, unit) in [(years, "year"), (months, "month"), (days, "day")] {
        if n > 0 {
            let plural = if n == 1 { "" } else { "s" };
            parts.push(format!("{n} {unit}{plural}"));
        }
    }
    if parts.is_empty() {
        "0 days".to_string()
    } else {
        parts.join(", ")
    }
}
