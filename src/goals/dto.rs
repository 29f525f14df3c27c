use serde::Deserialize;

use super::dashboard::{GoalSort, StatusFilter};

/// Query string for `GET /goals`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub sort: GoalSort,
}
