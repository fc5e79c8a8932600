//! Cache key definitions.

use std::fmt;

const WEEKLY_RECOMMENDATIONS: &str = "weekly_recommendations";
const REFRESH_COMPLETED_PREFIX: &str = "refresh:completed:";

/// Every key Lectern writes to the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The serialized top-N snapshot.
    WeeklyRecommendations,
    /// Idempotency marker for a refresh task, keyed by task id.
    RefreshCompleted(String),
}

impl CacheKey {
    pub fn render(&self) -> String {
        match self {
            Self::WeeklyRecommendations => WEEKLY_RECOMMENDATIONS.to_string(),
            Self::RefreshCompleted(task_id) => format!("{REFRESH_COMPLETED_PREFIX}{task_id}"),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeeklyRecommendations => f.write_str(WEEKLY_RECOMMENDATIONS),
            Self::RefreshCompleted(task_id) => write!(f, "{REFRESH_COMPLETED_PREFIX}{task_id}"),
        }
    }
}
