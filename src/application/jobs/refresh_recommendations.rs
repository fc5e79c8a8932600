//! Cron job that refreshes the weekly recommendations snapshot.

use std::str::FromStr;
use std::sync::Arc;

use apalis::prelude::*;
use apalis_cron::Schedule;

use crate::application::recommendations::{RecommendationService, RefreshOutcome};

pub const REFRESH_WORKER_NAME: &str = "refresh-recommendations-worker";

/// Marker struct for the cron-triggered refresh.
/// Must implement `From<chrono::DateTime<chrono::Utc>>` for apalis-cron compatibility.
#[derive(Default, Debug, Clone)]
pub struct RefreshRecommendationsJob;

impl From<chrono::DateTime<chrono::Utc>> for RefreshRecommendationsJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct RefreshRecommendationsContext {
    pub recommendations: Arc<RecommendationService>,
}

/// Run one guarded refresh.
///
/// Failures are logged and swallowed: the previous snapshot stays in place and
/// the next scheduled tick is the retry.
pub async fn process_refresh_recommendations_job(
    _job: RefreshRecommendationsJob,
    ctx: Data<RefreshRecommendationsContext>,
) -> Result<(), apalis::prelude::Error> {
    match ctx.recommendations.refresh().await {
        Ok(RefreshOutcome::Completed { task_id, books }) => {
            tracing::info!(task_id = %task_id, books = books.len(), "Scheduled refresh completed");
        }
        Ok(RefreshOutcome::Skipped { task_id }) => {
            tracing::debug!(task_id = %task_id, "Scheduled refresh skipped");
        }
        Err(err) => {
            tracing::warn!(error = %err, "Scheduled refresh failed");
        }
    }
    Ok(())
}

/// Parse a six-field cron expression (seconds first), e.g. `0 0 0 * * *` for daily at midnight UTC.
pub fn refresh_recommendations_schedule(expression: &str) -> Result<Schedule, String> {
    Schedule::from_str(expression).map_err(|err| format!("invalid cron expression: {err}"))
}
