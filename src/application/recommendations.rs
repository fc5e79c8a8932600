//! Weekly recommendations: refresh the top-rated snapshot into the cache and serve it.
//!
//! The refresh is guarded by a per-day idempotency marker. The marker is claimed
//! with set-if-absent before the store is queried and released again if the run
//! fails, so it only survives a run that completed. Reads never set the marker,
//! which keeps a cold-read recompute from suppressing the scheduled refresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::Date;
use tracing::{info, warn};

use crate::application::repos::{BooksRepo, RepoError};
use crate::cache::{CacheError, CacheKey, CacheStore};
use crate::domain::entities::BookSummary;
use crate::util::Clock;

pub const WEEKLY_TASK_TYPE: &str = "weekly_recommendations";

pub const DEFAULT_RECOMMENDATION_LIMIT: u32 = 5;
pub const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_MARKER_TTL_SECS: u64 = 24 * 60 * 60;
const MARKER_VALUE: &str = "1";

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("book store unavailable")]
    Store(#[from] RepoError),
    #[error("recommendations cache unavailable")]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationConfig {
    pub limit: u32,
    pub snapshot_ttl: Duration,
    pub marker_ttl: Duration,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RECOMMENDATION_LIMIT,
            snapshot_ttl: Duration::from_secs(DEFAULT_SNAPSHOT_TTL_SECS),
            marker_ttl: Duration::from_secs(DEFAULT_MARKER_TTL_SECS),
        }
    }
}

impl From<&crate::config::RecommendationSettings> for RecommendationConfig {
    fn from(settings: &crate::config::RecommendationSettings) -> Self {
        Self {
            limit: settings.limit.get(),
            snapshot_ttl: settings.snapshot_ttl,
            marker_ttl: settings.marker_ttl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Cache,
    Recomputed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyRecommendations {
    pub books: Vec<BookSummary>,
    pub source: SnapshotSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Completed {
        task_id: String,
        books: Vec<BookSummary>,
    },
    /// A run for the same task id already completed inside the marker window.
    Skipped { task_id: String },
}

impl RefreshOutcome {
    pub fn task_id(&self) -> &str {
        match self {
            Self::Completed { task_id, .. } | Self::Skipped { task_id } => task_id,
        }
    }
}

/// Deterministic id for a task run: hex SHA-256 of `"<type>:<params>:<YYYY-MM-DD>"`.
pub fn refresh_task_id(task_type: &str, params: &str, date: Date) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{task_type}:{params}:{date}").as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct RecommendationService {
    books: Arc<dyn BooksRepo>,
    cache: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    config: RecommendationConfig,
}

impl RecommendationService {
    pub fn new(
        books: Arc<dyn BooksRepo>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        config: RecommendationConfig,
    ) -> Self {
        Self {
            books,
            cache,
            clock,
            config,
        }
    }

    /// Task id of today's weekly refresh.
    pub fn current_task_id(&self) -> String {
        refresh_task_id(WEEKLY_TASK_TYPE, "", self.clock.today())
    }

    /// Serve the cached snapshot, recomputing it on a miss.
    pub async fn weekly(&self) -> Result<WeeklyRecommendations, RecommendationError> {
        let key = CacheKey::WeeklyRecommendations.render();

        match self.cache.get(&key).await {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<BookSummary>>(&payload) {
                Ok(books) => {
                    counter!("lectern_recommendations_cache_hit_total").increment(1);
                    return Ok(WeeklyRecommendations {
                        books,
                        source: SnapshotSource::Cache,
                    });
                }
                Err(err) => {
                    warn!(
                        target = "lectern::recommendations",
                        key = %key,
                        error = %err,
                        "Discarding unreadable recommendations snapshot"
                    );
                }
            },
            Ok(None) => {}
            Err(err) => {
                counter!("lectern_recommendations_cache_miss_total").increment(1);
                warn!(
                    target = "lectern::recommendations",
                    error = %err,
                    "Cache unavailable, serving recommendations straight from the store"
                );
                let books = self.books.top_rated(self.config.limit).await?;
                return Ok(WeeklyRecommendations {
                    books,
                    source: SnapshotSource::Recomputed,
                });
            }
        }

        counter!("lectern_recommendations_cache_miss_total").increment(1);
        let books = self.books.top_rated(self.config.limit).await?;
        if let Err(err) = self.write_snapshot(&books).await {
            warn!(
                target = "lectern::recommendations",
                error = %err,
                "Failed to cache recomputed recommendations"
            );
        }

        Ok(WeeklyRecommendations {
            books,
            source: SnapshotSource::Recomputed,
        })
    }

    /// Run the guarded refresh for today's task id.
    pub async fn refresh(&self) -> Result<RefreshOutcome, RecommendationError> {
        let started = Instant::now();
        let task_id = self.current_task_id();
        let marker = CacheKey::RefreshCompleted(task_id.clone()).render();

        let claimed = match self
            .cache
            .set_if_absent(&marker, MARKER_VALUE, self.config.marker_ttl)
            .await
        {
            Ok(claimed) => claimed,
            Err(err) => {
                counter!("lectern_refresh_total", "outcome" => "failed").increment(1);
                return Err(err.into());
            }
        };

        if !claimed {
            counter!("lectern_refresh_total", "outcome" => "skipped").increment(1);
            info!(
                target = "lectern::recommendations",
                task_id = %task_id,
                "Refresh already completed for today, skipping"
            );
            return Ok(RefreshOutcome::Skipped { task_id });
        }

        match self.publish().await {
            Ok(books) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                counter!("lectern_refresh_total", "outcome" => "completed").increment(1);
                histogram!("lectern_refresh_ms").record(elapsed_ms);
                info!(
                    target = "lectern::recommendations",
                    task_id = %task_id,
                    books = books.len(),
                    elapsed_ms,
                    "Weekly recommendations refreshed"
                );
                Ok(RefreshOutcome::Completed { task_id, books })
            }
            Err(err) => {
                counter!("lectern_refresh_total", "outcome" => "failed").increment(1);
                if let Err(release_err) = self.cache.delete(&marker).await {
                    warn!(
                        target = "lectern::recommendations",
                        task_id = %task_id,
                        error = %release_err,
                        "Failed to release refresh marker"
                    );
                }
                Err(err)
            }
        }
    }

    async fn publish(&self) -> Result<Vec<BookSummary>, RecommendationError> {
        let books = self.books.top_rated(self.config.limit).await?;
        self.write_snapshot(&books).await?;
        Ok(books)
    }

    async fn write_snapshot(&self, books: &[BookSummary]) -> Result<(), CacheError> {
        let payload = serde_json::to_string(books)?;
        self.cache
            .set(
                &CacheKey::WeeklyRecommendations.render(),
                &payload,
                self.config.snapshot_ttl,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn task_id_is_sha256_of_type_params_and_date() {
        assert_eq!(
            refresh_task_id(WEEKLY_TASK_TYPE, "", date!(2024 - 03 - 01)),
            "f63b071182ba27b78f922a4e4fe6dba660a6692b450532dca73f67520bfd40a1"
        );
    }

    #[test]
    fn task_id_changes_with_the_date() {
        let monday = refresh_task_id(WEEKLY_TASK_TYPE, "", date!(2024 - 03 - 04));
        let tuesday = refresh_task_id(WEEKLY_TASK_TYPE, "", date!(2024 - 03 - 05));
        assert_ne!(monday, tuesday);
        assert_eq!(monday.len(), 64);
    }

    #[test]
    fn defaults_match_weekly_snapshot_and_daily_marker() {
        let config = RecommendationConfig::default();
        assert_eq!(config.limit, 5);
        assert_eq!(config.snapshot_ttl.as_secs(), 604_800);
        assert_eq!(config.marker_ttl.as_secs(), 86_400);
    }
}
