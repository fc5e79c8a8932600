mod refresh_recommendations;

pub use refresh_recommendations::{
    REFRESH_WORKER_NAME, RefreshRecommendationsContext, RefreshRecommendationsJob,
    process_refresh_recommendations_job, refresh_recommendations_schedule,
};
