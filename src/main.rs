use std::{process, sync::Arc};

use apalis::prelude::{Monitor, WorkerBuilder, WorkerFactoryFn};
use apalis_cron::CronStream;
use lectern::{
    application::{
        books::BookService,
        error::AppError,
        jobs::{
            REFRESH_WORKER_NAME, RefreshRecommendationsContext,
            process_refresh_recommendations_job,
        },
        recommendations::{
            RecommendationConfig, RecommendationError, RecommendationService, RefreshOutcome,
        },
        repos::{BooksRepo, BooksWriteRepo},
    },
    cache::{self, CacheConfig, CacheStore},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
    util::{Clock, SystemClock},
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Refresh(_) => run_refresh(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings).await?;

    if settings.recommendations.warm_on_startup {
        let recommendations = app.recommendations.clone();
        tokio::spawn(async move {
            match recommendations.refresh().await {
                Ok(outcome) => log_refresh_outcome(&outcome),
                Err(err) => warn!(
                    target = "lectern::startup",
                    error = %err,
                    "Startup refresh failed; serving recomputed recommendations until the next run"
                ),
            }
        });
    }

    let monitor_handle = spawn_job_monitor(app.recommendations.clone(), &settings);

    let result = serve_http(&settings, app.api_state).await;

    monitor_handle.abort();
    let _ = monitor_handle.await;

    result
}

async fn run_refresh(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings).await?;

    info!(
        target = "lectern::refresh",
        task_id = %app.recommendations.current_task_id(),
        "Starting weekly recommendations refresh"
    );

    let outcome = app
        .recommendations
        .refresh()
        .await
        .map_err(refresh_to_app_error)?;
    log_refresh_outcome(&outcome);
    Ok(())
}

fn log_refresh_outcome(outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Completed { task_id, books } => info!(
            target = "lectern::refresh",
            task_id = %task_id,
            books = books.len(),
            "Refresh completed"
        ),
        RefreshOutcome::Skipped { task_id } => info!(
            target = "lectern::refresh",
            task_id = %task_id,
            "Refresh skipped: already completed today"
        ),
    }
}

fn refresh_to_app_error(err: RecommendationError) -> AppError {
    match err {
        RecommendationError::Store(repo) => {
            AppError::from(InfraError::database(repo.to_string()))
        }
        RecommendationError::Cache(cache) => AppError::from(InfraError::cache(cache.to_string())),
    }
}

struct ApplicationContext {
    api_state: ApiState,
    recommendations: Arc<RecommendationService>,
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let books_repo: Arc<dyn BooksRepo> = repositories.clone();
    let books_write_repo: Arc<dyn BooksWriteRepo> = repositories;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache_config = CacheConfig::from(&settings.cache);
    let cache_store: Arc<dyn CacheStore> = cache::connect(&cache_config, clock.clone())
        .await
        .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;

    info!(
        target = "lectern::startup",
        backend = %cache_config.backend,
        "Cache backend ready"
    );

    let books = Arc::new(BookService::new(books_repo.clone(), books_write_repo));
    let recommendations = Arc::new(RecommendationService::new(
        books_repo,
        cache_store,
        clock,
        RecommendationConfig::from(&settings.recommendations),
    ));

    let api_state = ApiState {
        books,
        recommendations: recommendations.clone(),
    };

    Ok(ApplicationContext {
        api_state,
        recommendations,
    })
}

fn spawn_job_monitor(
    recommendations: Arc<RecommendationService>,
    settings: &config::Settings,
) -> tokio::task::JoinHandle<()> {
    let schedule = settings.recommendations.schedule.clone();

    let refresh_worker = WorkerBuilder::new(REFRESH_WORKER_NAME)
        .data(RefreshRecommendationsContext { recommendations })
        .backend(CronStream::new(schedule))
        .build_fn(process_refresh_recommendations_job);

    let monitor = Monitor::new().register(refresh_worker);

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    })
}

async fn serve_http(settings: &config::Settings, api_state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(api_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "lectern::startup",
        addr = %settings.server.addr,
        "HTTP server listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!(target = "lectern::shutdown", "Shutdown signal received");
}
