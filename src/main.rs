use std::{future::IntoFuture, process, sync::Arc};

use apalis::{
    layers::WorkerBuilderExt,
    prelude::{Monitor, WorkerBuilder, WorkerFactoryFn},
};
use apalis_sql::{Config as ApalisSqlConfig, postgres::PostgresStorage};
use carte::{
    application::{
        catalog::{DishService, MenuService, SubmenuService},
        error::AppError,
        export::ExportService,
        jobs::{ExportJobContext, process_export_menus_job},
        repos::{
            CatalogTreeRepo, DishesRepo, DishesWriteRepo, JobsRepo, MenusRepo, MenusWriteRepo,
            SubmenusRepo, SubmenusWriteRepo,
        },
        seed::seed_demo_catalog,
    },
    cache::{self, CacheConfig, CacheGateway},
    config,
    domain::types::JobType,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tokio::sync::watch;
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
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Seed(_) => run_seed(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (http_repositories, job_repositories) = init_repositories(&settings).await?;
    let cache_gateway = connect_cache(&settings).await?;
    let app = build_application_context(http_repositories, cache_gateway, &settings);

    let monitor_handle = spawn_job_monitor(job_repositories, app.job_context, &settings.exports);

    let result = serve_http(&settings, app.api_state).await;

    monitor_handle.abort();
    let _ = monitor_handle.await;

    result
}

async fn run_seed(settings: config::Settings) -> Result<(), AppError> {
    let (http_repositories, _) = init_repositories(&settings).await?;
    let cache_gateway = connect_cache(&settings).await?;
    let app = build_application_context(http_repositories, cache_gateway, &settings);

    let summary = seed_demo_catalog(
        &app.api_state.menus,
        &app.api_state.submenus,
        &app.api_state.dishes,
    )
    .await?;

    info!(
        menus = summary.menus,
        submenus = summary.submenus,
        dishes = summary.dishes,
        "seed completed"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<(Arc<PostgresRepositories>, Arc<PostgresRepositories>), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let http_pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&http_pool)
        .await
        .map_err(InfraError::from)?;
    PostgresStorage::<()>::setup(&http_pool)
        .await
        .map_err(|err| InfraError::database(format!("job queue setup failed: {err}")))?;

    let jobs_pool = PostgresRepositories::connect(
        database_url,
        settings.database.jobs_max_connections.get(),
    )
    .await
    .map_err(InfraError::from)?;

    let http_repositories = Arc::new(PostgresRepositories::new(http_pool));
    http_repositories
        .health_check()
        .await
        .map_err(InfraError::from)?;

    Ok((
        http_repositories,
        Arc::new(PostgresRepositories::new(jobs_pool)),
    ))
}

async fn connect_cache(settings: &config::Settings) -> Result<CacheGateway, AppError> {
    let cache_config = CacheConfig::from(&settings.cache);
    let backend = cache::connect_backend(&cache_config)
        .await
        .map_err(InfraError::from)?;

    info!(
        backend = cache_config.backend.as_str(),
        invalidate_after_write = cache_config.invalidate_after_write,
        "cache backend ready"
    );
    Ok(CacheGateway::new(backend, &cache_config))
}

struct ApplicationContext {
    api_state: ApiState,
    job_context: ExportJobContext,
}

fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    cache_gateway: CacheGateway,
    settings: &config::Settings,
) -> ApplicationContext {
    let menus_repo: Arc<dyn MenusRepo> = repositories.clone();
    let menus_write_repo: Arc<dyn MenusWriteRepo> = repositories.clone();
    let submenus_repo: Arc<dyn SubmenusRepo> = repositories.clone();
    let submenus_write_repo: Arc<dyn SubmenusWriteRepo> = repositories.clone();
    let dishes_repo: Arc<dyn DishesRepo> = repositories.clone();
    let dishes_write_repo: Arc<dyn DishesWriteRepo> = repositories.clone();
    let tree_repo: Arc<dyn CatalogTreeRepo> = repositories.clone();
    let jobs_repo: Arc<dyn JobsRepo> = repositories;

    let directory = settings.exports.directory.clone();

    let api_state = ApiState {
        menus: Arc::new(MenuService::new(
            menus_repo,
            menus_write_repo,
            cache_gateway.clone(),
        )),
        submenus: Arc::new(SubmenuService::new(
            submenus_repo,
            submenus_write_repo,
            cache_gateway.clone(),
        )),
        dishes: Arc::new(DishService::new(
            dishes_repo,
            dishes_write_repo,
            cache_gateway,
        )),
        exports: Arc::new(ExportService::new(jobs_repo, directory.clone())),
    };

    ApplicationContext {
        api_state,
        job_context: ExportJobContext {
            catalog: tree_repo,
            directory,
        },
    }
}

fn spawn_job_monitor(
    repositories: Arc<PostgresRepositories>,
    context: ExportJobContext,
    exports: &config::ExportSettings,
) -> tokio::task::JoinHandle<()> {
    let export_storage = PostgresStorage::new_with_config(
        repositories.pool().clone(),
        ApalisSqlConfig::new(JobType::ExportMenus.as_str()),
    );

    let export_worker = WorkerBuilder::new("export-menus-worker")
        .concurrency(exports.concurrency.get() as usize)
        .data(context)
        .backend(export_storage)
        .build_fn(process_export_menus_job);

    let monitor = Monitor::new().register(export_worker);

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    })
}

async fn serve_http(settings: &config::Settings, api_state: ApiState) -> Result<(), AppError> {
    let router = http::build_api_router(api_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %settings.server.addr, "http listener bound");

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(stopped(stop_rx.clone()))
        .into_future();
    let grace = settings.server.graceful_shutdown;
    let deadline = async move {
        stopped(stop_rx).await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = deadline => {
            warn!(grace_seconds = grace.as_secs(), "graceful shutdown timed out");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            error!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

async fn stopped(mut stop: watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}
