use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediacopier_core::{
    create_store, load_config, load_or_empty, run_demo_pipeline, validate_config,
    FulfillmentService, HttpOrderIntake, JobQueue, LifecycleNotifier, OrderIntake, OrderPoller,
    Snapshotter,
};

use mediacopier_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    init_logging();

    let result = match std::env::args().nth(1).as_deref() {
        Some("demo") => run_demo().await,
        _ => run().await,
    };

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// `mediacopier demo [workdir]`: build a dummy library and print a dry-run
/// plan as JSON.
async fn run_demo() -> Result<()> {
    let workdir = std::env::args()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("mediacopier-demo"));

    info!("Running demo pipeline in {:?}", workdir);
    let report = run_demo_pipeline(&workdir)
        .await
        .context("Demo pipeline failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to encode demo report")?
    );
    Ok(())
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("MEDIACOPIER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Content roots: {}", config.catalog.roots.len());
    info!(
        "Persistence: {:?} at {:?}",
        config.persistence.backend,
        config.persistence.store_path()
    );

    // Open the job store and restore saved jobs before anything else can
    // add one
    let store = create_store(&config.persistence).context("Failed to open job store")?;
    let queue = Arc::new(JobQueue::new());
    let saved = load_or_empty(store.as_ref());
    let restored = queue
        .restore(saved)
        .context("Failed to restore saved jobs")?;
    info!("Restored {} saved jobs", restored);

    let service = Arc::new(FulfillmentService::new(&config, Arc::clone(&queue)));

    if config.catalog.index_on_startup {
        match service.refresh_catalog().await {
            Ok(report) => info!(
                "Catalog indexed: {} items, {} unreadable paths",
                report.items,
                report.failures.len()
            ),
            Err(e) => warn!("Initial catalog indexing failed: {}", e),
        }
    }

    // Periodic persistence
    let snapshotter = Snapshotter::new(
        Arc::clone(&queue),
        Arc::clone(&store),
        Duration::from_secs(config.persistence.interval_secs),
    );
    snapshotter.start().await;

    // Order intake, if configured
    let poller = match &config.intake {
        Some(intake_config) => {
            info!("Initializing order intake at {}", intake_config.base_url);
            let intake: Arc<dyn OrderIntake> = Arc::new(
                HttpOrderIntake::new(intake_config).context("Failed to create order intake")?,
            );
            if !intake.check_connection().await {
                warn!("Order service is not reachable yet; polling will keep trying");
            }

            LifecycleNotifier::new(Arc::clone(&intake)).spawn(&queue);

            let poller = OrderPoller::new(
                intake,
                Arc::clone(service.inbox()),
                Duration::from_secs(intake_config.poll_interval_secs),
            );
            poller.start().await;
            info!("Order poller started");
            Some(poller)
        }
        None => {
            info!("No order intake configured");
            None
        }
    };

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&service)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    if let Some(ref poller) = poller {
        info!("Stopping order poller...");
        poller.stop().await;
    }

    // Running jobs are saved as-is and come back as pending on restart
    if let Err(e) = snapshotter.shutdown().await {
        error!("Final snapshot failed, recent job changes may be lost: {}", e);
    }
    info!("Shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
