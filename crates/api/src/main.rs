//! API server entry point.

use std::future::IntoFuture;

use api::config::Config;
use checkout::{JobRegistry, Sweeper};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

enum Exit {
    Server(std::io::Result<()>),
    Sweeper(checkout::Result<()>),
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Create the registry and start expiring jobs
    let registry = JobRegistry::new(config.registry_config());
    let mut sweeper = Sweeper::new(registry.clone(), config.sweep_interval).spawn();
    tracing::info!(
        budget_secs = config.budget.as_secs(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        store = %config.store_label,
        "checkout registry ready"
    );

    // 4. Build the application
    let state = api::create_state(registry, Some(sweeper.status()));
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    // 6. Serve until shutdown, or until the sweeper dies
    let exit = tokio::select! {
        result = server => Exit::Server(result),
        outcome = sweeper.wait() => Exit::Sweeper(outcome),
    };

    match exit {
        Exit::Server(result) => {
            result.expect("server error");
            if let Err(err) = sweeper.shutdown().await {
                tracing::error!(error = %err, "sweeper did not stop cleanly");
            }
            tracing::info!("server shut down gracefully");
        }
        Exit::Sweeper(Ok(())) => {
            tracing::warn!("timeout sweeper stopped on request, shutting down");
        }
        Exit::Sweeper(Err(err)) => {
            tracing::error!(error = %err, "timeout sweeper died, transactions can no longer expire");
            std::process::exit(1);
        }
    }
}
