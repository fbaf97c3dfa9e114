use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use caretrack_core::constants::{
    DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_PATIENT_DATA_DIR,
};
use caretrack_core::{
    page_size_from_env_value, store_backend_from_env_value, CoreConfig, PatientService,
};

/// Main entry point for the CareTrack service
///
/// Resolves configuration from the environment once, opens the record store and serves the
/// REST API until Ctrl-C or SIGTERM.
///
/// # Environment Variables
/// - `CARETRACK_REST_ADDR`: REST server address (default: "0.0.0.0:5000")
/// - `PATIENT_DATA_DIR`: Directory for patient data storage (default: "patient_data")
/// - `CARETRACK_STORE`: `file` (default) or `memory`
/// - `CARETRACK_DEFAULT_PAGE_SIZE`: advanced-search page size when none is given (default: 10)
/// - `CARETRACK_MAX_PAGE_SIZE`: upper bound on a requested page size (default: 100)
/// - `RUST_LOG`: tracing filter, added to the default `info` level for CareTrack crates
///
/// # Errors
/// Returns an error if:
/// - the logging configuration or any environment value is invalid,
/// - the record store cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("caretrack_run=info".parse()?)
                .add_directive("caretrack_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("CARETRACK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".into());
    let patient_data_dir = std::env::var("PATIENT_DATA_DIR")
        .unwrap_or_else(|_| DEFAULT_PATIENT_DATA_DIR.into());

    let cfg = Arc::new(CoreConfig::new(
        PathBuf::from(patient_data_dir),
        store_backend_from_env_value(std::env::var("CARETRACK_STORE").ok())?,
        page_size_from_env_value(
            std::env::var("CARETRACK_DEFAULT_PAGE_SIZE").ok(),
            DEFAULT_PAGE_SIZE,
        )?,
        page_size_from_env_value(
            std::env::var("CARETRACK_MAX_PAGE_SIZE").ok(),
            DEFAULT_MAX_PAGE_SIZE,
        )?,
    )?);

    tracing::info!(
        "++ Opening {:?} store at {}",
        cfg.store_backend(),
        cfg.patient_data_dir().display()
    );
    let patient_service = PatientService::open(cfg)?;

    let app = api_rest::router(AppState { patient_service });

    tracing::info!("++ Starting CareTrack REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- CareTrack stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {}", e);
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
