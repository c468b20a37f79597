// Main entry point for the mesh broker proxy

use mesh_broker_proxy::api::{create_router, AppState};
use mesh_broker_proxy::config::Config;
use mesh_broker_proxy::interceptor::build_interceptor;
use mesh_broker_proxy::proxy::{OsbClient, RestClient};

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config)?;

    info!(
        bind_address = %config.bind_address,
        port = config.port,
        forward_url = %config.forward_url,
        role = %config.role,
        "Starting mesh broker proxy"
    );

    let rest = RestClient::new(
        &config.forward_url,
        config.upstream_timeout_secs,
        config.upstream_accept_invalid_certs,
    )?;
    let broker = Arc::new(OsbClient::new(rest));
    let interceptor = build_interceptor(&config)?;
    if interceptor.has_adapt_credentials() {
        info!("adapt_credentials endpoint enabled");
    }

    let addr = format!("{}:{}", config.bind_address, config.port);
    let app_state = AppState::new(broker, interceptor, Arc::new(config));
    let router = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!(error = %e, address = %addr, "Failed to bind listener");
        e
    })?;
    info!(address = %addr, "Listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence over `LOG_LEVEL`.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let level = parse_log_level(&config.log_level)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    if config.log_format == "json" {
        subscriber.json().try_init().map_err(|e| anyhow::anyhow!(e))?;
    } else {
        subscriber.try_init().map_err(|e| anyhow::anyhow!(e))?;
    }

    Ok(())
}

fn parse_log_level(level: &str) -> anyhow::Result<tracing::Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {}", level),
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
