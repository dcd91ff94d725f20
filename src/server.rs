//! Dev server startup and shutdown.
//!
//! This module contains the `run_server` function which handles:
//! - Logging the bind address, host policy and proxy rules
//! - Handing the validated configuration to the hosting dev server
//! - Waiting for the host to stop

use crate::config::{RawServerConfig, ServerConfig};
use crate::error::AppResult;
use crate::host::DevServerHost;
use tracing::info;

/// Run the dev server with the given configuration.
///
/// # Arguments
///
/// * `config` - The validated dev server configuration
/// * `host` - The dev server that binds and serves with it
///
/// # Errors
///
/// Returns whatever error the host reports while starting or serving.
pub async fn run_server(config: &ServerConfig, host: &dyn DevServerHost) -> AppResult<()> {
    info!("Starting dev server...");
    log_plan(config);

    host.serve(config).await?;

    info!("Dev server shutdown complete");
    Ok(())
}

/// Validate a raw configuration and run the dev server with it.
///
/// A malformed configuration is returned as an error before the host is
/// touched.
pub async fn serve(raw: RawServerConfig, host: &dyn DevServerHost) -> AppResult<()> {
    let config = ServerConfig::try_from(raw)?;
    run_server(&config, host).await
}

/// Log the bind address, allowed hosts and each proxy rule.
pub fn log_plan(config: &ServerConfig) {
    info!("Bind address: {}", config.bind_address());
    info!("Allowed hosts: {}", config.allowed_hosts());

    for rule in config.proxy_rules() {
        info!(
            prefix = rule.match_prefix(),
            target = %rule.target(),
            change_origin = rule.change_origin(),
            rewrites = rule.path_rewrite().len(),
            "Proxy rule"
        );
    }
}

/// Create a future that resolves when a shutdown signal is received.
///
/// On Unix-like systems, this listens for both Ctrl+C (SIGINT) and SIGTERM.
/// On other platforms, it only listens for Ctrl+C.
///
/// # Panics
///
/// Panics if signal handler installation fails.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
