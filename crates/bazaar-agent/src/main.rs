//! Registration sidecar for a domain service.
//!
//! Registers the configured service with the registry after a short delay,
//! then idles until Ctrl+C / SIGTERM.

use bazaar_agent::{spawn_registration, AgentConfig, AgentError, RegistryClient};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AgentError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AgentConfig::from_env()?;
    let client = RegistryClient::new(config.registry_url.clone());
    let registration = config.registration();
    let service_id = registration.service_id.clone();

    info!(
        service_name = %registration.service_name,
        service_id = %service_id,
        registry = %config.registry_url,
        delay_ms = config.register_delay_ms,
        "Scheduling self-registration"
    );
    // Detached; its outcome is only logged.
    let _ = spawn_registration(client.clone(), registration, config.register_delay());

    shutdown_signal().await;

    if config.deregister_on_shutdown {
        match client.deregister(&service_id).await {
            Ok(true) => info!(service_id = %service_id, "Deregistered on shutdown"),
            Ok(false) => warn!(service_id = %service_id, "Registry did not know this instance"),
            Err(e) => error!(service_id = %service_id, error = %e, "Deregistration failed"),
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
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

    info!("signal received, shutting down");
}
