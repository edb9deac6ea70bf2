use std::time::Duration;

use bazaar_core::Registration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::client::RegistryClient;

/// Register with the registry once, `delay` after startup.
///
/// The task is detached: callers may drop the handle. Its outcome is only
/// logged and never blocks or fails the caller's startup.
pub fn spawn_registration(
    client: RegistryClient,
    registration: Registration,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        match client.register(&registration).await {
            Ok(true) => info!(
                service_name = %registration.service_name,
                service_id = %registration.service_id,
                registry = client.server_url(),
                "Self-registration completed"
            ),
            Ok(false) => warn!(
                service_name = %registration.service_name,
                service_id = %registration.service_id,
                "Registry declined self-registration"
            ),
            Err(e) => error!(
                service_name = %registration.service_name,
                service_id = %registration.service_id,
                error = %e,
                "Self-registration failed"
            ),
        }
    })
}
