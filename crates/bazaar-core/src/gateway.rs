//! Read-only, cross-service views over the registry.
//!
//! Every view walks the fixed list of known service families and asks the
//! registry about each one separately. A failed lookup for one family is
//! logged and reported as empty for that family only.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::health::HealthStatus;
use crate::instance::ServiceInstance;
use crate::registry::SharedRegistry;
use crate::routes::{route_catalog, ServiceRoutes};
use crate::time::{Clock, SystemClock};

pub const GATEWAY_NAME: &str = "Bazaar API Gateway";

pub const KNOWN_SERVICES: [&str; 4] = [
    "user-service",
    "product-service",
    "order-service",
    "notification-service",
];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub instance_count: usize,
    pub healthy_instances: usize,
    pub status: HealthStatus,
    pub last_checked: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub gateway: String,
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub services: BTreeMap<String, ServiceSummary>,
}

pub struct Gateway {
    registry: SharedRegistry,
    clock: Arc<dyn Clock>,
}

impl Gateway {
    pub fn new(registry: SharedRegistry) -> Self {
        Self::with_clock(registry, Arc::new(SystemClock))
    }

    pub fn with_clock(registry: SharedRegistry, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Instance counts and health per known family.
    pub fn status(&self) -> GatewayStatus {
        let checked_at = self.clock.now();
        let services = KNOWN_SERVICES
            .iter()
            .map(|name| (name.to_string(), self.summarize(name, checked_at)))
            .collect();

        GatewayStatus {
            gateway: GATEWAY_NAME.to_string(),
            status: HealthStatus::Healthy,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: checked_at,
            services,
        }
    }

    /// Full discovered instance list per known family.
    pub fn roster(&self) -> BTreeMap<String, Vec<ServiceInstance>> {
        KNOWN_SERVICES
            .iter()
            .map(|name| (name.to_string(), self.lookup(name).unwrap_or_default()))
            .collect()
    }

    pub fn instance_counts(&self) -> BTreeMap<String, usize> {
        KNOWN_SERVICES
            .iter()
            .map(|name| {
                let count = self.lookup(name).map(|i| i.len()).unwrap_or(0);
                (name.to_string(), count)
            })
            .collect()
    }

    pub fn routes(&self) -> Vec<ServiceRoutes> {
        route_catalog()
    }

    fn summarize(&self, service_name: &str, checked_at: DateTime<Utc>) -> ServiceSummary {
        match self.lookup(service_name) {
            Ok(instances) => {
                let healthy = instances.iter().filter(|i| i.is_healthy).count();
                ServiceSummary {
                    instance_count: instances.len(),
                    healthy_instances: healthy,
                    status: HealthStatus::from_healthy_count(healthy),
                    last_checked: checked_at,
                    error: None,
                }
            }
            Err(message) => ServiceSummary {
                instance_count: 0,
                healthy_instances: 0,
                status: HealthStatus::Unhealthy,
                last_checked: checked_at,
                error: Some(message),
            },
        }
    }

    fn lookup(&self, service_name: &str) -> Result<Vec<ServiceInstance>, String> {
        self.registry.discover(service_name).map_err(|e| {
            warn!(service_name, error = %e, "Registry lookup failed during aggregation");
            e.to_string()
        })
    }
}
