use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    /// Status of a service family given how many healthy replicas it has.
    pub fn from_healthy_count(healthy: usize) -> Self {
        if healthy > 0 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unknown
        }
    }
}
