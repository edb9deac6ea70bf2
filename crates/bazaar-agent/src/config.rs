//! Sidecar configuration, read from `BAZAAR_AGENT_*` environment variables.

use std::time::Duration;

use bazaar_core::Registration;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub service_name: String,
    /// Generated from the service name when unset.
    pub service_id: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Comma-separated `key=value` pairs.
    #[serde(default)]
    pub metadata: Vec<String>,
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
    #[serde(default = "default_register_delay_ms")]
    pub register_delay_ms: u64,
    /// Off by default: services have never removed themselves on exit.
    #[serde(default)]
    pub deregister_on_shutdown: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_registry_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_register_delay_ms() -> u64 {
    2000
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("BAZAAR_AGENT_").from_env()
    }

    pub fn register_delay(&self) -> Duration {
        Duration::from_millis(self.register_delay_ms)
    }

    pub fn registration(&self) -> Registration {
        let service_id = self
            .service_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.service_name, Uuid::new_v4().simple()));

        Registration::new(&self.service_name, service_id, &self.host, self.port)
            .with_tags(self.tags.iter().cloned())
            .with_metadata_pairs(&self.metadata)
    }
}
