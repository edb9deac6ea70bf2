//! HTTP client for the registry and gateway endpoints.

use std::collections::BTreeMap;

use bazaar_core::{ApiResponse, GatewayStatus, Registration, ServiceInstance, ServiceRoutes};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::AgentError;

/// Networked counterpart of the in-process registry, for services that run
/// in their own process.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    server_url: String,
}

impl RegistryClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn register(&self, registration: &Registration) -> Result<bool, AgentError> {
        let res = self
            .client
            .post(self.endpoint(&["api", "registry", "register"])?)
            .json(registration)
            .send()
            .await?;
        let (status, envelope) = read_envelope::<bool>(res).await?;
        if !status.is_success() {
            return Err(api_error(status, envelope));
        }
        Ok(envelope.data.unwrap_or(false))
    }

    /// `Ok(false)` when the registry does not know the id.
    pub async fn deregister(&self, service_id: &str) -> Result<bool, AgentError> {
        let res = self
            .client
            .delete(self.endpoint(&["api", "registry", "deregister", service_id])?)
            .send()
            .await?;
        let (status, envelope) = read_envelope::<bool>(res).await?;
        match status {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(envelope.data.unwrap_or(false)),
            s => Err(api_error(s, envelope)),
        }
    }

    pub async fn discover(&self, service_name: &str) -> Result<Vec<ServiceInstance>, AgentError> {
        self.get_data(&["api", "registry", "discover", service_name])
            .await
            .map(Option::unwrap_or_default)
    }

    /// `Ok(None)` when the family has no healthy instance.
    pub async fn healthy_instance(
        &self,
        service_name: &str,
    ) -> Result<Option<ServiceInstance>, AgentError> {
        let res = self
            .client
            .get(self.endpoint(&["api", "registry", "instance", service_name])?)
            .send()
            .await?;
        let (status, envelope) = read_envelope::<ServiceInstance>(res).await?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(envelope.data),
            s => Err(api_error(s, envelope)),
        }
    }

    pub async fn instance_counts(&self) -> Result<BTreeMap<String, usize>, AgentError> {
        self.get_data(&["api", "registry", "services"])
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn gateway_status(&self) -> Result<Option<GatewayStatus>, AgentError> {
        self.get_data(&["api", "gateway", "status"]).await
    }

    pub async fn roster(&self) -> Result<BTreeMap<String, Vec<ServiceInstance>>, AgentError> {
        self.get_data(&["api", "gateway", "services"])
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn routes(&self) -> Result<Vec<ServiceRoutes>, AgentError> {
        self.get_data(&["api", "gateway", "routes"])
            .await
            .map(Option::unwrap_or_default)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Option<T>, AgentError> {
        let res = self.client.get(self.endpoint(segments)?).send().await?;
        let (status, envelope) = read_envelope::<T>(res).await?;
        if !status.is_success() {
            return Err(api_error(status, envelope));
        }
        Ok(envelope.data)
    }

    /// Each segment is percent-encoded, so ids and names containing `/`,
    /// `?` or `#` stay inside their own path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AgentError> {
        let mut url = Url::parse(&self.server_url)
            .map_err(|e| AgentError::InvalidUrl(format!("{}: {}", self.server_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AgentError::InvalidUrl(self.server_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn read_envelope<T: DeserializeOwned>(
    res: Response,
) -> Result<(StatusCode, ApiResponse<T>), AgentError> {
    let status = res.status();
    let body = res.text().await?;
    match serde_json::from_str::<ApiResponse<T>>(&body) {
        Ok(envelope) => Ok((status, envelope)),
        Err(_) => Err(AgentError::Api {
            status: status.as_u16(),
            message: body,
        }),
    }
}

fn api_error<T>(status: StatusCode, envelope: ApiResponse<T>) -> AgentError {
    AgentError::Api {
        status: status.as_u16(),
        message: envelope
            .message
            .unwrap_or_else(|| status.to_string()),
    }
}
