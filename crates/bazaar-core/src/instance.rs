use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::RegistryError;

/// One running replica of a named service, as held by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    pub service_name: String,
    /// Unique within `service_name`; the key for update-in-place and deregistration.
    pub service_id: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub is_healthy: bool,
    pub last_health_check: DateTime<Utc>,
}

impl ServiceInstance {
    pub fn new(registration: Registration, timestamp: DateTime<Utc>) -> Self {
        Self {
            service_name: registration.service_name,
            service_id: registration.service_id,
            host: registration.host,
            port: registration.port,
            tags: dedup_tags(registration.tags),
            metadata: registration.metadata,
            is_healthy: true,
            last_health_check: timestamp,
        }
    }

    /// Overwrite location, tags and metadata from a repeat registration and
    /// mark the instance healthy again.
    pub fn refresh(&mut self, registration: Registration, timestamp: DateTime<Utc>) {
        self.host = registration.host;
        self.port = registration.port;
        self.tags = dedup_tags(registration.tags);
        self.metadata = registration.metadata;
        self.is_healthy = true;
        self.last_health_check = timestamp;
    }

    pub fn update_health_check(&mut self, timestamp: DateTime<Utc>) {
        self.last_health_check = timestamp;
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Registration request for a service instance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Missing identifiers deserialize as empty and are rejected by `validate`.
    #[serde(default)]
    #[schema(example = "order-service")]
    pub service_name: String,
    #[serde(default)]
    #[schema(example = "order-service-7f3a")]
    pub service_id: String,
    #[serde(default)]
    #[schema(example = "localhost")]
    pub host: String,
    #[serde(default)]
    #[schema(example = 5004)]
    pub port: u16,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Registration {
    pub fn new(
        service_name: impl Into<String>,
        service_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_id: service_id.into(),
            host: host.into(),
            port,
            tags: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Apply `key=value` pairs as metadata. Pairs without `=` are skipped.
    pub fn with_metadata_pairs<I, S>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pair in pairs {
            if let Some((key, value)) = pair.as_ref().split_once('=') {
                let key = key.trim();
                if !key.is_empty() {
                    self.add_metadata(key, value.trim());
                }
            }
        }
        self
    }

    /// Reject registrations that could never be addressed again.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.service_name.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration(
                "serviceName must not be empty".to_string(),
            ));
        }
        if self.service_id.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration(
                "serviceId must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_instance_is_healthy_and_collapses_duplicate_tags() {
        let reg = Registration::new("user-service", "u-1", "localhost", 5001)
            .with_tags(["users", "api", "users"]);
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let instance = ServiceInstance::new(reg, ts);

        assert!(instance.is_healthy);
        assert_eq!(instance.tags, vec!["users".to_string(), "api".to_string()]);
        assert_eq!(instance.last_health_check, ts);
        assert_eq!(instance.address(), "localhost:5001");
    }

    #[test]
    fn refresh_overwrites_location_and_metadata() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut instance = ServiceInstance::new(
            Registration::new("order-service", "o-1", "localhost", 5004),
            ts,
        );
        instance.is_healthy = false;

        let mut update = Registration::new("order-service", "o-1", "10.0.0.2", 6004);
        update.add_metadata("region", "eu-west");
        let later = ts + chrono::TimeDelta::seconds(5);
        instance.refresh(update, later);

        assert!(instance.is_healthy);
        assert_eq!(instance.address(), "10.0.0.2:6004");
        assert_eq!(instance.metadata.get("region").map(String::as_str), Some("eu-west"));
        assert_eq!(instance.last_health_check, later);
    }

    #[test]
    fn validate_rejects_blank_name_and_id() {
        let blank_name = Registration::new("  ", "id-1", "localhost", 1);
        assert!(matches!(
            blank_name.validate(),
            Err(RegistryError::InvalidRegistration(_))
        ));

        let blank_id = Registration::new("user-service", "", "localhost", 1);
        assert!(matches!(
            blank_id.validate(),
            Err(RegistryError::InvalidRegistration(_))
        ));

        assert!(Registration::new("user-service", "id-1", "localhost", 1)
            .validate()
            .is_ok());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let instance = ServiceInstance::new(
            Registration::new("order-service", "o-1", "localhost", 5004),
            ts,
        );

        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["serviceName"], "order-service");
        assert_eq!(json["serviceId"], "o-1");
        assert_eq!(json["isHealthy"], true);
        assert!(json.get("lastHealthCheck").is_some());
    }

    #[test]
    fn metadata_pairs_are_split_on_the_first_equals_sign() {
        let reg = Registration::new("user-service", "u-1", "localhost", 5001)
            .with_metadata_pairs(["region=eu-west", "build = a=b", "malformed", "=orphan"]);

        assert_eq!(reg.metadata.len(), 2);
        assert_eq!(reg.metadata["region"], "eu-west");
        assert_eq!(reg.metadata["build"], "a=b");
    }

    #[test]
    fn registration_without_identifiers_deserializes_and_fails_validation() {
        let reg: Registration =
            serde_json::from_str(r#"{"serviceId":"x","host":"h","port":1}"#).unwrap();
        assert_eq!(reg.service_name, "");
        assert!(matches!(
            reg.validate(),
            Err(RegistryError::InvalidRegistration(_))
        ));
    }

    #[test]
    fn registration_defaults_missing_tags_and_metadata() {
        let reg: Registration = serde_json::from_str(
            r#"{"serviceName":"product-service","serviceId":"p-1","host":"localhost","port":5002}"#,
        )
        .unwrap();
        assert!(reg.tags.is_empty());
        assert!(reg.metadata.is_empty());
    }
}
