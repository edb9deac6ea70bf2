use std::sync::Arc;

use chrono::TimeDelta;
use dashmap::DashMap;
use tracing::{info, warn};

use crate::errors::RegistryError;
use crate::instance::{Registration, ServiceInstance};
use crate::time::{Clock, SystemClock};

/// The contract every collaborator uses to talk to the registry.
///
/// "Not found" is never an error: unknown names give empty lists or `None`,
/// unknown ids give `false`. `Err` is reserved for rejected input and
/// internal faults.
pub trait ServiceRegistry: Send + Sync {
    fn register(&self, registration: Registration) -> Result<bool, RegistryError>;
    fn deregister(&self, service_id: &str) -> Result<bool, RegistryError>;
    fn discover(&self, service_name: &str) -> Result<Vec<ServiceInstance>, RegistryError>;
    fn healthy_instance(&self, service_name: &str)
        -> Result<Option<ServiceInstance>, RegistryError>;
}

/// Shared handle passed to every consumer of the registry.
pub type SharedRegistry = Arc<dyn ServiceRegistry>;

/// Ephemeral, process-local membership table.
///
/// Buckets are keyed by service name and live in a sharded map, so every
/// operation on one bucket runs under that shard's lock from read to write.
pub struct InMemoryRegistry {
    services: DashMap<String, Vec<ServiceInstance>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            services: DashMap::new(),
            clock,
        }
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Self::new())
    }
}

#[cfg(test)]
impl InMemoryRegistry {
    /// Every instance in a bucket, healthy or not.
    fn instances(&self, service_name: &str) -> Vec<ServiceInstance> {
        self.services
            .get(service_name)
            .map(|bucket| bucket.value().clone())
            .unwrap_or_default()
    }

    fn instance_count(&self) -> usize {
        self.services.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry for InMemoryRegistry {
    fn register(&self, registration: Registration) -> Result<bool, RegistryError> {
        registration.validate()?;

        let now = self.clock.now();
        let service_name = registration.service_name.clone();
        let service_id = registration.service_id.clone();
        let address = format!("{}:{}", registration.host, registration.port);

        let mut bucket = self.services.entry(service_name.clone()).or_default();
        match bucket.iter().position(|i| i.service_id == service_id) {
            Some(pos) => bucket[pos].refresh(registration, now),
            None => bucket.push(ServiceInstance::new(registration, now)),
        }
        drop(bucket);

        info!(
            service_name = %service_name,
            service_id = %service_id,
            address = %address,
            "Service registered"
        );
        Ok(true)
    }

    /// Removes one instance per call. Ids are only unique within a family,
    /// so when several families share an id the shard order decides which
    /// one goes first.
    fn deregister(&self, service_id: &str) -> Result<bool, RegistryError> {
        for mut bucket in self.services.iter_mut() {
            if let Some(pos) = bucket.iter().position(|i| i.service_id == service_id) {
                let removed = bucket.remove(pos);
                info!(
                    service_name = %removed.service_name,
                    service_id,
                    "Service deregistered"
                );
                return Ok(true);
            }
        }

        warn!(service_id, "Service not found for deregistration");
        Ok(false)
    }

    fn discover(&self, service_name: &str) -> Result<Vec<ServiceInstance>, RegistryError> {
        let healthy: Vec<ServiceInstance> = match self.services.get(service_name) {
            Some(bucket) => bucket.iter().filter(|i| i.is_healthy).cloned().collect(),
            None => {
                info!(service_name, "No instances found for service");
                return Ok(Vec::new());
            }
        };

        info!(
            service_name,
            count = healthy.len(),
            "Discovered healthy instances"
        );
        Ok(healthy)
    }

    fn healthy_instance(
        &self,
        service_name: &str,
    ) -> Result<Option<ServiceInstance>, RegistryError> {
        let Some(mut bucket) = self.services.get_mut(service_name) else {
            warn!(service_name, "No healthy instances found for service");
            return Ok(None);
        };

        // Oldest check wins; ties go to the earliest registered.
        let mut selected: Option<usize> = None;
        for (idx, instance) in bucket.iter().enumerate() {
            if !instance.is_healthy {
                continue;
            }
            match selected {
                Some(current)
                    if bucket[current].last_health_check <= instance.last_health_check => {}
                _ => selected = Some(idx),
            }
        }

        let Some(idx) = selected else {
            warn!(service_name, "No healthy instances found for service");
            return Ok(None);
        };

        // Stamp strictly after every other replica so the next call moves on.
        let newest = bucket
            .iter()
            .filter(|i| i.is_healthy)
            .map(|i| i.last_health_check)
            .max();
        let now = self.clock.now();
        let stamp = match newest {
            Some(newest) => now.max(newest + TimeDelta::microseconds(1)),
            None => now,
        };

        let instance = &mut bucket[idx];
        instance.update_health_check(stamp);
        Ok(Some(instance.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;
    use std::thread;

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn at(ts: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(ts)))
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn reg(name: &str, id: &str, port: u16) -> Registration {
        Registration::new(name, id, "localhost", port)
    }

    #[test]
    fn re_registering_same_id_updates_in_place() {
        let registry = InMemoryRegistry::new();
        registry.register(reg("order-service", "o-1", 5004)).unwrap();
        registry
            .register(
                Registration::new("order-service", "o-1", "10.0.0.7", 6004).with_tags(["orders"]),
            )
            .unwrap();

        let instances = registry.discover("order-service").unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].host, "10.0.0.7");
        assert_eq!(instances[0].port, 6004);
        assert_eq!(instances[0].tags, vec!["orders".to_string()]);
    }

    #[test]
    fn discover_unknown_service_is_empty() {
        let registry = InMemoryRegistry::new();
        assert!(registry.discover("x").unwrap().is_empty());
    }

    #[test]
    fn deregister_removes_only_the_matching_instance() {
        let registry = InMemoryRegistry::new();
        registry.register(reg("order-service", "a", 1)).unwrap();
        registry.register(reg("order-service", "b", 2)).unwrap();

        assert!(registry.deregister("a").unwrap());

        let ids: Vec<String> = registry
            .discover("order-service")
            .unwrap()
            .into_iter()
            .map(|i| i.service_id)
            .collect();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[test]
    fn deregister_unknown_id_leaves_buckets_untouched() {
        let registry = InMemoryRegistry::new();
        registry.register(reg("user-service", "u-1", 1)).unwrap();
        registry.register(reg("product-service", "p-1", 2)).unwrap();
        let before_users = registry.instances("user-service");
        let before_products = registry.instances("product-service");

        assert!(!registry.deregister("missing").unwrap());

        assert_eq!(registry.instances("user-service"), before_users);
        assert_eq!(registry.instances("product-service"), before_products);
    }

    #[test]
    fn deregister_searches_every_family() {
        let registry = InMemoryRegistry::new();
        registry.register(reg("user-service", "u-1", 1)).unwrap();
        registry.register(reg("notification-service", "n-1", 2)).unwrap();

        assert!(registry.deregister("n-1").unwrap());
        assert!(registry.discover("notification-service").unwrap().is_empty());
        assert_eq!(registry.discover("user-service").unwrap().len(), 1);
    }

    #[test]
    fn deregister_removes_one_family_member_per_call_for_shared_ids() {
        let registry = InMemoryRegistry::new();
        registry.register(reg("user-service", "shared", 1)).unwrap();
        registry.register(reg("order-service", "shared", 2)).unwrap();

        assert!(registry.deregister("shared").unwrap());
        assert_eq!(registry.instance_count(), 1);

        assert!(registry.deregister("shared").unwrap());
        assert_eq!(registry.instance_count(), 0);
        assert!(!registry.deregister("shared").unwrap());
    }

    #[test]
    fn healthy_instance_rotates_through_replicas() {
        let registry = InMemoryRegistry::with_clock(FixedClock::at(epoch()));
        registry.register(reg("order-service", "a", 1)).unwrap();
        registry.register(reg("order-service", "b", 2)).unwrap();

        let first = registry.healthy_instance("order-service").unwrap().unwrap();
        let second = registry.healthy_instance("order-service").unwrap().unwrap();
        let third = registry.healthy_instance("order-service").unwrap().unwrap();

        assert_ne!(first.service_id, second.service_id);
        assert_eq!(first.service_id, third.service_id);
    }

    #[test]
    fn healthy_instance_prefers_oldest_check() {
        let clock = FixedClock::at(epoch());
        let registry = InMemoryRegistry::with_clock(clock.clone());
        registry.register(reg("user-service", "new", 1)).unwrap();
        *clock.0.lock().unwrap() = epoch() - TimeDelta::seconds(30);
        registry.register(reg("user-service", "old", 2)).unwrap();
        *clock.0.lock().unwrap() = epoch() + TimeDelta::seconds(30);

        let picked = registry.healthy_instance("user-service").unwrap().unwrap();
        assert_eq!(picked.service_id, "old");
        assert_eq!(picked.last_health_check, epoch() + TimeDelta::seconds(30));
    }

    #[test]
    fn healthy_instance_returns_none_for_unknown_or_emptied_bucket() {
        let registry = InMemoryRegistry::new();
        assert!(registry.healthy_instance("product-service").unwrap().is_none());

        registry.register(reg("product-service", "p-1", 1)).unwrap();
        registry.deregister("p-1").unwrap();
        assert!(registry.healthy_instance("product-service").unwrap().is_none());
    }

    #[test]
    fn returned_instances_are_snapshots() {
        let registry = InMemoryRegistry::new();
        registry.register(reg("user-service", "u-1", 1)).unwrap();

        let mut copy = registry.discover("user-service").unwrap();
        copy[0].host = "tampered".to_string();
        copy[0].is_healthy = false;

        let fresh = registry.discover("user-service").unwrap();
        assert_eq!(fresh[0].host, "localhost");
        assert!(fresh[0].is_healthy);
    }

    #[test]
    fn register_rejects_empty_identifiers() {
        let registry = InMemoryRegistry::new();
        assert!(matches!(
            registry.register(reg("", "id", 1)),
            Err(RegistryError::InvalidRegistration(_))
        ));
        assert!(matches!(
            registry.register(reg("user-service", " ", 1)),
            Err(RegistryError::InvalidRegistration(_))
        ));
        assert_eq!(registry.instance_count(), 0);
    }

    #[test]
    fn concurrent_registrations_keep_every_distinct_id() {
        let registry = InMemoryRegistry::new();
        let n: u16 = 64;

        thread::scope(|s| {
            for i in 0..n {
                let registry = &registry;
                s.spawn(move || {
                    registry
                        .register(reg("order-service", &format!("o-{i}"), 5000 + i))
                        .unwrap();
                });
            }
        });

        let mut ids: Vec<String> = registry
            .discover("order-service")
            .unwrap()
            .into_iter()
            .map(|i| i.service_id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), n as usize);
    }

    #[test]
    fn concurrent_re_registrations_of_one_id_never_duplicate() {
        let registry = InMemoryRegistry::new();

        thread::scope(|s| {
            for i in 0..32u16 {
                let registry = &registry;
                s.spawn(move || {
                    registry.register(reg("user-service", "u-1", 6000 + i)).unwrap();
                });
            }
        });

        let instances = registry.instances("user-service");
        assert_eq!(instances.len(), 1);
        assert!((6000..6032).contains(&instances[0].port));
    }

    #[test]
    fn concurrent_deregister_and_discover_never_see_partial_state() {
        let registry = InMemoryRegistry::new();
        for i in 0..50u16 {
            registry
                .register(reg("product-service", &format!("p-{i}"), i))
                .unwrap();
        }

        thread::scope(|s| {
            s.spawn(|| {
                for i in 0..50u16 {
                    assert!(registry.deregister(&format!("p-{i}")).unwrap());
                }
            });
            s.spawn(|| {
                for _ in 0..200 {
                    let seen = registry.discover("product-service").unwrap();
                    let mut ids: Vec<&str> = seen.iter().map(|i| i.service_id.as_str()).collect();
                    let len = ids.len();
                    ids.sort();
                    ids.dedup();
                    assert_eq!(ids.len(), len);
                }
            });
        });

        assert!(registry.discover("product-service").unwrap().is_empty());
    }
}
