pub mod envelope;
pub mod errors;
pub mod gateway;
pub mod health;
pub mod instance;
pub mod registry;
pub mod routes;
pub mod time;

pub use envelope::ApiResponse;
pub use errors::RegistryError;
pub use gateway::{Gateway, GatewayStatus, ServiceSummary, KNOWN_SERVICES};
pub use health::HealthStatus;
pub use instance::{Registration, ServiceInstance};
pub use registry::{InMemoryRegistry, ServiceRegistry, SharedRegistry};
pub use routes::{route_catalog, ServiceRoutes};
pub use time::{Clock, SystemClock};
