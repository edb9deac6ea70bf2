//! Client side of the registry: the HTTP client domain services use to
//! register and look up peers, and the delayed self-registration task.

pub mod client;
pub mod config;
pub mod error;
pub mod registration;

pub use client::RegistryClient;
pub use config::AgentConfig;
pub use error::AgentError;
pub use registration::spawn_registration;
