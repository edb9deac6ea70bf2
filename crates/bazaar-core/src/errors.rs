/// Domain errors for the registry core.
///
/// Lookups that find nothing are not errors: they come back as empty lists,
/// `false` or `None`. Only rejected input and internal faults land here.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("Internal registry error: {0}")]
    Internal(String),
}
