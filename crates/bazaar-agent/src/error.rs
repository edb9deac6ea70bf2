#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("request to registry failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry responded with {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid registry url: {0}")]
    InvalidUrl(String),

    #[error("invalid agent configuration: {0}")]
    Config(#[from] envy::Error),
}
