use thiserror::Error;

/// Crate-level error type
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TEAMCITY_ADMIN_TOKEN environment variable not set")]
    MissingToken,

    #[error("{operation} failed (HTTP {status}): {body}")]
    Api {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DeployError {
    /// HTTP status of the failed call, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeployError::Api { status, .. } => Some(*status),
            DeployError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
