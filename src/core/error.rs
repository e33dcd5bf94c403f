//! Error types for the promtail client

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Batch could not be serialized into a push payload
    #[error("JSON encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Endpoint answered with something other than 204 No Content
    #[error("Unexpected HTTP status code: {status}, message: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Network-level failure while talking to the endpoint
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Every allowed attempt failed with a retryable error
    #[error("Delivery failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ClientError>,
    },

    /// Invalid configuration with details
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfiguration { field: String, message: String },

    /// Label string that is not in canonical `{k="v",...}` form
    #[error("Invalid label string '{input}': {message}")]
    InvalidLabels { input: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Client already shut down
    #[error("Client already shut down")]
    ClientStopped,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ClientError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid label string error
    pub fn invalid_labels(input: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::InvalidLabels {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create an unexpected status error
    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        ClientError::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ClientError::Other(msg.into())
    }

    /// Whether this error came out of the delivery path (HTTP status,
    /// network failure or exhausted retries)
    pub fn is_delivery_error(&self) -> bool {
        matches!(
            self,
            ClientError::UnexpectedStatus { .. }
                | ClientError::Http(_)
                | ClientError::RetriesExhausted { .. }
        )
    }

    /// HTTP status code of the last response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::UnexpectedStatus { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}
