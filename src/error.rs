use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Shown for network and timeout failures instead of transport details.
pub const GENERIC_NETWORK_MESSAGE: &str = "Network error, please try again";

/// Every failure a flow operation can surface to its caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Status outside `[200, 300)`.
    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        payload: Option<Value>,
    },

    /// A successful response whose body does not have the expected structure.
    #[error("invalid data structure received from server: {0}")]
    DataShape(String),

    /// A single-flight operation is already running.
    #[error("{0}")]
    Busy(String),

    /// The owning flow was torn down before the call resolved.
    #[error("operation cancelled")]
    Cancelled,

    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Build a server error from a status and the raw response body.
    ///
    /// The message is taken from the body's `message`, `error` or `detail`
    /// field when the body is a JSON object carrying one.
    pub fn from_response(status: u16, body: &str) -> Self {
        let payload = serde_json::from_str::<Value>(body).ok();
        let message = payload
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| format!("Server error: {}", status));
        Error::Server {
            status,
            message,
            payload,
        }
    }

    /// Human-readable message carried by the error.
    pub fn message(&self) -> String {
        match self {
            Error::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error payload returned by the server, when it sent parseable JSON.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Error::Server { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// Text suitable for an alert shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) | Error::Timeout(_) => GENERIC_NETWORK_MESSAGE.to_string(),
            Error::DataShape(_) => "Received an unexpected response, please try again".to_string(),
            Error::Storage(_) => "Could not save your ingredients on this device".to_string(),
            other => other.message(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Storage(err)
    }
}

fn extract_message(payload: &Value) -> Option<String> {
    let obj = payload.as_object()?;
    ["message", "error", "detail"].iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Null => None,
        other if !other.is_string() => Some(other.to_string()),
        _ => None,
    })
}
