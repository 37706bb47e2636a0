use serde::Serialize;
use thiserror::Error;

/// Structured error type for the agent. Callers at the chat/agent boundary turn
/// these into user-facing messages; nothing here is meant to abort the host.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No schematic is open")]
    NoDocument,
    #[error("Invalid {what} index: {index}")]
    InvalidIndex { what: String, index: usize },
    #[error("{message}")]
    Validation { message: String },
    #[error("Ollama request failed: {message}")]
    Transport { message: String },
    #[error("Ollama error: {message}")]
    Server { message: String },
    #[error("Failed to parse Ollama response: {message}")]
    MalformedResponse { message: String },
    #[error("Ollama server not available at {base_url}")]
    ServerUnavailable { base_url: String },
    #[error("Failed to initialize Ollama client: {message}")]
    ClientUnavailable { message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AppError::MalformedResponse {
                message: e.to_string(),
            }
        } else {
            AppError::Transport {
                message: e.to_string(),
            }
        }
    }
}

impl Serialize for AppError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn server_error_keeps_message_verbatim() {
        let e = AppError::Server {
            message: "model 'llama9' not found".into(),
        };
        assert_eq!(e.to_string(), "Ollama error: model 'llama9' not found");
    }

    #[test]
    fn serializes_as_display_string() {
        let json = serde_json::to_string(&AppError::NoDocument).unwrap();
        assert_eq!(json, "\"No schematic is open\"");
    }
}
