use thiserror::Error;

/// Failures reported by the Ollama client. No retries happen at this layer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection refused by Ollama at '{url}'")]
    ConnectionRefused { url: String },

    #[error("failed to connect to Ollama at '{url}': {reason}")]
    Connection { url: String, reason: String },

    #[error("unrecognized response from '{url}': {reason}")]
    Protocol { url: String, reason: String },

    #[error("model '{model}' not found")]
    ModelNotFound { model: String },

    #[error("request to '{url}' timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("{0}")]
    Invocation(String),
}

impl ClientError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::ConnectionRefused { .. } | Self::Connection { .. })
    }

    /// Structured variants map directly; free-form server text falls back to
    /// [`FailureKind::from_message`].
    pub fn failure_kind(&self, model: &str) -> FailureKind {
        match self {
            Self::ConnectionRefused { .. } | Self::Connection { .. } => FailureKind::Connectivity,
            Self::ModelNotFound { .. } => FailureKind::ModelNotFound,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Protocol { .. } => FailureKind::Other,
            Self::Invocation(message) => FailureKind::from_message(message, model),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connectivity,
    ModelNotFound,
    Timeout,
    Other,
}

impl FailureKind {
    /// Ordered, case-insensitive substring table:
    ///
    /// | substring                              | kind            |
    /// |----------------------------------------|-----------------|
    /// | `connection refused`                   | `Connectivity`  |
    /// | `not found` (and the model is named)   | `ModelNotFound` |
    /// | `timeout` / `timed out`                | `Timeout`       |
    /// | anything else                          | `Other`         |
    pub fn from_message(message: &str, model: &str) -> Self {
        let lowered = message.to_lowercase();
        if lowered.contains("connection refused") {
            Self::Connectivity
        } else if lowered.contains("not found")
            && !model.is_empty()
            && lowered.contains(&model.to_lowercase())
        {
            Self::ModelNotFound
        } else if lowered.contains("timeout") || lowered.contains("timed out") {
            Self::Timeout
        } else {
            Self::Other
        }
    }

    pub fn remediation(&self, model: &str, detail: &str) -> String {
        match self {
            Self::Connectivity => "Error: Could not connect to Ollama server. Please make sure it's running by executing 'ollama serve' in a terminal.".to_string(),
            Self::ModelNotFound => format!(
                "Error: Model '{model}' not found. You may need to download it first with 'ollama pull {model}'."
            ),
            Self::Timeout => "Error: The request timed out. The model might be too large for your system or Ollama might be busy.".to_string(),
            Self::Other => format!(
                "Error getting response: {detail}\n\nPlease check if Ollama is running correctly."
            ),
        }
    }
}
