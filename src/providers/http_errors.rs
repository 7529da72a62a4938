use reqwest::StatusCode;
use serde::Deserialize;
use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::ConnectionRefused
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("connection refused")
        {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::TimedOut
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("timed out")
        {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_text(err: &(dyn StdError + 'static)) -> String {
    let mut parts = Vec::new();
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

pub(crate) fn request_error(err: reqwest::Error, api_url: &str, timeout_secs: u64) -> ClientError {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return ClientError::Timeout {
            url: api_url.to_string(),
            timeout_secs,
        };
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return ClientError::ConnectionRefused {
                url: api_url.to_string(),
            };
        }

        return ClientError::Connection {
            url: api_url.to_string(),
            reason: error_chain_text(&err),
        };
    }

    ClientError::Invocation(format!(
        "Failed to call Ollama API at '{}': {}",
        api_url,
        error_chain_text(&err)
    ))
}

/// Ollama reports failures as `{"error": "..."}`; anything else is kept verbatim.
pub(crate) fn server_error_message(body: &str) -> String {
    serde_json::from_str::<OllamaErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// A 404 whose message mentions a model means the model is not installed;
/// a bare 404 means the endpoint itself is missing.
pub(crate) fn is_model_not_found(status: StatusCode, message: &str) -> bool {
    status == StatusCode::NOT_FOUND && message.to_ascii_lowercase().contains("model")
}

pub(crate) fn status_error(
    status: StatusCode,
    body: &str,
    model: Option<&str>,
) -> ClientError {
    let message = server_error_message(body);
    if let Some(model) = model
        && is_model_not_found(status, &message)
    {
        return ClientError::ModelNotFound {
            model: model.to_string(),
        };
    }

    ClientError::Invocation(format!(
        "Ollama request failed with status {}: {}",
        status, message
    ))
}
