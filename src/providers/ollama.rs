use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ClientError;
use crate::providers::http_errors::{
    is_model_not_found, request_error, server_error_message, status_error,
};

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaVersionResponse {
    version: String,
}

fn api_url(base_url: &str, path: &str) -> String {
    format!("{}/api/{}", base_url.trim_end_matches('/'), path)
}

/// Normalizes both catalog shapes the server has used over time: a flat list
/// (of names or objects) and a `{"models": [...]}` mapping.
pub(crate) fn parse_catalog(body: &Value, url: &str) -> Result<Vec<String>, ClientError> {
    let protocol = |reason: String| ClientError::Protocol {
        url: url.to_string(),
        reason,
    };

    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("models") {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) => return Ok(Vec::new()),
            _ => return Err(protocol("expected a 'models' list".to_string())),
        },
        other => return Err(protocol(format!("unexpected catalog value: {other}"))),
    };

    entries
        .iter()
        .map(|entry| match entry {
            Value::String(name) => Ok(name.clone()),
            Value::Object(fields) => fields
                .get("name")
                .or_else(|| fields.get("model"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| protocol(format!("model entry without a name: {entry}"))),
            other => Err(protocol(format!("unknown model entry: {other}"))),
        })
        .collect()
}

async fn send_get(client: &Client, cfg: &Config, url: &str) -> Result<Response, ClientError> {
    client.get(url).send().await.map_err(|err| {
        warn!(api_url = %url, error = %err, "ollama request failed");
        request_error(err, url, cfg.model_timeout_secs)
    })
}

async fn read_failure(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read response body>".to_string());
    (status, body)
}

pub async fn list_models(client: &Client, cfg: &Config) -> Result<Vec<String>, ClientError> {
    let url = api_url(&cfg.model_base_url, "tags");
    debug!(api_url = %url, "listing ollama models");

    let response = send_get(client, cfg, &url).await?;
    if !response.status().is_success() {
        let (status, body) = read_failure(response).await;
        warn!(api_url = %url, status = %status, "ollama returned non-success status");
        return Err(status_error(status, &body, None));
    }

    let body: Value = response.json().await.map_err(|err| ClientError::Protocol {
        url: url.clone(),
        reason: err.to_string(),
    })?;
    let names = parse_catalog(&body, &url)?;
    debug!(model_count = names.len(), "received ollama catalog");
    Ok(names)
}

pub async fn version(client: &Client, cfg: &Config) -> Result<String, ClientError> {
    let url = api_url(&cfg.model_base_url, "version");
    let response = send_get(client, cfg, &url).await?;
    if !response.status().is_success() {
        let (status, body) = read_failure(response).await;
        return Err(status_error(status, &body, None));
    }

    let parsed: OllamaVersionResponse =
        response.json().await.map_err(|err| ClientError::Protocol {
            url: url.clone(),
            reason: err.to_string(),
        })?;
    Ok(parsed.version)
}

/// Calls `/api/generate`, falling back to `/api/chat` when the generate
/// endpoint itself is missing.
pub async fn generate(
    client: &Client,
    cfg: &Config,
    model: &str,
    prompt: &str,
) -> Result<String, ClientError> {
    let url = api_url(&cfg.model_base_url, "generate");
    let body = OllamaGenerateRequest {
        model,
        prompt,
        stream: false,
    };
    debug!(
        api_url = %url,
        model = %model,
        prompt_len = prompt.len(),
        "sending ollama generate request"
    );

    let response = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(api_url = %url, model = %model, error = %err, "ollama request failed");
            request_error(err, &url, cfg.model_timeout_secs)
        })?;

    if !response.status().is_success() {
        let (status, response_body) = read_failure(response).await;
        let message = server_error_message(&response_body);
        if status == StatusCode::NOT_FOUND && !is_model_not_found(status, &message) {
            warn!(
                api_url = %url,
                model = %model,
                "generate endpoint unavailable, falling back to chat"
            );
            return chat(client, cfg, model, prompt).await;
        }
        warn!(
            api_url = %url,
            model = %model,
            status = %status,
            response_body_len = response_body.len(),
            "ollama returned non-success status"
        );
        return Err(status_error(status, &response_body, Some(model)));
    }

    let parsed: OllamaGenerateResponse =
        response.json().await.map_err(|err| ClientError::Protocol {
            url: url.clone(),
            reason: err.to_string(),
        })?;
    debug!(
        model = %model,
        response_len = parsed.response.len(),
        "received ollama generate response"
    );
    Ok(parsed.response)
}

async fn chat(
    client: &Client,
    cfg: &Config,
    model: &str,
    prompt: &str,
) -> Result<String, ClientError> {
    let url = api_url(&cfg.model_base_url, "chat");
    let body = OllamaChatRequest {
        model,
        stream: false,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
    };
    debug!(api_url = %url, model = %model, "sending ollama chat request");

    let response = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(api_url = %url, model = %model, error = %err, "ollama request failed");
            request_error(err, &url, cfg.model_timeout_secs)
        })?;

    if !response.status().is_success() {
        let (status, response_body) = read_failure(response).await;
        warn!(
            api_url = %url,
            model = %model,
            status = %status,
            "ollama returned non-success status"
        );
        return Err(status_error(status, &response_body, Some(model)));
    }

    let parsed: OllamaChatResponse = response.json().await.map_err(|err| ClientError::Protocol {
        url: url.clone(),
        reason: err.to_string(),
    })?;
    Ok(parsed.message.content)
}
