//! Non-interactive entry points: one-shot `ask`, `models` and `summarize`.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::collector::{MAX_ROLE_CHARS, MAX_STYLE_CHARS, SessionSettings, role_fits, style_fits};
use crate::config::Config;
use crate::model_gateway::{ModelGateway, OllamaGateway};
use crate::orchestrator::{QueryOrchestrator, QueryOutcome};
use crate::template::render_summary;

pub struct AskArgs {
    pub model: Option<String>,
    pub role: Option<String>,
    pub style: String,
    pub prompt: String,
}

fn settings_for(cfg: &Config, args: AskArgs) -> Result<(SessionSettings, String)> {
    let role = args
        .role
        .map(|role| role.trim().to_string())
        .filter(|role| !role.is_empty());
    if let Some(role) = role.as_deref()
        && !role_fits(role)
    {
        bail!("Role description too long. Please keep your description under {MAX_ROLE_CHARS} characters.");
    }

    let style = args.style.trim().to_string();
    if !style_fits(&style) {
        bail!("Style description must be between 1 and {MAX_STYLE_CHARS} characters.");
    }

    let prompt = args.prompt.trim().to_string();
    if prompt.is_empty() {
        bail!("Empty prompt. Please enter a valid prompt.");
    }

    let model = args
        .model
        .unwrap_or_else(|| cfg.preferred_model().to_string());
    Ok((SessionSettings { model, role, style }, prompt))
}

/// Prints the answer on stdout; a failed query becomes the command's error.
pub async fn ask<G: ModelGateway>(
    orchestrator: &QueryOrchestrator<'_, G>,
    cfg: &Config,
    args: AskArgs,
) -> Result<()> {
    let (settings, prompt) = settings_for(cfg, args)?;
    info!(model = %settings.model, "running one-shot query");

    match orchestrator.send_query(&settings, &prompt).await {
        QueryOutcome::Answered { response, .. } => {
            println!("{}", response.trim());
            Ok(())
        }
        QueryOutcome::Failed(failure) => bail!(failure.message),
    }
}

pub async fn models(gateway: &OllamaGateway<'_>) -> Result<()> {
    match gateway.version().await {
        Ok(version) => println!("Ollama version: {version}"),
        Err(err) if err.is_connectivity() => {
            bail!("Could not connect to Ollama server ({err}). Make sure it is running with 'ollama serve'.")
        }
        Err(err) => println!("Ollama version: unknown ({err})"),
    }

    let names = gateway
        .list_models()
        .await
        .context("Failed to list installed models")?;
    if names.is_empty() {
        println!("No local models were found in your Ollama installation.");
        return Ok(());
    }

    println!("Available models:");
    for (idx, name) in names.iter().enumerate() {
        println!("{}. {}", idx + 1, name);
    }
    Ok(())
}

pub(crate) fn read_summary_input(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    if text.trim().is_empty() {
        bail!("'{}' contains no text to summarize", path.display());
    }
    Ok(text)
}

pub async fn summarize<G: ModelGateway>(
    orchestrator: &QueryOrchestrator<'_, G>,
    cfg: &Config,
    file: &Path,
    model: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let text = read_summary_input(file)?;
    let model = model.unwrap_or_else(|| cfg.preferred_model().to_string());
    info!(model = %model, file = %file.display(), input_len = text.len(), "summarizing file");

    let summary = match orchestrator.invoke(&model, &render_summary(&text)).await {
        QueryOutcome::Answered { response, .. } => response,
        QueryOutcome::Failed(failure) => bail!(failure.message),
    };

    // The template primes the first bullet, so restore its marker.
    let summary = format!("- {}", summary.trim_start().trim_start_matches("- "));
    println!("{summary}");

    if let Some(output) = output {
        fs::write(output, format!("{summary}\n"))
            .with_context(|| format!("Failed to write summary to '{}'", output.display()))?;
        println!("\nSummary saved to {}", output.display());
    }
    Ok(())
}
