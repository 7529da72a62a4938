use anyhow::Result;
use chrono::Local;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::collector::{SessionSettings, define_response_style, define_role, select_model};
use crate::config::Config;
use crate::console::Console;
use crate::model_gateway::ModelGateway;
use crate::orchestrator::{QueryOrchestrator, QueryOutcome};
use crate::prompt_builder::build_prompt;
use crate::transcript::{TranscriptRecord, append_record};

/// Which settings the user asked to re-collect between turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsChange {
    pub model: bool,
    pub role: bool,
    pub style: bool,
}

impl SettingsChange {
    pub fn parse(answer: &str) -> Self {
        let answer = answer.to_lowercase();
        let all = answer.contains("all");
        Self {
            model: all || answer.contains("model"),
            role: all || answer.contains("role"),
            style: all || answer.contains("style"),
        }
    }
}

pub async fn run_session<R, W, G>(
    console: &mut Console<R, W>,
    gateway: &G,
    cfg: &Config,
    orchestrator: &QueryOrchestrator<'_, G>,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: ModelGateway,
{
    console.say("Welcome to the Ollama local LLM Interface.\n")?;
    console.say("Press Ctrl+C at any time to exit the program.\n")?;

    let model = select_model(console, gateway, cfg).await?;
    let role = define_role(console)?;
    let style = define_response_style(console)?;
    let mut settings = SessionSettings { model, role, style };
    info!(
        model = %settings.model,
        role = settings.role.as_deref().unwrap_or("-"),
        style = %settings.style,
        "session configured"
    );

    loop {
        let prompt = build_prompt(console, cfg)?;

        console.say("\nSending query to LLM, please wait...")?;
        let outcome = orchestrator.send_query(&settings, &prompt).await;
        if let QueryOutcome::Answered { elapsed, .. } = &outcome {
            console.say(format!(
                "Response received in {:.2} seconds.",
                elapsed.as_secs_f64()
            ))?;
        }

        console.say("\n=== LLM Response ===\n")?;
        console.say(outcome.text())?;
        console.say("\n=== End Response ===\n")?;

        offer_save(console, cfg, &settings, &prompt, &outcome)?;

        if !console.confirm("\nAsk another question? (y/n): ")? {
            console.say("\nThank you for using the Ollama LLM Interface. Goodbye!")?;
            return Ok(());
        }

        if console.confirm("Change model, role, or style? (y/n): ")? {
            let answer = console.ask("What would you like to change? (model/role/style/all): ")?;
            let change = SettingsChange::parse(&answer);
            if change.model {
                settings.model = select_model(console, gateway, cfg).await?;
            }
            if change.role {
                settings.role = define_role(console)?;
            }
            if change.style {
                settings.style = define_response_style(console)?;
            }
        }
    }
}

fn offer_save<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    cfg: &Config,
    settings: &SessionSettings,
    prompt: &str,
    outcome: &QueryOutcome,
) -> Result<()> {
    if !console.confirm("\nWould you like to save this conversation? (y/n): ")? {
        return Ok(());
    }

    let default_path = cfg.transcript_path.display().to_string();
    let filename = console.ask(&format!("Enter filename (default: {default_path}): "))?;
    let path = match filename.trim() {
        "" => cfg.transcript_path.clone(),
        name => PathBuf::from(name),
    };

    let record = TranscriptRecord {
        timestamp: Local::now(),
        model: &settings.model,
        role: settings.role.as_deref(),
        style: &settings.style,
        prompt,
        response: outcome.text(),
    };
    match append_record(&path, &record) {
        Ok(()) => console.say(format!("Conversation saved to {}", path.display())),
        Err(err) => {
            warn!(path = %path.display(), error = ?err, "failed to save conversation");
            console.say(format!("Error saving conversation: {err:#}"))
        }
    }
}
