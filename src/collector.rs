//! Menu-driven collection of the session settings. Every collector loops
//! until it has a valid value; only the connection retry is bounded.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{info, warn};

use crate::config::Config;
use crate::console::Console;
use crate::error::ClientError;
use crate::model_gateway::ModelGateway;

pub const MAX_ROLE_CHARS: usize = 50;
pub const MAX_STYLE_CHARS: usize = 100;
pub const DEFAULT_STYLE: &str = "Normal";

pub const ROLES: [&str; 7] = [
    "Teacher",
    "Programmer",
    "Historian",
    "Scientist",
    "Writing assistant",
    "Creative writer",
    "Business consultant",
];

const CUSTOM_STYLE: &str = "Custom";

pub const STYLES: [(&str, &str); 6] = [
    ("Normal", "Standard, balanced response"),
    ("Concise", "Brief and to the point"),
    ("Detailed", "Thorough and comprehensive"),
    ("Outline-style", "Organized with headings and bullet points"),
    ("ELI5", "Explained as if to a 5-year-old"),
    (CUSTOM_STYLE, "Define your own style"),
];

/// Model, role and style for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub model: String,
    pub role: Option<String>,
    pub style: String,
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn role_fits(role: &str) -> bool {
    char_len(role) <= MAX_ROLE_CHARS
}

pub fn style_fits(style: &str) -> bool {
    (1..=MAX_STYLE_CHARS).contains(&char_len(style))
}

pub async fn select_model<R, W, G>(
    console: &mut Console<R, W>,
    gateway: &G,
    cfg: &Config,
) -> Result<String>
where
    R: BufRead,
    W: Write,
    G: ModelGateway,
{
    let fallback = cfg.fallback_model.as_str();
    let mut attempt: u32 = 0;

    let names = loop {
        if attempt >= cfg.connect_retries {
            console.say(format!(
                "Failed to connect to Ollama after {} attempts.",
                cfg.connect_retries
            ))?;
            console.say(format!(
                "Using default model: \"{fallback}\" (if Ollama starts working)"
            ))?;
            return Ok(fallback.to_string());
        }

        match gateway.list_models().await {
            Ok(names) => break names,
            Err(err) if err.is_connectivity() => {
                warn!(attempt = attempt + 1, error = %err, "model catalog unreachable");
                console.say("Error: Could not connect to Ollama server.")?;
                console.say(
                    "Make sure the Ollama server is running (run \"ollama serve\" in your terminal).",
                )?;
                let left = cfg.connect_retries - attempt;
                if !console.confirm(&format!(
                    "Retry connection? (Y/N, {left} attempts left): "
                ))? {
                    console.say(format!(
                        "Using default model: \"{fallback}\" (if Ollama starts working)"
                    ))?;
                    return Ok(fallback.to_string());
                }
                console.say(format!(
                    "Retrying in {} seconds...",
                    cfg.retry_delay.as_secs()
                ))?;
                tokio::time::sleep(cfg.retry_delay).await;
                attempt += 1;
            }
            Err(err) => {
                report_catalog_error(console, &err, fallback)?;
                return Ok(fallback.to_string());
            }
        }
    };

    if names.is_empty() {
        console.say("No local models were found in your Ollama installation.")?;
        console.say(format!(
            "To install the default model, run \"ollama pull {fallback}\" in your terminal."
        ))?;
        console.say(format!("Using default model: \"{fallback}\""))?;
        return Ok(fallback.to_string());
    }

    if let Some(env_model) = cfg.env_default_model.as_deref()
        && names.iter().any(|name| name == env_model)
    {
        info!(model = %env_model, "using model from OLLAMA_DEFAULT_MODEL");
        console.say(format!(
            "Using model from environment variable: \"{env_model}\""
        ))?;
        return Ok(env_model.to_string());
    }

    console.say("Available models:")?;
    for (idx, name) in names.iter().enumerate() {
        console.say(format!("{}. {}", idx + 1, name))?;
    }

    loop {
        let selection = console.ask(
            "Enter the number of the model you want to use (or press Enter to use the default model): ",
        )?;
        let selection = selection.trim();

        if selection.is_empty() {
            if names.iter().any(|name| name == fallback) {
                console.say(format!("Using default model: \"{fallback}\""))?;
                return Ok(fallback.to_string());
            }
            console.say(format!("Using first available model: \"{}\"", names[0]))?;
            return Ok(names[0].clone());
        }

        match selection.parse::<usize>() {
            Ok(choice) if (1..=names.len()).contains(&choice) => {
                let model = names[choice - 1].clone();
                console.say(format!("Selected model: {model}"))?;
                return Ok(model);
            }
            Ok(_) => console.say(format!(
                "Invalid selection. Please enter a number between 1 and {}.",
                names.len()
            ))?,
            Err(_) => {
                console.say("Please enter a valid number or press Enter to use the default model.")?
            }
        }
    }
}

fn report_catalog_error<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    err: &ClientError,
    fallback: &str,
) -> Result<()> {
    warn!(error = %err, "failed to fetch model catalog");
    console.say(format!("Error connecting to Ollama: {err}"))?;
    console.say(format!(
        "Make sure your local Ollama server is running. Using default model: \"{fallback}\""
    ))
}

pub fn define_role<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<Option<String>> {
    console.say("")?;
    console.say("Please define the role of the LLM assistant.")?;
    console.say("Examples: teacher, historian, programmer, friend, etc.")?;
    console.say("Common roles:")?;
    for (idx, role) in ROLES.iter().enumerate() {
        console.say(format!("{}. {}", idx + 1, role))?;
    }
    console.say("0. Custom role")?;
    console.say(
        "Press Enter to skip this step (i.e. to assign no specific role to the model)",
    )?;

    loop {
        let input = console.ask("Select number or enter a custom role: ")?;
        if input.trim().is_empty() {
            console.say("No specific role defined. Proceeding without a defined role.")?;
            return Ok(None);
        }

        let selection = input.trim();
        let candidate = if !is_integer(selection) {
            input
        } else {
            match selection.parse::<usize>() {
                Ok(0) => {
                    let custom = console.ask("Enter your custom role: ")?;
                    let custom = custom.trim();
                    if custom.is_empty() {
                        console.say("No specific role entered. Proceeding without a defined role.")?;
                        return Ok(None);
                    }
                    custom.to_string()
                }
                Ok(choice) if (1..=ROLES.len()).contains(&choice) => ROLES[choice - 1].to_string(),
                // Negative or too large to parse is still a number, never a role.
                _ => {
                    console.say(format!(
                        "Invalid selection. Please enter a number between 0 and {}.",
                        ROLES.len()
                    ))?;
                    continue;
                }
            }
        };

        if !role_fits(&candidate) {
            console.say(format!(
                "Role description too long. Please keep your description under {MAX_ROLE_CHARS} characters."
            ))?;
            continue;
        }

        console.say(format!("Role defined as: {candidate}"))?;
        return Ok(Some(candidate));
    }
}

pub fn define_response_style<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<String> {
    console.say("")?;
    console.say("Select a response style:")?;
    for (idx, (style, description)) in STYLES.iter().enumerate() {
        console.say(format!("{}. {} - {}", idx + 1, style, description))?;
    }

    loop {
        let selection =
            console.ask("Enter the number of the response style (or press Enter for Normal): ")?;
        let selection = selection.trim();

        if selection.is_empty() {
            console.say(format!("Selected response style: {DEFAULT_STYLE}"))?;
            return Ok(DEFAULT_STYLE.to_string());
        }

        match selection.parse::<usize>() {
            Ok(choice) if (1..=STYLES.len()).contains(&choice) => {
                let (style, _) = STYLES[choice - 1];
                if style == CUSTOM_STYLE {
                    return define_custom_style(console);
                }
                console.say(format!("Selected response style: {style}"))?;
                return Ok(style.to_string());
            }
            Ok(_) => console.say(format!(
                "Invalid selection. Please enter a number between 1 and {}.",
                STYLES.len()
            ))?,
            Err(_) => console
                .say("Invalid selection. Please enter a valid number or press Enter for default.")?,
        }
    }
}

fn define_custom_style<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<String> {
    loop {
        let custom = console.ask("Enter your custom response style: ")?;
        let custom = custom.trim();
        if custom.is_empty() {
            console.say(format!("Empty style. Using {DEFAULT_STYLE} instead."))?;
            return Ok(DEFAULT_STYLE.to_string());
        }
        if !style_fits(custom) {
            console.say(format!(
                "Style description too long. Please keep it under {MAX_STYLE_CHARS} characters."
            ))?;
            continue;
        }
        console.say(format!("Defined response style as: {custom}"))?;
        return Ok(custom.to_string());
    }
}
