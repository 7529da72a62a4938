pub mod cli;
pub mod collector;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod model_gateway;
pub mod orchestrator;
pub mod progress;
pub mod prompt_builder;
pub mod providers;
pub mod session;
pub mod template;
pub mod transcript;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use cli::{Cli, Command};
use commands::AskArgs;
use config::Config;
use console::{Console, InputClosed};
use model_gateway::OllamaGateway;
use orchestrator::QueryOrchestrator;
use session::run_session;

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = Config::from_env();
    if let Some(base_url) = cli.base_url.as_deref() {
        cfg = cfg.with_base_url(base_url);
    }
    info!(
        model_base_url = %cfg.model_base_url,
        fallback_model = %cfg.fallback_model,
        env_default_model = cfg.env_default_model.as_deref().unwrap_or("-"),
        model_timeout_secs = cfg.model_timeout_secs,
        "loaded runtime configuration"
    );

    ctrlc::set_handler(|| {
        println!("\nExiting the program. Goodbye!");
        std::process::exit(0);
    })
    .context("Failed to install Ctrl+C handler")?;

    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.model_timeout_secs))
        .build()
        .context("Failed to initialize HTTP client")?;
    let gateway = OllamaGateway::new(&client, &cfg);
    let orchestrator = QueryOrchestrator::new(&gateway, &cfg);

    match cli.command {
        None => {
            let mut console = Console::stdio();
            match run_session(&mut console, &gateway, &cfg, &orchestrator).await {
                Err(err) if err.is::<InputClosed>() => {
                    println!();
                    Ok(())
                }
                Err(err) => Err(err.context("An unexpected error occurred")),
                Ok(()) => Ok(()),
            }
        }
        Some(Command::Ask {
            model,
            role,
            style,
            prompt,
        }) => {
            let args = AskArgs {
                model,
                role,
                style,
                prompt: prompt.join(" "),
            };
            commands::ask(&orchestrator.without_progress(), &cfg, args).await
        }
        Some(Command::Models) => commands::models(&gateway).await,
        Some(Command::Summarize {
            file,
            model,
            output,
        }) => commands::summarize(&orchestrator, &cfg, &file, model, output.as_deref()).await,
    }
}
