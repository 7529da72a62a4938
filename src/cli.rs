use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ollama-ask")]
#[command(about = "Query a local Ollama server with a chosen model, role and response style")]
pub struct Cli {
    /// Ollama server address (overrides MODEL_BASE_URL / OLLAMA_HOST)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a single prompt and print the response
    Ask {
        /// Model to use (defaults to OLLAMA_DEFAULT_MODEL or the built-in default)
        #[arg(short, long)]
        model: Option<String>,

        /// Persona the model should adopt
        #[arg(short, long)]
        role: Option<String>,

        /// Response style, e.g. Concise, Detailed, ELI5
        #[arg(short, long, default_value = "Normal")]
        style: String,

        /// The prompt; multiple words are joined with spaces
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },

    /// Show the server version and installed models
    Models,

    /// Summarize a text file
    Summarize {
        /// Text file to summarize
        file: PathBuf,

        #[arg(short, long)]
        model: Option<String>,

        /// Write the summary to this file as well
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
