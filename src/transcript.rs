use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

const SEPARATOR_WIDTH: usize = 80;

/// One prompt/response exchange as written to a transcript file.
#[derive(Debug, Clone)]
pub struct TranscriptRecord<'a> {
    pub timestamp: DateTime<Local>,
    pub model: &'a str,
    pub role: Option<&'a str>,
    pub style: &'a str,
    pub prompt: &'a str,
    pub response: &'a str,
}

impl TranscriptRecord<'_> {
    pub fn to_block(&self) -> String {
        let mut block = String::new();
        let _ = writeln!(block, "{}", "=".repeat(SEPARATOR_WIDTH));
        let _ = writeln!(block, "Date: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(block, "Model: {}", self.model);
        if let Some(role) = self.role {
            let _ = writeln!(block, "Role: {role}");
        }
        let _ = writeln!(block, "Style: {}", self.style);
        let _ = write!(block, "\nPROMPT:\n{}\n\n", self.prompt);
        let _ = write!(block, "RESPONSE:\n{}\n\n", self.response);
        block
    }
}

/// Appends to `path`, creating it if needed; existing content is never touched.
pub fn append_record(path: &Path, record: &TranscriptRecord<'_>) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    file.write_all(record.to_block().as_bytes())
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    debug!(path = %path.display(), "appended transcript record");
    Ok(())
}
