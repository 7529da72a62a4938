use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Standard input reached end of file while a prompt was waiting.
#[derive(Debug, Error)]
#[error("standard input closed")]
pub struct InputClosed;

/// Line-oriented prompt/print channel shared by every interactive step.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", text.as_ref()).context("Failed to write to stdout")
    }

    /// Prints `label` without a newline and returns the next line with its
    /// terminator removed.
    pub fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}").context("Failed to write to stdout")?;
        self.output.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read stdin")?;
        if read == 0 {
            return Err(InputClosed.into());
        }

        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(line)
    }

    /// Yes/no question; anything starting with `y` (any case) is a yes.
    pub fn confirm(&mut self, label: &str) -> Result<bool> {
        let answer = self.ask(label)?;
        Ok(answer.trim().to_lowercase().starts_with('y'))
    }
}

#[cfg(test)]
pub(crate) fn scripted(lines: &[&str]) -> Console<io::Cursor<Vec<u8>>, Vec<u8>> {
    let mut input = lines.join("\n");
    if !lines.is_empty() {
        input.push('\n');
    }
    Console::new(io::Cursor::new(input.into_bytes()), Vec::new())
}

#[cfg(test)]
pub(crate) fn transcript_of(console: Console<io::Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8(console.into_output()).expect("console output should be utf-8")
}

#[cfg(test)]
mod tests {
    use super::{InputClosed, scripted, transcript_of};

    #[test]
    fn ask_strips_line_terminators_only() {
        let mut console = scripted(&["  spaced  \r"]);
        let answer = console.ask("> ").expect("line should be read");
        assert_eq!(answer, "  spaced  ");
        assert_eq!(transcript_of(console), "> ");
    }

    #[test]
    fn confirm_accepts_any_yes_prefix() {
        let mut console = scripted(&["Yes please", "nope", ""]);
        assert!(console.confirm("? ").expect("first answer"));
        assert!(!console.confirm("? ").expect("second answer"));
        assert!(!console.confirm("? ").expect("third answer"));
    }

    #[test]
    fn ask_reports_end_of_input() {
        let mut console = scripted(&[]);
        let err = console.ask("> ").expect_err("empty input should fail");
        assert!(err.downcast_ref::<InputClosed>().is_some());
    }
}
