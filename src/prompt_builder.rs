use anyhow::Result;
use std::io::{BufRead, Write};

use crate::config::Config;
use crate::console::Console;
use crate::template::wrap;

const END_MARKER: &str = "end";
const ESCAPED_NEWLINE: &str = "\\n";

/// Reads a prompt and loops until the user confirms a non-empty one.
pub fn build_prompt<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    cfg: &Config,
) -> Result<String> {
    loop {
        if let Some(prompt) = read_prompt_once(console, cfg)? {
            return Ok(prompt);
        }
    }
}

fn read_prompt_once<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    cfg: &Config,
) -> Result<Option<String>> {
    console.say("")?;
    console.say("Enter your prompt/question (type \"END\" on a new line when finished):")?;
    console.say("For a single line prompt, just type your question and press Enter.")?;

    let first_line = console.ask(">>> ")?;
    let first_line = first_line.trim();

    let prompt = if first_line.eq_ignore_ascii_case(END_MARKER) {
        String::new()
    } else if first_line.contains(ESCAPED_NEWLINE) {
        console.say("")?;
        console.say("Prompt received with line breaks.")?;
        first_line.replace(ESCAPED_NEWLINE, "\n")
    } else {
        let mut lines = vec![first_line.to_string()];
        loop {
            let line = console.ask("... ")?;
            let line = line.trim();
            if line.is_empty() || line.eq_ignore_ascii_case(END_MARKER) {
                break;
            }
            lines.push(line.to_string());
        }
        lines.join("\n")
    };

    if prompt.trim().is_empty() {
        console.say("Empty prompt. Please enter a valid prompt.")?;
        return Ok(None);
    }

    let length = prompt.chars().count();
    if length > cfg.max_prompt_chars {
        console.say(format!(
            "Warning: Your prompt is very long ({length} characters). This may affect performance."
        ))?;
        if !console.confirm("Continue with this prompt? (y/n): ")? {
            return Ok(None);
        }
    }

    console.say("")?;
    console.say("Your prompt:")?;
    for line in wrap(&prompt, cfg.wrap_width) {
        console.say(format!("> {line}"))?;
    }

    console.say("")?;
    if console.confirm("Is this correct? (y/n): ")? {
        Ok(Some(prompt))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::build_prompt;
    use crate::config::Config;
    use crate::console::{scripted, transcript_of};

    #[test]
    fn single_line_prompt_ends_on_blank_line() {
        let cfg = Config::default();
        let mut console = scripted(&["What is gravity?", "", "y"]);

        let prompt = build_prompt(&mut console, &cfg).expect("prompt should be built");

        assert_eq!(prompt, "What is gravity?");
        assert!(transcript_of(console).contains("> What is gravity?"));
    }

    #[test]
    fn multiline_prompt_ends_on_sentinel_in_any_case() {
        let cfg = Config::default();
        let mut console = scripted(&["first", "  second  ", "End", "yes"]);

        let prompt = build_prompt(&mut console, &cfg).expect("prompt should be built");

        assert_eq!(prompt, "first\nsecond");
    }

    #[test]
    fn escaped_newlines_are_expanded() {
        let cfg = Config::default();
        let mut console = scripted(&[r"line one\nline two", "y"]);

        let prompt = build_prompt(&mut console, &cfg).expect("prompt should be built");

        assert_eq!(prompt, "line one\nline two");
        assert!(transcript_of(console).contains("Prompt received with line breaks."));
    }

    #[test]
    fn empty_prompts_restart_the_builder() {
        let cfg = Config::default();
        let mut console = scripted(&["END", "   ", "", "real question", "", "y"]);

        let prompt = build_prompt(&mut console, &cfg).expect("prompt should be built");

        assert_eq!(prompt, "real question");
        assert_eq!(
            transcript_of(console)
                .matches("Empty prompt. Please enter a valid prompt.")
                .count(),
            2
        );
    }

    #[test]
    fn declined_preview_restarts_the_builder() {
        let cfg = Config::default();
        let mut console = scripted(&["draft", "", "n", "final", "", "y"]);

        let prompt = build_prompt(&mut console, &cfg).expect("prompt should be built");

        assert_eq!(prompt, "final");
    }

    #[test]
    fn long_prompts_need_confirmation() {
        let cfg = Config {
            max_prompt_chars: 10,
            ..Config::default()
        };
        let mut console = scripted(&[
            "this prompt is too long",
            "",
            "n",
            "this prompt is too long",
            "",
            "y",
            "y",
        ]);

        let prompt = build_prompt(&mut console, &cfg).expect("prompt should be built");

        assert_eq!(prompt, "this prompt is too long");
        let out = transcript_of(console);
        assert_eq!(out.matches("Warning: Your prompt is very long (23 characters)").count(), 2);
    }

    #[test]
    fn preview_is_wrapped_with_prefix() {
        let cfg = Config {
            wrap_width: 10,
            ..Config::default()
        };
        let mut console = scripted(&["alpha beta gamma delta", "", "y"]);

        build_prompt(&mut console, &cfg).expect("prompt should be built");

        let out = transcript_of(console);
        assert!(out.contains("> alpha beta\n> gamma\n> delta\n"), "output: {out}");
    }
}
