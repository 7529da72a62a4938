use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemma3:12b";
const DEFAULT_MODEL_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 600;
const DEFAULT_CONNECT_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: u64 = 2;
const DEFAULT_TRANSCRIPT_PATH: &str = "ollama_conversation.txt";
const MAX_PROMPT_CHARS: usize = 4000;
const SLOW_RESPONSE_SECS: u64 = 120;
const WRAP_WIDTH: usize = 80;

/// Runtime settings, resolved once at start-up and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_base_url: String,
    /// Model used whenever the catalog is empty or unreachable.
    pub fallback_model: String,
    /// `OLLAMA_DEFAULT_MODEL`; skips the selection menu when it is installed.
    pub env_default_model: Option<String>,
    pub model_timeout_secs: u64,
    pub connect_retries: u32,
    pub retry_delay: Duration,
    pub transcript_path: PathBuf,
    pub max_prompt_chars: usize,
    pub slow_response_after: Duration,
    pub wrap_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            fallback_model: DEFAULT_MODEL.to_string(),
            env_default_model: None,
            model_timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
            connect_retries: DEFAULT_CONNECT_RETRIES,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            transcript_path: PathBuf::from(DEFAULT_TRANSCRIPT_PATH),
            max_prompt_chars: MAX_PROMPT_CHARS,
            slow_response_after: Duration::from_secs(SLOW_RESPONSE_SECS),
            wrap_width: WRAP_WIDTH,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let model_base_url = parse_base_url(
            get_var("MODEL_BASE_URL")
                .or_else(|| get_var("OLLAMA_HOST"))
                .as_deref(),
        );
        let env_default_model = get_var("OLLAMA_DEFAULT_MODEL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let model_timeout_secs = parse_positive_u64(
            get_var("MODEL_TIMEOUT_SECS").as_deref(),
            DEFAULT_MODEL_TIMEOUT_SECS,
        );
        let connect_retries = parse_positive_u64(
            get_var("CONNECT_RETRIES").as_deref(),
            u64::from(DEFAULT_CONNECT_RETRIES),
        )
        .min(u64::from(u32::MAX)) as u32;
        let retry_delay_secs =
            parse_u64(get_var("RETRY_DELAY_SECS").as_deref(), DEFAULT_RETRY_DELAY_SECS);
        let transcript_path = get_var("TRANSCRIPT_PATH")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSCRIPT_PATH));

        Self {
            model_base_url,
            env_default_model,
            model_timeout_secs,
            connect_retries,
            retry_delay: Duration::from_secs(retry_delay_secs),
            transcript_path,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, raw: &str) -> Self {
        self.model_base_url = parse_base_url(Some(raw));
        self
    }

    /// The model a non-interactive command should use when none is given.
    pub fn preferred_model(&self) -> &str {
        self.env_default_model
            .as_deref()
            .unwrap_or(&self.fallback_model)
    }
}

fn parse_base_url(raw: Option<&str>) -> String {
    let value = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_MODEL_BASE_URL);

    // OLLAMA_HOST is commonly set as a bare "host:port".
    let with_scheme = if value.contains("://") {
        value.to_string()
    } else {
        format!("http://{value}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

fn parse_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{
        Config, DEFAULT_CONNECT_RETRIES, DEFAULT_MODEL, DEFAULT_MODEL_BASE_URL,
        DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_RETRY_DELAY_SECS, DEFAULT_TRANSCRIPT_PATH,
        parse_base_url, parse_positive_u64, parse_u64,
    };

    fn config_from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Config::from_env_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn from_env_uses_defaults_when_vars_are_missing() {
        let cfg = config_from_pairs(&[]);
        assert_eq!(cfg.model_base_url, DEFAULT_MODEL_BASE_URL);
        assert_eq!(cfg.fallback_model, DEFAULT_MODEL);
        assert_eq!(cfg.env_default_model, None);
        assert_eq!(cfg.model_timeout_secs, DEFAULT_MODEL_TIMEOUT_SECS);
        assert_eq!(cfg.connect_retries, DEFAULT_CONNECT_RETRIES);
        assert_eq!(
            cfg.retry_delay,
            Duration::from_secs(DEFAULT_RETRY_DELAY_SECS)
        );
        assert_eq!(cfg.transcript_path, PathBuf::from(DEFAULT_TRANSCRIPT_PATH));
        assert_eq!(cfg.max_prompt_chars, 4000);
        assert_eq!(cfg.slow_response_after, Duration::from_secs(120));
    }

    #[test]
    fn from_env_reads_configured_values() {
        let cfg = config_from_pairs(&[
            ("MODEL_BASE_URL", "http://localhost:9999/"),
            ("OLLAMA_DEFAULT_MODEL", " llama3.2:3b "),
            ("MODEL_TIMEOUT_SECS", "15"),
            ("CONNECT_RETRIES", "5"),
            ("RETRY_DELAY_SECS", "0"),
            ("TRANSCRIPT_PATH", "notes/chat.txt"),
        ]);

        assert_eq!(cfg.model_base_url, "http://localhost:9999");
        assert_eq!(cfg.env_default_model.as_deref(), Some("llama3.2:3b"));
        assert_eq!(cfg.model_timeout_secs, 15);
        assert_eq!(cfg.connect_retries, 5);
        assert_eq!(cfg.retry_delay, Duration::ZERO);
        assert_eq!(cfg.transcript_path, PathBuf::from("notes/chat.txt"));
        assert_eq!(cfg.preferred_model(), "llama3.2:3b");
    }

    #[test]
    fn from_env_falls_back_to_ollama_host() {
        let cfg = config_from_pairs(&[("OLLAMA_HOST", "127.0.0.1:11500")]);
        assert_eq!(cfg.model_base_url, "http://127.0.0.1:11500");

        let cfg = config_from_pairs(&[
            ("MODEL_BASE_URL", "http://primary:1"),
            ("OLLAMA_HOST", "secondary:2"),
        ]);
        assert_eq!(cfg.model_base_url, "http://primary:1");
    }

    #[test]
    fn from_env_ignores_blank_default_model() {
        let cfg = config_from_pairs(&[("OLLAMA_DEFAULT_MODEL", "   ")]);
        assert_eq!(cfg.env_default_model, None);
        assert_eq!(cfg.preferred_model(), DEFAULT_MODEL);
    }

    #[test]
    fn from_env_uses_defaults_for_invalid_numbers() {
        let cfg = config_from_pairs(&[
            ("MODEL_TIMEOUT_SECS", "0"),
            ("CONNECT_RETRIES", "many"),
            ("RETRY_DELAY_SECS", "-1"),
        ]);
        assert_eq!(cfg.model_timeout_secs, DEFAULT_MODEL_TIMEOUT_SECS);
        assert_eq!(cfg.connect_retries, DEFAULT_CONNECT_RETRIES);
        assert_eq!(
            cfg.retry_delay,
            Duration::from_secs(DEFAULT_RETRY_DELAY_SECS)
        );
    }

    #[test]
    fn parse_base_url_adds_scheme_and_trims_slash() {
        assert_eq!(parse_base_url(None), DEFAULT_MODEL_BASE_URL);
        assert_eq!(parse_base_url(Some("  ")), DEFAULT_MODEL_BASE_URL);
        assert_eq!(parse_base_url(Some("host:1234")), "http://host:1234");
        assert_eq!(
            parse_base_url(Some("https://remote.example/")),
            "https://remote.example"
        );
    }

    #[test]
    fn parse_numbers_use_default_for_missing_or_invalid_values() {
        assert_eq!(parse_positive_u64(None, 7), 7);
        assert_eq!(parse_positive_u64(Some("0"), 7), 7);
        assert_eq!(parse_positive_u64(Some("  90  "), 7), 90);
        assert_eq!(parse_u64(Some("0"), 7), 0);
        assert_eq!(parse_u64(Some("nope"), 7), 7);
    }

    #[test]
    fn with_base_url_normalizes_override() {
        let cfg = Config::default().with_base_url("localhost:8080/");
        assert_eq!(cfg.model_base_url, "http://localhost:8080");
    }
}
