use indicatif::ProgressBar;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::collector::SessionSettings;
use crate::config::Config;
use crate::error::FailureKind;
use crate::model_gateway::ModelGateway;
use crate::progress::{Progress, stdout_spinner};
use crate::template::render_query;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    pub kind: FailureKind,
    /// User-facing remediation text.
    pub message: String,
}

/// Result of one query. Failures carry the same text the user sees, but stay
/// distinguishable from a model answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered { response: String, elapsed: Duration },
    Failed(QueryFailure),
}

impl QueryOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Answered { response, .. } => response,
            Self::Failed(failure) => &failure.message,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }
}

pub struct QueryOrchestrator<'a, G> {
    gateway: &'a G,
    cfg: &'a Config,
    spinner: Option<Box<dyn Fn() -> ProgressBar + 'a>>,
}

impl<'a, G: ModelGateway> QueryOrchestrator<'a, G> {
    pub fn new(gateway: &'a G, cfg: &'a Config) -> Self {
        Self {
            gateway,
            cfg,
            spinner: Some(Box::new(stdout_spinner)),
        }
    }

    pub fn without_progress(mut self) -> Self {
        self.spinner = None;
        self
    }

    /// Draws the progress indicator on bars produced by `make`.
    pub fn with_spinner(mut self, make: impl Fn() -> ProgressBar + 'a) -> Self {
        self.spinner = Some(Box::new(make));
        self
    }

    pub async fn send_query(&self, settings: &SessionSettings, prompt: &str) -> QueryOutcome {
        let rendered = render_query(settings.role.as_deref(), &settings.style, prompt);
        self.invoke(&settings.model, &rendered).await
    }

    /// Sends an already-rendered prompt; used by the summarizer too.
    pub async fn invoke(&self, model: &str, rendered: &str) -> QueryOutcome {
        let started = Instant::now();
        let progress = self
            .spinner
            .as_ref()
            .map(|make| Progress::start(started, self.cfg.slow_response_after, make()));

        let result = self.gateway.generate(model, rendered).await;

        if let Some(progress) = progress {
            progress.finish().await;
        }
        let elapsed = started.elapsed();

        match result {
            Ok(response) => {
                info!(
                    model = %model,
                    elapsed_ms = elapsed.as_millis() as u64,
                    response_len = response.len(),
                    "query answered"
                );
                QueryOutcome::Answered { response, elapsed }
            }
            Err(err) => {
                let kind = err.failure_kind(model);
                warn!(model = %model, kind = ?kind, error = %err, "query failed");
                QueryOutcome::Failed(QueryFailure {
                    kind,
                    message: kind.remediation(model, &err.to_string()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressBar;
    use std::time::Duration;

    use super::{QueryOrchestrator, QueryOutcome};
    use crate::collector::SessionSettings;
    use crate::config::Config;
    use crate::error::{ClientError, FailureKind};
    use crate::model_gateway::stub::StubGateway;

    fn settings(role: Option<&str>, style: &str) -> SessionSettings {
        SessionSettings {
            model: "phi3".to_string(),
            role: role.map(str::to_string),
            style: style.to_string(),
        }
    }

    #[tokio::test]
    async fn answered_query_sends_rendered_template() {
        let cfg = Config::default();
        let gateway = StubGateway::with_replies([Ok("Mass attracts mass.".to_string())]);
        let orchestrator = QueryOrchestrator::new(&gateway, &cfg).without_progress();

        let outcome = orchestrator
            .send_query(&settings(Some("Teacher"), "Concise"), "What is gravity?")
            .await;

        assert!(outcome.is_answered());
        assert_eq!(outcome.text(), "Mass attracts mass.");
        let prompts = gateway.prompts.borrow();
        assert_eq!(prompts[0].0, "phi3");
        assert!(prompts[0].1.contains("You are a Teacher."));
        assert!(prompts[0].1.contains("What is gravity?"));
        assert!(prompts[0].1.contains("Concise"));
    }

    #[tokio::test]
    async fn failures_are_tagged_with_remediation_text() {
        let cfg = Config::default();
        let gateway = StubGateway::with_replies([
            Err(ClientError::ConnectionRefused {
                url: "http://localhost:11434/api/generate".to_string(),
            }),
            Err(ClientError::ModelNotFound {
                model: "phi3".to_string(),
            }),
            Err(ClientError::Invocation("upstream exploded".to_string())),
        ]);
        let orchestrator = QueryOrchestrator::new(&gateway, &cfg).without_progress();
        let turn = settings(None, "Normal");

        let refused = orchestrator.send_query(&turn, "hi").await;
        let missing = orchestrator.send_query(&turn, "hi").await;
        let generic = orchestrator.send_query(&turn, "hi").await;

        match refused {
            QueryOutcome::Failed(failure) => {
                assert_eq!(failure.kind, FailureKind::Connectivity);
                assert!(failure.message.contains("'ollama serve'"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(
            missing.text(),
            "Error: Model 'phi3' not found. You may need to download it first with 'ollama pull phi3'."
        );
        assert_eq!(
            generic.text(),
            "Error getting response: upstream exploded\n\nPlease check if Ollama is running correctly."
        );
    }

    #[tokio::test]
    async fn progress_indicator_does_not_block_the_call() {
        let cfg = Config {
            slow_response_after: Duration::ZERO,
            ..Config::default()
        };
        let gateway = StubGateway::with_replies([Ok("quick".to_string())]);
        let bar = ProgressBar::hidden();
        let shown = bar.clone();
        let orchestrator = QueryOrchestrator::new(&gateway, &cfg).with_spinner(move || shown.clone());

        let outcome = orchestrator.invoke("phi3", "rendered").await;

        match outcome {
            QueryOutcome::Answered { response, elapsed } => {
                assert_eq!(response, "quick");
                assert!(elapsed < Duration::from_secs(1));
            }
            other => panic!("expected answer, got {other:?}"),
        }
        assert!(bar.is_finished());
    }

    #[tokio::test]
    async fn progress_indicator_is_cleared_when_the_query_fails() {
        let cfg = Config::default();
        let gateway = StubGateway::with_replies([Err(ClientError::Invocation(
            "Connection Refused by peer".to_string(),
        ))]);
        let bar = ProgressBar::hidden();
        let shown = bar.clone();
        let orchestrator = QueryOrchestrator::new(&gateway, &cfg).with_spinner(move || shown.clone());

        let outcome = orchestrator
            .send_query(&settings(None, "Normal"), "hi")
            .await;

        match outcome {
            QueryOutcome::Failed(failure) => assert_eq!(failure.kind, FailureKind::Connectivity),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(bar.is_finished());
        let message = bar.message();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(bar.is_finished());
        assert_eq!(bar.message(), message);
    }
}
