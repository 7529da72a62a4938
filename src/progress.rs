use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

const TICK: Duration = Duration::from_millis(200);
const TICK_STRINGS: [&str; 5] = ["-", "\\", "|", "/", ""];
const PROCESSING: &str = "Processing";
pub const SLOW_MESSAGE: &str = "Processing is taking longer than expected...";

/// Spinner drawn on stdout; indicatif stays silent when stdout is not a terminal.
pub fn stdout_spinner() -> ProgressBar {
    ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout())
}

/// Cosmetic spinner running beside a blocking model call.
///
/// The watcher task only reads its start time; the bar is cleared when
/// [`Progress::finish`] is awaited or when the handle is dropped on an early
/// return.
pub struct Progress {
    handle: JoinHandle<()>,
    guard: DropGuard,
}

impl Progress {
    pub fn start(started: Instant, slow_after: Duration, bar: ProgressBar) -> Self {
        match ProgressStyle::with_template("{msg} {spinner} ") {
            Ok(style) => bar.set_style(style.tick_strings(&TICK_STRINGS)),
            Err(err) => warn!(error = %err, "invalid spinner template"),
        }
        bar.set_message(PROCESSING);
        bar.enable_steady_tick(TICK);

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let handle = tokio::spawn(async move {
            let remaining = slow_after.saturating_sub(started.elapsed());
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(remaining) => {
                    debug!(elapsed_secs = started.elapsed().as_secs(), "model call is slow");
                    bar.set_message(SLOW_MESSAGE);
                    cancelled.cancelled().await;
                }
            }
            bar.finish_and_clear();
        });

        Self {
            handle,
            guard: token.drop_guard(),
        }
    }

    /// Stops the spinner and waits until its line has been cleared.
    pub async fn finish(self) {
        let Self { handle, guard } = self;
        drop(guard);
        let _ = handle.await;
    }
}
