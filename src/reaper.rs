use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::rate_limit::SubmissionRateLimiter;

/// Background task that periodically drops expired rate-limit windows.
pub struct Reaper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Reaper {
    /// Spawn the sweep loop on the current runtime. The first sweep runs one
    /// full `interval` after start.
    pub fn start(limiter: Arc<SubmissionRateLimiter>, interval: Duration) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(run(limiter, interval, rx));
        tracing::info!("Rate limit reaper started (every {}s)", interval.as_secs());
        Self { shutdown, handle }
    }

    /// Signal the loop and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!("Rate limit reaper exited abnormally: {e}");
        }
        tracing::info!("Rate limit reaper stopped");
    }
}

async fn run(
    limiter: Arc<SubmissionRateLimiter>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                let removed = limiter.sweep().await;
                if removed > 0 {
                    tracing::debug!("Reaper removed {removed} expired rate limit entries");
                }
            }
            changed = shutdown.changed() => {
                // Sender gone without a stop signal.
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
