use std::sync::Arc;

use crate::config::Config;
use crate::notify::Notifier;
use crate::rate_limit::SubmissionRateLimiter;
use crate::verify::ChallengeVerifier;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub limiter: Arc<SubmissionRateLimiter>,
    pub verifier: Arc<dyn ChallengeVerifier>,
    pub notifier: Arc<dyn Notifier>,
}
