use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use fms_intake::config::{
    Config, DEFAULT_TURNSTILE_VERIFY_URL, Environment, MailConfig, RateLimitConfig,
    TurnstileConfig,
};
use fms_intake::notify::{Delivery, Notifier, NotifyError};
use fms_intake::rate_limit::SubmissionRateLimiter;
use fms_intake::state::{AppState, SharedState};
use fms_intake::submission::Submission;
use fms_intake::verify::ChallengeVerifier;

pub const SUBMIT_PATH: &str = "/api/fms/submit";

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotifierMode {
    Deliver,
    Decline,
    Fault,
}

/// Records every submission it is handed and answers per `mode`.
pub struct FakeNotifier {
    mode: NotifierMode,
    calls: AtomicUsize,
    last: Mutex<Option<Submission>>,
}

impl FakeNotifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn last(&self) -> Option<Submission> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, submission: &Submission) -> Result<Delivery, NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(submission.clone());
        match self.mode {
            NotifierMode::Deliver => Ok(Delivery {
                admin_email_id: Some("mock-admin-id".to_string()),
                customer_email_id: Some("mock-customer-id".to_string()),
            }),
            NotifierMode::Decline => Err(NotifyError::Declined {
                reason: "Email service not configured".to_string(),
            }),
            NotifierMode::Fault => Err(NotifyError::Faulted {
                cause: "Email service down".to_string(),
            }),
        }
    }
}

pub struct FakeVerifier {
    accept: bool,
    calls: AtomicUsize,
}

impl FakeVerifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChallengeVerifier for FakeVerifier {
    async fn verify(&self, _token: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accept
    }
}

/// A running server instance with fake collaborators.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    #[allow(dead_code)]
    pub state: SharedState,
    pub notifier: Arc<FakeNotifier>,
    pub verifier: Arc<FakeVerifier>,
    next_ip: AtomicU32,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A client identifier no other request in this app has used.
    pub fn fresh_ip(&self) -> String {
        let n = self.next_ip.fetch_add(1, Ordering::SeqCst);
        format!("192.168.{}.{}", n / 256, n % 256)
    }

    /// Submit JSON from a fresh client identifier.
    pub async fn submit(&self, data: &Value) -> (Value, StatusCode) {
        let ip = self.fresh_ip();
        self.submit_with(data, &[("x-forwarded-for", ip.as_str())]).await
    }

    /// Submit JSON with explicit headers.
    pub async fn submit_with(&self, data: &Value, headers: &[(&str, &str)]) -> (Value, StatusCode) {
        let mut req = self.client.post(self.url(SUBMIT_PATH)).json(data);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        let resp = req.send().await.expect("submit request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit a raw body as `application/json`.
    #[allow(dead_code)]
    pub async fn submit_raw(&self, raw: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(SUBMIT_PATH))
            .header("content-type", "application/json")
            .header("x-forwarded-for", self.fresh_ip())
            .body(raw.to_string())
            .send()
            .await
            .expect("raw submit request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    #[allow(dead_code)]
    pub async fn health(&self) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(SUBMIT_PATH))
            .send()
            .await
            .expect("health request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config(environment: Environment) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        environment,
        allowed_origins: vec![
            "https://geelongmovement.com".to_string(),
            "https://www.geelongmovement.com".to_string(),
        ],
        max_body_size: 1_048_576,
        max_payload_bytes: 10_000,
        rate_limit: RateLimitConfig::default(),
        outbound_timeout: Duration::from_secs(2),
        log_level: "warn".to_string(),
        turnstile: TurnstileConfig {
            secret: None,
            verify_url: DEFAULT_TURNSTILE_VERIFY_URL.to_string(),
        },
        mail: MailConfig {
            resend: None,
            smtp: None,
            admin_email: "admin@geelongmovement.com".to_string(),
            from_email: "noreply@geelongmovement.com".to_string(),
        },
    }
}

/// A form every validator rule accepts.
pub fn valid_submission() -> Value {
    json!({
        "name": "John Smith",
        "email": "john@example.com",
        "phone": "0412345678",
        "preferredTime": "morning",
        "goals": "I want to improve my mobility and reduce back pain from desk work.",
        "injuryFlags": ["None of the above"],
        "experience": "beginner",
    })
}

/// Spawn a test-environment app whose notifier delivers and verifier accepts.
#[allow(dead_code)]
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(Environment::Test), NotifierMode::Deliver, true).await
}

pub async fn spawn_app_with(config: Config, mode: NotifierMode, accept_tokens: bool) -> TestApp {
    let notifier = Arc::new(FakeNotifier {
        mode,
        calls: AtomicUsize::new(0),
        last: Mutex::new(None),
    });
    let verifier = Arc::new(FakeVerifier {
        accept: accept_tokens,
        calls: AtomicUsize::new(0),
    });

    let state: SharedState = Arc::new(AppState {
        limiter: Arc::new(SubmissionRateLimiter::in_memory(&config.rate_limit)),
        config,
        verifier: verifier.clone(),
        notifier: notifier.clone(),
    });

    let app = fms_intake::build_app(state.clone());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        state,
        notifier,
        verifier,
        next_ip: AtomicU32::new(1),
    }
}
