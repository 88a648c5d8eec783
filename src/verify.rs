use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::{Environment, TurnstileConfig};

pub const VERIFICATION_FAILED: &str = "Security verification failed";

/// Checks a client-issued bot-challenge token.
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    /// True only when the token is confirmed valid. Never errors: transport
    /// and decoding problems count as a failed verification.
    async fn verify(&self, token: &str) -> bool;
}

/// Cloudflare Turnstile siteverify client.
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: Option<String>,
    verify_url: String,
    environment: Environment,
}

#[derive(Deserialize)]
struct SiteverifyResponse {
    #[serde(default)]
    success: bool,
}

impl TurnstileVerifier {
    pub fn new(config: &TurnstileConfig, environment: Environment, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build verification client: {e}"))?;

        Ok(Self {
            client,
            secret: config.secret.clone(),
            verify_url: config.verify_url.clone(),
            environment,
        })
    }

    async fn siteverify(&self, secret: &str, token: &str) -> Result<bool, String> {
        let resp = self
            .client
            .post(&self.verify_url)
            .json(&json!({ "secret": secret, "response": token }))
            .send()
            .await
            .map_err(|e| format!("Verification request failed: {e}"))?;

        let body: SiteverifyResponse = resp
            .json()
            .await
            .map_err(|e| format!("Invalid verification response: {e}"))?;

        Ok(body.success)
    }
}

#[async_trait]
impl ChallengeVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            if self.environment.is_development() {
                tracing::warn!("TURNSTILE_SECRET_KEY not configured - skipping verification in development");
                return true;
            }
            return false;
        };

        if token.is_empty() {
            return false;
        }

        match self.siteverify(secret, token).await {
            Ok(success) => success,
            Err(e) => {
                if !self.environment.is_production() {
                    tracing::error!("Turnstile verification failed: {e}");
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::routing::post;
    use serde_json::Value;

    async fn spawn_siteverify(success: bool) -> String {
        let app = axum::Router::new().route(
            "/siteverify",
            post(move |Json(body): Json<Value>| async move {
                let ok = success && body["secret"] == "s3cret" && body["response"] == "tok";
                Json(json!({ "success": ok }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/siteverify")
    }

    fn verifier(secret: Option<&str>, url: String, environment: Environment) -> TurnstileVerifier {
        let config = TurnstileConfig {
            secret: secret.map(|s| s.to_string()),
            verify_url: url,
        };
        TurnstileVerifier::new(&config, environment, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn missing_secret_passes_only_in_development() {
        let url = "http://127.0.0.1:9/unused".to_string();
        assert!(verifier(None, url.clone(), Environment::Development).verify("tok").await);
        assert!(!verifier(None, url.clone(), Environment::Production).verify("tok").await);
        assert!(!verifier(None, url, Environment::Test).verify("tok").await);
    }

    #[tokio::test]
    async fn reports_remote_verdict() {
        let url = spawn_siteverify(true).await;
        let v = verifier(Some("s3cret"), url, Environment::Test);
        assert!(v.verify("tok").await);
        assert!(!v.verify("other").await);
    }

    #[tokio::test]
    async fn remote_rejection_fails() {
        let url = spawn_siteverify(false).await;
        assert!(!verifier(Some("s3cret"), url, Environment::Test).verify("tok").await);
    }

    #[tokio::test]
    async fn empty_token_fails_without_network() {
        let v = verifier(Some("s3cret"), "http://127.0.0.1:9/unused".to_string(), Environment::Test);
        assert!(!v.verify("").await);
    }

    #[tokio::test]
    async fn transport_error_fails() {
        let v = verifier(Some("s3cret"), "http://127.0.0.1:9/unused".to_string(), Environment::Test);
        assert!(!v.verify("tok").await);
    }
}
