pub mod mailer;
pub mod templates;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::{Environment, MailConfig};
use crate::submission::Submission;
use crate::submission::fields::{Experience, PreferredTime};

use mailer::{Mailer, OutgoingEmail, ResendMailer, SmtpMailer};

pub const NOT_CONFIGURED: &str = "Email service not configured";

/// Provider ids of the two messages sent for a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub admin_email_id: Option<String>,
    pub customer_email_id: Option<String>,
}

/// Why notification did not complete.
///
/// `Declined` is a soft failure: the submission is still accepted.
/// `Faulted` means the notifier itself broke and the request fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    Declined { reason: String },
    Faulted { cause: String },
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Declined { reason } => write!(f, "Notification declined: {reason}"),
            NotifyError::Faulted { cause } => write!(f, "Notifier fault: {cause}"),
        }
    }
}

impl std::error::Error for NotifyError {}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, submission: &Submission) -> Result<Delivery, NotifyError>;
}

/// Sends the operator notification and the submitter confirmation.
pub struct EmailNotifier {
    mailer: Option<Arc<dyn Mailer>>,
    admin_email: String,
    from_email: String,
    timeout: Duration,
}

impl EmailNotifier {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, config: &MailConfig, timeout: Duration) -> Self {
        Self {
            mailer,
            admin_email: config.admin_email.clone(),
            from_email: config.from_email.clone(),
            timeout,
        }
    }

    /// Pick a backend: Resend when an API key is set, else SMTP, else none.
    pub fn from_config(config: &MailConfig, timeout: Duration) -> Self {
        let mailer: Option<Arc<dyn Mailer>> = if let Some(resend) = &config.resend {
            match ResendMailer::new(resend, timeout) {
                Ok(m) => {
                    tracing::info!("Resend email configured");
                    Some(Arc::new(m))
                }
                Err(e) => {
                    tracing::warn!("Resend email not available: {e}");
                    None
                }
            }
        } else if let Some(smtp) = &config.smtp {
            match SmtpMailer::new(smtp, timeout) {
                Ok(m) => {
                    tracing::info!("SMTP email configured");
                    Some(Arc::new(m))
                }
                Err(e) => {
                    tracing::warn!("SMTP email not available: {e}");
                    None
                }
            }
        } else {
            tracing::warn!("No mail provider configured - email notifications disabled");
            None
        };

        Self::new(mailer, config, timeout)
    }

    async fn deliver(&self, mailer: &dyn Mailer, email: &OutgoingEmail) -> Result<Option<String>, String> {
        match tokio::time::timeout(self.timeout, mailer.send(email)).await {
            Ok(result) => result,
            Err(_) => Err(format!("timed out after {}s", self.timeout.as_secs())),
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, submission: &Submission) -> Result<Delivery, NotifyError> {
        let Some(mailer) = self.mailer.as_deref() else {
            tracing::warn!("{NOT_CONFIGURED} - email notifications disabled");
            return Err(NotifyError::Declined {
                reason: NOT_CONFIGURED.to_string(),
            });
        };

        let admin = OutgoingEmail {
            from: self.from_email.clone(),
            to: self.admin_email.clone(),
            subject: templates::admin_subject(submission),
            html: templates::render_admin(submission).map_err(|cause| NotifyError::Faulted { cause })?,
        };
        let customer = OutgoingEmail {
            from: self.from_email.clone(),
            to: submission.email.clone(),
            subject: templates::CUSTOMER_SUBJECT.to_string(),
            html: templates::render_customer(submission).map_err(|cause| NotifyError::Faulted { cause })?,
        };

        // Independent legs: a failed admin send still attempts the confirmation.
        let admin_result = self.deliver(mailer, &admin).await;
        let customer_result = self.deliver(mailer, &customer).await;

        match (admin_result, customer_result) {
            (Ok(admin_email_id), Ok(customer_email_id)) => {
                tracing::info!(
                    submission_id = %submission.id,
                    admin_email_id = ?admin_email_id,
                    customer_email_id = ?customer_email_id,
                    "Email notifications sent"
                );
                Ok(Delivery {
                    admin_email_id,
                    customer_email_id,
                })
            }
            (admin_result, customer_result) => {
                let mut failures = Vec::new();
                if let Err(e) = admin_result {
                    failures.push(format!("admin email: {e}"));
                }
                if let Err(e) = customer_result {
                    failures.push(format!("customer email: {e}"));
                }
                let reason = failures.join("; ");
                tracing::error!(submission_id = %submission.id, "Email sending failed: {reason}");
                Err(NotifyError::Declined { reason })
            }
        }
    }
}

/// A fixed submission used to preview both emails.
pub fn sample_submission() -> Submission {
    Submission {
        id: "test_fms_123".to_string(),
        name: "John Smith".to_string(),
        email: "test@example.com".to_string(),
        phone: "0412 345 678".to_string(),
        preferred_time: PreferredTime::Morning,
        goals: "I want to improve my mobility and reduce lower back pain from sitting at a desk all day."
            .to_string(),
        injury_flags: vec!["Current pain or injury".to_string()],
        experience: Experience::Beginner,
        referral_source: Some("Google Search".to_string()),
        utm_source: Some("google".to_string()),
        utm_medium: None,
        utm_campaign: None,
        submitted_at: Utc::now(),
        client_ip: "127.0.0.1".to_string(),
        user_agent: "send_test_email".to_string(),
    }
}

/// Send the sample notification pair. Development only.
pub async fn send_test_email(
    notifier: &dyn Notifier,
    environment: Environment,
) -> Result<Delivery, NotifyError> {
    if !environment.is_development() {
        return Err(NotifyError::Declined {
            reason: "Test emails can only be sent in development environment".to_string(),
        });
    }

    notifier.notify(&sample_submission()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail_to: Option<String>,
        stall: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, String> {
            if self.stall {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            self.sent.lock().unwrap().push(email.clone());
            if self.fail_to.as_deref() == Some(email.to.as_str()) {
                return Err("mailbox unavailable".to_string());
            }
            Ok(Some(format!("id-{}", email.to)))
        }
    }

    fn mail_config() -> MailConfig {
        MailConfig {
            resend: None,
            smtp: None,
            admin_email: "admin@geelongmovement.com".to_string(),
            from_email: "noreply@geelongmovement.com".to_string(),
        }
    }

    fn notifier(mailer: Arc<RecordingMailer>) -> EmailNotifier {
        EmailNotifier::new(Some(mailer), &mail_config(), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn unconfigured_notifier_declines() {
        let notifier = EmailNotifier::new(None, &mail_config(), Duration::from_secs(1));
        let err = notifier.notify(&sample_submission()).await.unwrap_err();
        assert_eq!(
            err,
            NotifyError::Declined {
                reason: NOT_CONFIGURED.to_string()
            }
        );
    }

    #[tokio::test]
    async fn sends_admin_and_customer_emails() {
        let mailer = Arc::new(RecordingMailer::default());
        let delivery = notifier(mailer.clone()).notify(&sample_submission()).await.unwrap();

        assert_eq!(delivery.admin_email_id.as_deref(), Some("id-admin@geelongmovement.com"));
        assert_eq!(delivery.customer_email_id.as_deref(), Some("id-test@example.com"));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "admin@geelongmovement.com");
        assert_eq!(sent[0].from, "noreply@geelongmovement.com");
        assert_eq!(sent[0].subject, "New FMS Assessment Request - John Smith");
        assert_eq!(sent[1].to, "test@example.com");
        assert_eq!(sent[1].subject, "Your FMS Assessment Request - Geelong Movement Co");
    }

    #[tokio::test]
    async fn failed_leg_does_not_block_the_other() {
        let mailer = Arc::new(RecordingMailer {
            fail_to: Some("admin@geelongmovement.com".to_string()),
            ..Default::default()
        });
        let err = notifier(mailer.clone()).notify(&sample_submission()).await.unwrap_err();

        assert_eq!(mailer.sent.lock().unwrap().len(), 2);
        match err {
            NotifyError::Declined { reason } => {
                assert!(reason.contains("admin email: mailbox unavailable"), "{reason}");
                assert!(!reason.contains("customer email"), "{reason}");
            }
            other => panic!("expected Declined, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stalled_sends_time_out_as_declined() {
        let mailer = Arc::new(RecordingMailer {
            stall: true,
            ..Default::default()
        });
        let err = notifier(mailer).notify(&sample_submission()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Declined { ref reason } if reason.contains("timed out")));
    }

    #[tokio::test]
    async fn test_email_only_in_development() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier(mailer.clone());

        let err = send_test_email(&notifier, Environment::Production).await.unwrap_err();
        assert!(matches!(err, NotifyError::Declined { .. }));
        assert!(mailer.sent.lock().unwrap().is_empty());

        send_test_email(&notifier, Environment::Development).await.unwrap();
        assert_eq!(mailer.sent.lock().unwrap().len(), 2);
    }
}
