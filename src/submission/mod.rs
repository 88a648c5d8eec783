pub mod fields;
pub mod guard;
pub mod id;
pub mod metadata;
pub mod pipeline;
pub mod sanitize;

use chrono::{DateTime, Utc};
use serde::Serialize;

use fields::{Experience, PreferredTime, SubmissionRequest};
use metadata::RequestMeta;

/// An accepted, sanitized FMS request plus server-assigned metadata.
/// Lives for one request; nothing persists it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub preferred_time: PreferredTime,
    pub goals: String,
    pub injury_flags: Vec<String>,
    pub experience: Experience,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(rename = "clientIP")]
    pub client_ip: String,
    pub user_agent: String,
}

impl Submission {
    /// Sanitize free text and stamp id, time and request metadata.
    // TODO: length bounds are checked before sanitizing, so a name like "<>"
    // is accepted and ends up empty; decide whether to re-validate afterwards.
    pub fn build(request: SubmissionRequest, meta: RequestMeta) -> Self {
        Self {
            id: id::generate(),
            name: sanitize::sanitize_text(&request.name),
            email: request.email,
            phone: request.phone,
            preferred_time: request.preferred_time,
            goals: sanitize::sanitize_text(&request.goals),
            injury_flags: request.injury_flags,
            experience: request.experience,
            referral_source: request.referral_source,
            utm_source: request.utm_source,
            utm_medium: request.utm_medium,
            utm_campaign: request.utm_campaign,
            submitted_at: Utc::now(),
            client_ip: meta.client_id,
            user_agent: meta.user_agent,
        }
    }

    pub fn first_name(&self) -> &str {
        self.name.split(' ').next().unwrap_or(&self.name)
    }

    /// Any flag other than the explicit "None of the above" answer.
    pub fn has_health_flags(&self) -> bool {
        self.injury_flags.iter().any(|f| f != "None of the above")
    }
}
