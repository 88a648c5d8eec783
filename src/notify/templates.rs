use askama::Template;

use crate::submission::Submission;

#[derive(Template)]
#[template(path = "email/admin.html")]
struct AdminEmail<'a> {
    id: &'a str,
    submitted_at: String,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    preferred_time: &'a str,
    experience: &'a str,
    goals: &'a str,
    injury_summary: String,
    has_health_flags: bool,
    referral_source: Option<&'a str>,
    utm_source: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "email/customer.html")]
struct CustomerEmail<'a> {
    id: &'a str,
    submitted_at: String,
    first_name: &'a str,
    preferred_time: &'a str,
    experience: &'a str,
    goals: &'a str,
}

pub fn admin_subject(submission: &Submission) -> String {
    format!("New FMS Assessment Request - {}", submission.name)
}

pub const CUSTOMER_SUBJECT: &str = "Your FMS Assessment Request - Geelong Movement Co";

pub fn render_admin(submission: &Submission) -> Result<String, String> {
    let injury_summary = if submission.injury_flags.is_empty() {
        "None reported".to_string()
    } else {
        submission.injury_flags.join(", ")
    };

    AdminEmail {
        id: &submission.id,
        submitted_at: display_time(submission),
        name: &submission.name,
        email: &submission.email,
        phone: &submission.phone,
        preferred_time: submission.preferred_time.as_str(),
        experience: submission.experience.as_str(),
        goals: &submission.goals,
        injury_summary,
        has_health_flags: submission.has_health_flags(),
        referral_source: submission.referral_source.as_deref(),
        utm_source: submission.utm_source.as_deref(),
    }
    .render()
    .map_err(|e| format!("Failed to render admin email: {e}"))
}

pub fn render_customer(submission: &Submission) -> Result<String, String> {
    CustomerEmail {
        id: &submission.id,
        submitted_at: display_time(submission),
        first_name: submission.first_name(),
        preferred_time: submission.preferred_time.as_str(),
        experience: submission.experience.as_str(),
        goals: &submission.goals,
    }
    .render()
    .map_err(|e| format!("Failed to render customer email: {e}"))
}

fn display_time(submission: &Submission) -> String {
    submission
        .submitted_at
        .format("%d/%m/%Y, %-I:%M:%S %P UTC")
        .to_string()
}
