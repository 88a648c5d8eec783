use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

/// A single schema violation, addressed by dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredTime {
    Morning,
    Afternoon,
    Evening,
}

impl PreferredTime {
    const VARIANTS: [&'static str; 3] = ["morning", "afternoon", "evening"];

    fn parse(s: &str) -> Option<Self> {
        match s {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Experience {
    Beginner,
    Intermediate,
    Advanced,
}

impl Experience {
    const VARIANTS: [&'static str; 3] = ["beginner", "intermediate", "advanced"];

    fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

/// The FMS form after schema validation, before sanitization.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub preferred_time: PreferredTime,
    pub goals: String,
    pub injury_flags: Vec<String>,
    pub experience: Experience,
    pub referral_source: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub turnstile_token: Option<String>,
}

// Local part may not start with a dot, end with one, or contain "..".
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-]([A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-])?@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .unwrap()
});

pub fn is_valid_email(s: &str) -> bool {
    !s.contains("..") && EMAIL_RE.is_match(s)
}

/// Validate the parsed body. Every violation is reported, not just the first.
pub fn validate(raw: &Value) -> Result<SubmissionRequest, Vec<FieldError>> {
    let Some(obj) = raw.as_object() else {
        return Err(vec![FieldError::new(
            "",
            format!("Expected object, received {}", type_name(raw)),
        )]);
    };

    let mut errors = Vec::new();

    let name = bounded_string(
        obj,
        "name",
        (2, "Name must be at least 2 characters"),
        100,
        &mut errors,
    );

    let email = required_string(obj, "email", &mut errors).and_then(|s| {
        if is_valid_email(&s) {
            Some(s)
        } else {
            errors.push(FieldError::new("email", "Invalid email format"));
            None
        }
    });

    let phone = bounded_string(
        obj,
        "phone",
        (8, "Phone number must be at least 8 characters"),
        20,
        &mut errors,
    );

    let preferred_time = required_string(obj, "preferredTime", &mut errors).and_then(|s| {
        let parsed = PreferredTime::parse(&s);
        if parsed.is_none() {
            errors.push(enum_error("preferredTime", &PreferredTime::VARIANTS, &s));
        }
        parsed
    });

    let goals = bounded_string(
        obj,
        "goals",
        (10, "Please provide more detail about your goals"),
        1000,
        &mut errors,
    );

    let injury_flags = string_array(obj, "injuryFlags", &mut errors);

    let experience = required_string(obj, "experience", &mut errors).and_then(|s| {
        let parsed = Experience::parse(&s);
        if parsed.is_none() {
            errors.push(enum_error("experience", &Experience::VARIANTS, &s));
        }
        parsed
    });

    let referral_source = optional_string(obj, "referralSource", &mut errors);
    let utm_source = optional_string(obj, "utmSource", &mut errors);
    let utm_medium = optional_string(obj, "utmMedium", &mut errors);
    let utm_campaign = optional_string(obj, "utmCampaign", &mut errors);
    let turnstile_token = optional_string(obj, "turnstileToken", &mut errors);

    match (name, email, phone, preferred_time, goals, injury_flags, experience) {
        (
            Some(name),
            Some(email),
            Some(phone),
            Some(preferred_time),
            Some(goals),
            Some(injury_flags),
            Some(experience),
        ) if errors.is_empty() => Ok(SubmissionRequest {
            name,
            email,
            phone,
            preferred_time,
            goals,
            injury_flags,
            experience,
            referral_source,
            utm_source,
            utm_medium,
            utm_campaign,
            turnstile_token,
        }),
        _ => Err(errors),
    }
}

fn required_string(obj: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "Required"));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("Expected string, received {}", type_name(other)),
            ));
            None
        }
    }
}

fn bounded_string(
    obj: &Map<String, Value>,
    field: &str,
    (min, min_message): (usize, &str),
    max: usize,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let s = required_string(obj, field, errors)?;
    let len = s.chars().count();
    if len < min {
        errors.push(FieldError::new(field, min_message));
        return None;
    }
    if len > max {
        errors.push(FieldError::new(
            field,
            format!("String must contain at most {max} character(s)"),
        ));
        return None;
    }
    Some(s)
}

fn optional_string(obj: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("Expected string, received {}", type_name(other)),
            ));
            None
        }
    }
}

fn string_array(obj: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<Vec<String>> {
    let items = match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "Required"));
            return None;
        }
        Some(Value::Array(items)) => items,
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("Expected array, received {}", type_name(other)),
            ));
            return None;
        }
    };

    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::String(s) => out.push(s.clone()),
            other => {
                ok = false;
                errors.push(FieldError::new(
                    format!("{field}.{i}"),
                    format!("Expected string, received {}", type_name(other)),
                ));
            }
        }
    }

    ok.then_some(out)
}

fn enum_error(field: &str, variants: &[&str], received: &str) -> FieldError {
    let expected = variants
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(" | ");
    FieldError::new(
        field,
        format!("Invalid enum value. Expected {expected}, received '{received}'"),
    )
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
