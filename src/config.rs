use std::net::IpAddr;
use std::time::Duration;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "https://geelongmovement.com",
    "https://www.geelongmovement.com",
    "https://crossfit-gym-sigma.vercel.app",
];

pub const DEFAULT_TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
    pub max_body_size: usize,
    pub max_payload_bytes: usize,
    pub rate_limit: RateLimitConfig,
    pub outbound_timeout: Duration,
    pub log_level: String,
    pub turnstile: TurnstileConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnstileConfig {
    pub secret: Option<String>,
    pub verify_url: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub resend: Option<ResendConfig>,
    pub smtp: Option<SmtpConfig>,
    pub admin_email: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("FMS_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FMS_HOST: {e}"))?;

        let port: u16 = env_or("FMS_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FMS_PORT: {e}"))?;

        let environment = match env_or("FMS_ENV", "production").as_str() {
            "production" => Environment::Production,
            "development" => Environment::Development,
            "test" => Environment::Test,
            other => return Err(format!("Invalid FMS_ENV: {other}")),
        };

        let allowed_origins: Vec<String> = match std::env::var("FMS_ALLOWED_ORIGINS") {
            Ok(list) => list
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
            Err(_) => DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let max_body_size: usize = env_or("FMS_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid FMS_MAX_BODY_SIZE: {e}"))?;

        let max_payload_bytes: usize = env_or("FMS_MAX_PAYLOAD_BYTES", "10000")
            .parse()
            .map_err(|e| format!("Invalid FMS_MAX_PAYLOAD_BYTES: {e}"))?;

        let max_requests: u32 = env_or("FMS_RATE_LIMIT_MAX", "3")
            .parse()
            .map_err(|e| format!("Invalid FMS_RATE_LIMIT_MAX: {e}"))?;

        let window_secs: u64 = env_or("FMS_RATE_LIMIT_WINDOW_SECS", "900")
            .parse()
            .map_err(|e| format!("Invalid FMS_RATE_LIMIT_WINDOW_SECS: {e}"))?;

        let sweep_secs: u64 = env_or("FMS_RATE_LIMIT_SWEEP_SECS", "300")
            .parse()
            .map_err(|e| format!("Invalid FMS_RATE_LIMIT_SWEEP_SECS: {e}"))?;

        if sweep_secs == 0 {
            return Err("Invalid FMS_RATE_LIMIT_SWEEP_SECS: must be greater than zero".to_string());
        }

        let timeout_secs: u64 = env_or("FMS_OUTBOUND_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|e| format!("Invalid FMS_OUTBOUND_TIMEOUT_SECS: {e}"))?;

        let log_level = env_or("FMS_LOG_LEVEL", "info");

        let turnstile = TurnstileConfig {
            secret: env_non_empty("TURNSTILE_SECRET_KEY"),
            verify_url: env_or("TURNSTILE_VERIFY_URL", DEFAULT_TURNSTILE_VERIFY_URL),
        };

        let resend = env_non_empty("RESEND_API_KEY").map(|api_key| ResendConfig {
            api_key,
            api_url: env_or("RESEND_API_URL", DEFAULT_RESEND_API_URL),
        });

        let smtp = match (
            std::env::var("FMS_SMTP_HOST").ok(),
            std::env::var("FMS_SMTP_PORT").ok(),
            std::env::var("FMS_SMTP_USER").ok(),
            std::env::var("FMS_SMTP_PASS").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid FMS_SMTP_PORT: {e}"))?,
                user,
                pass,
            }),
            _ => None,
        };

        let mail = MailConfig {
            resend,
            smtp,
            admin_email: env_or("ADMIN_EMAIL", "admin@geelongmovement.com"),
            from_email: env_or("FROM_EMAIL", "noreply@geelongmovement.com"),
        };

        Ok(Config {
            host,
            port,
            environment,
            allowed_origins,
            max_body_size,
            max_payload_bytes,
            rate_limit: RateLimitConfig {
                max_requests,
                window: Duration::from_secs(window_secs),
                sweep_interval: Duration::from_secs(sweep_secs),
            },
            outbound_timeout: Duration::from_secs(timeout_secs),
            log_level,
            turnstile,
            mail,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
