//! Send the sample operator/submitter email pair through the configured
//! mail provider. Refuses to run unless `FMS_ENV=development`.

use tracing_subscriber::EnvFilter;

use fms_intake::config::Config;
use fms_intake::notify::{self, EmailNotifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    let notifier = EmailNotifier::from_config(&config.mail, config.outbound_timeout);

    let delivery = notify::send_test_email(&notifier, config.environment).await?;
    tracing::info!(
        admin_email_id = ?delivery.admin_email_id,
        customer_email_id = ?delivery.customer_email_id,
        "Test emails sent"
    );

    Ok(())
}
