mod email;

use std::future::Future;
use std::time::Duration;

use derive_more::derive::{Display, Error};
use serde::Deserialize;

pub use email::{EmailConfig, EmailNotifier, SmtpSecurity};

#[derive(Debug, Display, Error)]
pub enum NotifyError {
    #[display("Invalid notifier configuration: {reason}")]
    Configuration { reason: String },

    #[display("Notification delivery failed: {reason}")]
    Delivery { reason: String },

    #[display("Notification timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, subject: &str, body: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettings {
    pub email: Option<EmailConfig>,
}

impl NotificationSettings {
    pub fn new_notifier(&self) -> Result<MeterNotifier, NotifyError> {
        match &self.email {
            Some(config) => Ok(MeterNotifier::Email(EmailNotifier::new(config)?)),
            None => {
                tracing::warn!("No e-mail notification configured, usage alerts are only logged");
                Ok(MeterNotifier::LogOnly)
            }
        }
    }
}

pub enum MeterNotifier {
    Email(EmailNotifier),
    LogOnly,
}

impl Notifier for MeterNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        match self {
            MeterNotifier::Email(email) => email.notify(subject, body).await,
            MeterNotifier::LogOnly => {
                tracing::warn!("{}: {}", subject, body);
                Ok(())
            }
        }
    }
}
