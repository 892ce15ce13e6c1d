use std::time::Duration;

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use serde::Deserialize;

use super::{Notifier, NotifyError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    #[default]
    #[serde(alias = "start_tls")]
    StartTls,
    Tls,
    Plain,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub security: SmtpSecurity,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub to: Vec<String>,
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_timeout_secs() -> u64 {
    20
}

pub struct EmailNotifier {
    from: Mailbox,
    to: Vec<Mailbox>,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&config.from)?;
        let to = config.to.iter().map(|addr| parse_mailbox(addr)).collect::<Result<Vec<_>, _>>()?;

        if to.is_empty() {
            return Err(NotifyError::Configuration {
                reason: "No recipients configured".to_string(),
            });
        }

        let builder = match config.security {
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server),
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server),
            SmtpSecurity::Plain => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                &config.smtp_server,
            )),
        }
        .map_err(|e| NotifyError::Configuration {
            reason: format!("Invalid SMTP server {}: {}", config.smtp_server, e),
        })?
        .port(config.smtp_port)
        .timeout(Some(Duration::from_secs(config.timeout_secs)));

        let builder = match (&config.username, &config.password) {
            (Some(user), Some(password)) => builder.credentials(Credentials::new(user.clone(), password.clone())),
            _ => builder,
        };

        Ok(Self {
            from,
            to,
            transport: builder.build(),
        })
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);

        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }

        builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Delivery {
                reason: format!("Failed to build email: {}", e),
            })
    }
}

impl Notifier for EmailNotifier {
    #[tracing::instrument(name = "notify EMAIL", skip_all, fields(subject = %subject))]
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(subject, body)?;

        self.transport.send(message).await.map_err(|e| NotifyError::Delivery {
            reason: e.to_string(),
        })?;

        tracing::info!("Usage alert e-mail sent to {} recipient(s)", self.to.len());
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e| NotifyError::Configuration {
        reason: format!("Invalid e-mail address {}: {}", address, e),
    })
}
