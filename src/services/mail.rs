use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{
    Config,
    services::ServiceResult,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    async fn send(&self, message: MailMessage) -> ServiceResult<()>;
}

pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").field("from", &self.from).finish()
    }
}

impl SmtpMailer {
    pub fn new(config: &crate::config::Mail) -> ServiceResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(config.host())?
            .port(config.port())
            .credentials(Credentials::new(
                config.username().to_string(),
                config.password().to_string(),
            ))
            .build();

        Ok(Self {
            from: config.from().parse()?,
            transport,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> ServiceResult<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html)?;

        self.transport.send(email).await?;
        tracing::debug!(to = %message.to, "mail delivered to smtp relay");
        Ok(())
    }
}

/// Used when no SMTP relay is configured: the message only goes to the log.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> ServiceResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "smtp not configured, mail not sent:\n{}",
            message.html
        );
        Ok(())
    }
}

/// Keeps every message in memory. Integration tests read magic links back
/// out of it.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: MailMessage) -> ServiceResult<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}

pub fn mailer_from_config(config: &Config) -> ServiceResult<Arc<dyn Mailer>> {
    match config.mail() {
        Some(mail) => Ok(Arc::new(SmtpMailer::new(mail)?)),
        None => {
            tracing::warn!("no [mail] section in config, magic links will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

pub fn magic_link_message(to: &str, link: &str, valid_hours: i64) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: String::from("Your magic link for the course"),
        html: format!(
            r#"<h1>Welcome to the course!</h1>
<p>Click the link below to access your account:</p>
<a href="{link}">{link}</a>
<p>This link will expire in {valid_hours} hours.</p>"#
        ),
    }
}
