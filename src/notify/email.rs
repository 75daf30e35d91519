//! # Officer Email
//! SMTP mailer behind a capability trait so tests and the demo can swap in
//! recording/failing doubles. An unconfigured relay yields [`DisabledMailer`]
//! and the pipeline simply skips email.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use tracing::debug;

use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message. The dispatcher absorbs any error.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub type DynMailer = Arc<dyn Mailer>;

/// Build a mailer from config: a real SMTP transport when a relay is
/// configured, the disabled stand-in otherwise.
pub fn build_from_config(config: &SmtpConfig) -> Result<DynMailer> {
    if !config.is_configured() {
        return Ok(Arc::new(DisabledMailer));
    }
    Ok(Arc::new(SmtpMailer::new(config)?))
}

/// Logs and drops every message. Used when SMTP is not configured.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<()> {
        debug!(target: "notify", to, subject, "smtp disabled; dropping email");
        Ok(())
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .context("invalid smtp host")?;
        let user = config.user.trim();
        if !user.is_empty() {
            builder = builder.credentials(Credentials::new(
                user.to_string(),
                config.resolved_pass(),
            ));
        }
        let from = config.from.parse().context("invalid smtp from address")?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let to: Mailbox = to.parse().context("invalid recipient address")?;
        let msg = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html.to_string())
            .context("build email")?;
        self.transport.send(msg).await.context("send email")?;
        Ok(())
    }
    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// Test double capturing every message.
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<SentMail>>,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                html: html.to_string(),
            });
        Ok(())
    }
    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Test double that always fails, for the absorbed-failure path.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _html: &str) -> Result<()> {
        anyhow::bail!("smtp relay unreachable")
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}
