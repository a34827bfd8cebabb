pub mod resend;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Composed but not handed to any provider.
    NotConfigured,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<Delivery>;
}

/// Used when no email provider is configured: logs the message and stops there.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<Delivery> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "email notification prepared, no provider configured"
        );
        Ok(Delivery::NotConfigured)
    }
}
