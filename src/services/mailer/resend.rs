use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use super::{Delivery, Mailer, OutgoingEmail};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

pub struct ResendMailer {
    api_key: String,
    from: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<Delivery> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        self.client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("failed to send Resend email")?
            .error_for_status()
            .context("Resend API returned error")?;

        tracing::info!(to = %email.to, subject = %email.subject, "email notification sent");
        Ok(Delivery::Sent)
    }
}
