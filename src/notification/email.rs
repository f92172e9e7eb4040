use anyhow::Context;
use serde::Serialize;

use crate::models::contact::Contact;

/// Sends contact-request notifications through an HTTP mail relay.
///
/// The relay accepts `{to, subject, text}` and handles the actual SMTP
/// delivery. When no relay URL is configured the notifier is a no-op and
/// contact submissions proceed without mail.
#[derive(Clone)]
pub struct EmailNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
    recipient: Option<String>,
}

#[derive(Serialize)]
struct MailMessage {
    to: String,
    subject: String,
    text: String,
}

impl EmailNotifier {
    pub fn new(webhook_url: Option<String>, recipient: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
            recipient,
        }
    }

    /// Notify the shop staff about a new contact request.
    pub async fn send_contact_request(
        &self,
        contact: &Contact,
        product_name: Option<&str>,
    ) -> anyhow::Result<()> {
        let (url, to) = match (&self.webhook_url, &self.recipient) {
            (Some(url), Some(to)) => (url, to),
            _ => {
                tracing::debug!("mail relay not configured, skipping contact notification");
                return Ok(());
            }
        };

        let name = match &contact.last_name {
            Some(last) => format!("{} {}", contact.first_name, last),
            None => contact.first_name.clone(),
        };
        let mut text = format!("{} просить передзвонити: {}", name, contact.mobile_phone);
        if let Some(product) = product_name {
            text.push_str(&format!("\nТовар: {}", product));
        }
        if let Some(note) = &contact.comment {
            text.push_str(&format!("\nЗаписка: {}", note));
        }

        let message = MailMessage {
            to: to.clone(),
            subject: format!("Нова заявка №{}", contact.id),
            text,
        };

        let resp = self
            .client
            .post(url)
            .json(&message)
            .send()
            .await
            .context("failed to reach mail relay")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("mail relay returned error: status={}, body={}", status, body);
        }

        tracing::info!(contact = %contact.id, "sent contact notification");
        Ok(())
    }
}
