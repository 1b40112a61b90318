//! Contact-form mail delivery through the Resend HTTP API.

use crate::errors::ServiceError;
use serde_json::json;
use std::time::Duration;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct ContactMailer {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    recipient: String,
}

/// A contact-form submission from the scripted chat flow.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub subject: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ContactMailer {
    pub fn new(api_key: String, api_base: String, recipient: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client construction cannot fail with static options"),
            api_key,
            api_base,
            recipient,
        }
    }

    /// Deliver a contact-form submission to the service inbox. Reply-to is
    /// only set when the submitted address actually parses as an email, so
    /// free-text input cannot break delivery.
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    pub async fn send_contact(&self, message: &ContactMessage) -> Result<(), ServiceError> {
        let mut body = json!({
            "from": format!("CT Studio <{}>", self.recipient),
            "to": self.recipient,
            "subject": format!("Neue Anfrage: {}", message.subject),
            "html": self.render(message),
        });
        if looks_like_email(&message.email) {
            body["reply_to"] = json!(message.email);
        }

        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("resend: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "contact mail delivery failed");
            return Err(ServiceError::ExternalServiceError(format!(
                "mail provider returned {}",
                status
            )));
        }

        info!("contact mail delivered");
        Ok(())
    }

    fn render(&self, message: &ContactMessage) -> String {
        format!(
            "<h2>Neue Anfrage: {}</h2>\
             <p><strong>Name:</strong> {}</p>\
             <p><strong>E-Mail:</strong> {}</p>\
             <p><strong>Telefon:</strong> {}</p>",
            escape(&message.subject),
            escape(&message.name),
            escape(&message.email),
            escape(&message.phone),
        )
    }
}

fn looks_like_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        _ => false,
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
