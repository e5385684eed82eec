//! Outbound notifications.
//!
//! The service only sends one kind of notice: a credential was issued. The
//! notice carries the label, display prefix, issuer and expiry, never the
//! plaintext.
//!
//! `WebhookNotifier` delivers notices as signed JSON to a relay that owns the
//! actual mail/chat integration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::models::credential::CredentialRecord;

type HmacSha256 = Hmac<Sha256>;

/// Delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid notification URL: {0}")]
    InvalidUrl(String),

    #[error("Notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Notification rejected with status {0}")]
    Rejected(u16),

    #[error("Failed to serialize notification: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Delivers a message to an address.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// JSON body POSTed to the relay.
#[derive(Debug, Serialize)]
pub struct NotificationPayload<'a> {
    pub id: Uuid,
    pub address: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub sent_at: DateTime<Utc>,
}

/// Sends notifications to a webhook relay.
///
/// # Headers Sent
///
/// - `Content-Type: application/json`
/// - `X-Webhook-Signature: sha256=<hex>`
/// - `X-Webhook-Event-Id: <uuid>`
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    secret: String,
}

impl WebhookNotifier {
    /// Build a notifier for `url`, signing with `secret`.
    ///
    /// 5 second timeout per delivery.
    pub fn new(url: &str, secret: &str) -> Result<Self, NotifyError> {
        validate_webhook_url(url)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            secret: secret.to_string(),
        })
    }
}

#[async_trait]
impl NotificationSender for WebhookNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let payload = NotificationPayload {
            id: Uuid::new_v4(),
            address,
            subject,
            body,
            sent_at: Utc::now(),
        };
        let payload_json = serde_json::to_string(&payload)?;
        let signature = generate_signature(&self.secret, &payload_json);

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-Webhook-Signature", &signature)
            .header("X-Webhook-Event-Id", payload.id.to_string())
            .body(payload_json)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        tracing::debug!(event_id = %payload.id, "notification delivered");
        Ok(())
    }
}

/// Subject and body of the issuance notice.
pub fn issuance_notice(record: &CredentialRecord) -> (String, String) {
    let subject = format!("Credential '{}' issued", record.label);
    let expiry = record
        .expires_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let body = format!(
        "A credential labelled '{}' ({}...) was issued by {}.\nElevated: {}\nExpires: {}\n\
         The secret itself is only shown to the issuer.",
        record.label,
        record.display_prefix,
        record.issued_by.as_deref().unwrap_or("unknown"),
        record.elevated,
        expiry,
    );
    (subject, body)
}

/// Send the issuance notice in the background.
///
/// Delivery failure is logged and never affects the issuance.
pub fn notify_issued(sender: Arc<dyn NotificationSender>, address: String, record: &CredentialRecord) {
    let (subject, body) = issuance_notice(record);
    let credential_id = record.id;

    tokio::spawn(async move {
        if let Err(e) = sender.send(&address, &subject, &body).await {
            tracing::error!(credential_id, "failed to send issuance notice: {}", e);
        }
    });
}

/// Generate HMAC-SHA256 signature for a payload.
///
/// # Format
///
/// `sha256=<hex_encoded_hmac>`
///
/// Receivers recompute HMAC-SHA256(secret, body) and compare in constant time.
pub fn generate_signature(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key length is valid");
    mac.update(payload.as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Validate webhook URL format.
///
/// # Rules
///
/// - Must be valid URL
/// - Must be HTTPS (HTTP localhost allowed for development)
/// - Maximum 2048 characters
pub fn validate_webhook_url(url: &str) -> Result<(), NotifyError> {
    if url.len() > 2048 {
        return Err(NotifyError::InvalidUrl(
            "URL exceeds 2048 characters".to_string(),
        ));
    }

    let parsed =
        url::Url::parse(url).map_err(|_| NotifyError::InvalidUrl("Invalid URL format".to_string()))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => match parsed.host_str() {
            Some("localhost" | "127.0.0.1" | "0.0.0.0") => Ok(()),
            _ => Err(NotifyError::InvalidUrl(
                "HTTP is only allowed for localhost. Use HTTPS for production.".to_string(),
            )),
        },
        _ => Err(NotifyError::InvalidUrl(
            "URL must use HTTP or HTTPS".to_string(),
        )),
    }
}
