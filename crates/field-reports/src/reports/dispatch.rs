//! Outbound delivery through the WhatsApp gateway.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MessagingConfig;

use super::domain::normalize_phone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub message_id: String,
}

/// Delivery failures. Provider-reported rejections, transport errors, and
/// timeouts all land in `Send`; callers only distinguish sent from not-sent.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("recipient phone number is empty after normalization")]
    EmptyRecipient,
    #[error("gateway client could not be built: {0}")]
    Client(String),
    #[error("send failed: {0}")]
    Send(String),
}

/// Outbound message port so runs can be exercised against a recording fake.
#[async_trait::async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn send(&self, phone: &str, body: &str) -> Result<DispatchReceipt, DispatchError>;
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    to: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    success: bool,
    #[serde(default)]
    data: Option<MessagePayload>,
    #[serde(default)]
    error: Option<GatewayError>,
}

#[derive(Deserialize)]
struct MessagePayload {
    #[serde(rename = "messageId")]
    message_id: String,
}

#[derive(Deserialize)]
struct GatewayError {
    message: String,
}

/// Gateway client for one WhatsApp session.
///
/// Consecutive sends through the same instance are paced by a cooperative
/// sleep; the pacing state is per instance, so runs against different
/// sessions never wait on each other.
pub struct WhatsAppDispatcher {
    http: reqwest::Client,
    config: MessagingConfig,
    last_send: tokio::sync::Mutex<Option<Instant>>,
}

impl WhatsAppDispatcher {
    pub fn new(config: MessagingConfig) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| DispatchError::Client(err.to_string()))?;

        Ok(Self {
            http,
            config,
            last_send: tokio::sync::Mutex::new(None),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/api/v1/messages/send",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn pace(&self) {
        let mut last = self.last_send.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.config.send_delay {
                tokio::time::sleep(self.config.send_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait::async_trait]
impl MessageDispatcher for WhatsAppDispatcher {
    async fn send(&self, phone: &str, body: &str) -> Result<DispatchReceipt, DispatchError> {
        let digits = normalize_phone(phone);
        if digits.is_empty() {
            return Err(DispatchError::EmptyRecipient);
        }

        self.pace().await;
        debug!(to = %digits, chars = body.len(), "posting message to gateway");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.config.api_key)
            .header("x-session-id", &self.config.session_id)
            .json(&SendMessageRequest {
                to: &digits,
                text: body,
            })
            .send()
            .await
            .map_err(|err| DispatchError::Send(err.to_string()))?;

        let status = response.status();
        let payload: SendMessageResponse = response
            .json()
            .await
            .map_err(|err| DispatchError::Send(format!("malformed gateway response: {err}")))?;

        if !status.is_success() || !payload.success {
            let message = payload
                .error
                .map(|err| err.message)
                .unwrap_or_else(|| format!("gateway returned status {status}"));
            return Err(DispatchError::Send(message));
        }

        match payload.data {
            Some(data) => Ok(DispatchReceipt {
                message_id: data.message_id,
            }),
            None => Err(DispatchError::Send(
                "gateway response missing message id".to_string(),
            )),
        }
    }
}
