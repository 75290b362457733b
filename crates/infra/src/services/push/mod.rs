mod fcm;
mod inmemory;

pub use fcm::FcmPushTransport;
pub use inmemory::InMemoryPushTransport;

use crate::system::ISys;
use campus_notify_domain::Notification;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Error codes with which a transport reports a permanently unusable
/// device token
const INVALID_TOKEN_ERROR_CODES: [&str; 2] = ["UNREGISTERED", "INVALID_ARGUMENT"];

/// One batched message handed to the transport
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

/// Outcome for a single device token as reported by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TokenOutcome {
    pub token: String,
    pub success: bool,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl TokenOutcome {
    pub fn ok(token: String) -> Self {
        Self {
            token,
            success: true,
            error_code: None,
            error_message: None,
        }
    }

    pub fn failed(token: String, code: Option<String>, message: String) -> Self {
        Self {
            token,
            success: false,
            error_code: code,
            error_message: Some(message),
        }
    }
}

/// Aggregate result of one send, including the tokens the transport
/// marked permanently invalid. The caller owns pruning those from the
/// device store; this client only reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub outcomes: Vec<TokenOutcome>,
    pub invalid_tokens: Vec<String>,
}

impl DeliveryReport {
    pub fn summary(&self) -> String {
        format!(
            "sent: {}, failed: {}",
            self.success_count, self.failure_count
        )
    }
}

/// The external push transport. An `Err` means the transport itself
/// failed (network, auth) with no per-token breakdown and is treated by
/// callers as retryable.
#[async_trait::async_trait]
pub trait IPushTransport: Send + Sync {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<Vec<TokenOutcome>>;
}

/// Push delivery client: filters blank tokens, injects the server-side
/// timestamp, flattens the notification and classifies per-token
/// failures from the transport's report.
#[derive(Clone)]
pub struct PushClient {
    transport: Arc<dyn IPushTransport>,
    sys: Arc<dyn ISys>,
}

impl PushClient {
    pub fn new(transport: Arc<dyn IPushTransport>, sys: Arc<dyn ISys>) -> Self {
        Self { transport, sys }
    }

    pub async fn send_one(
        &self,
        token: &str,
        notification: &Notification,
    ) -> anyhow::Result<DeliveryReport> {
        self.send_many(&[token.to_string()], notification).await
    }

    pub async fn send_many(
        &self,
        tokens: &[String],
        notification: &Notification,
    ) -> anyhow::Result<DeliveryReport> {
        let valid_tokens = tokens
            .iter()
            .filter(|token| !token.trim().is_empty())
            .cloned()
            .collect::<Vec<_>>();
        if valid_tokens.is_empty() {
            return Ok(DeliveryReport::default());
        }

        let mut data = notification.to_data_map();
        data.insert(
            "timestamp".to_string(),
            self.sys.get_timestamp_millis().to_string(),
        );

        let message = PushMessage {
            tokens: valid_tokens,
            title: notification.title(),
            body: notification.body(),
            data,
        };

        let outcomes = self.transport.send(&message).await?;

        let mut report = DeliveryReport::default();
        for outcome in outcomes {
            if outcome.success {
                report.success_count += 1;
            } else {
                report.failure_count += 1;
                let invalid = outcome
                    .error_code
                    .as_deref()
                    .map(|code| INVALID_TOKEN_ERROR_CODES.contains(&code))
                    .unwrap_or(false);
                if invalid {
                    report.invalid_tokens.push(outcome.token.clone());
                }
            }
            report.outcomes.push(outcome);
        }

        if !report.invalid_tokens.is_empty() {
            info!(
                "{} token(s) reported invalid by the push transport",
                report.invalid_tokens.len()
            );
        }

        Ok(report)
    }
}
