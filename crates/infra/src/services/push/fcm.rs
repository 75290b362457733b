use super::{IPushTransport, PushMessage, TokenOutcome};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;

const FCM_API_BASE_URL: &str = "https://fcm.googleapis.com/v1/projects";

/// Firebase Cloud Messaging transport (HTTP v1 API).
///
/// The v1 API takes one device token per request, so a batched send
/// fans out into one request per token while keeping the per-token
/// outcome reporting a single multicast call would give.
///
/// A transport-level error (network, auth) aborts the remaining
/// fan-out and fails the whole batch so the job is retried. Tokens
/// already delivered in that batch receive the message again on the
/// retry, which at-least-once delivery permits.
pub struct FcmPushTransport {
    client: Client,
    project_id: String,
    access_token: String,
}

impl FcmPushTransport {
    pub fn new(project_id: String, access_token: String) -> Self {
        Self {
            client: Client::new(),
            project_id,
            access_token,
        }
    }

    fn send_url(&self) -> String {
        format!("{}/{}/messages:send", FCM_API_BASE_URL, self.project_id)
    }

    async fn send_to_token(
        &self,
        message: &PushMessage,
        token: &str,
    ) -> anyhow::Result<TokenOutcome> {
        let body = FcmSendRequest {
            message: FcmMessage {
                token: token.to_string(),
                notification: FcmNotification {
                    title: message.title.clone(),
                    body: message.body.clone(),
                },
                data: message.data.clone(),
                android: FcmAndroidConfig {
                    priority: "high".to_string(),
                },
            },
        };

        let res = self
            .client
            .post(&self.send_url())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if res.status().is_success() {
            return Ok(TokenOutcome::ok(token.to_string()));
        }

        // Auth failures have nothing to do with the token, surface them
        // as a transport failure so the job is retried
        if res.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(anyhow::anyhow!("FCM rejected the access token"));
        }

        let err: FcmErrorResponse = res.json().await.unwrap_or_default();
        Ok(TokenOutcome::failed(
            token.to_string(),
            err.error.as_ref().map(|e| e.status.clone()),
            err.error
                .map(|e| e.message)
                .unwrap_or_else(|| "Unknown FCM error".to_string()),
        ))
    }
}

#[async_trait::async_trait]
impl IPushTransport for FcmPushTransport {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<Vec<TokenOutcome>> {
        let mut outcomes = Vec::with_capacity(message.tokens.len());
        for token in &message.tokens {
            let outcome = self.send_to_token(message, token).await.map_err(|e| {
                error!("FCM transport failure: {:?}", e);
                e
            })?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[derive(Debug, Serialize)]
struct FcmSendRequest {
    message: FcmMessage,
}

#[derive(Debug, Serialize)]
struct FcmMessage {
    token: String,
    notification: FcmNotification,
    data: HashMap<String, String>,
    android: FcmAndroidConfig,
}

#[derive(Debug, Serialize)]
struct FcmNotification {
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct FcmAndroidConfig {
    priority: String,
}

#[derive(Debug, Deserialize, Default)]
struct FcmErrorResponse {
    error: Option<FcmError>,
}

#[derive(Debug, Deserialize)]
struct FcmError {
    status: String,
    message: String,
}
