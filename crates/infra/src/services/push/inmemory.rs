use super::{IPushTransport, PushMessage, TokenOutcome};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Recording transport for tests: remembers every message, can mark
/// individual tokens as unregistered and can simulate a transport
/// outage.
pub struct InMemoryPushTransport {
    sent: Mutex<Vec<PushMessage>>,
    invalid_tokens: Mutex<HashSet<String>>,
    failing: AtomicBool,
}

impl InMemoryPushTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            invalid_tokens: Mutex::new(HashSet::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn sent_messages(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn mark_token_invalid(&self, token: &str) {
        self.invalid_tokens.lock().unwrap().insert(token.to_string());
    }

    /// Every following send fails at the transport level, as a network
    /// or auth outage would
    pub fn fail_next_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }
}

impl Default for InMemoryPushTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IPushTransport for InMemoryPushTransport {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<Vec<TokenOutcome>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Push transport is unavailable"));
        }

        self.sent.lock().unwrap().push(message.clone());

        let invalid_tokens = self.invalid_tokens.lock().unwrap();
        Ok(message
            .tokens
            .iter()
            .map(|token| {
                if invalid_tokens.contains(token) {
                    TokenOutcome::failed(
                        token.clone(),
                        Some("UNREGISTERED".to_string()),
                        "Requested entity was not found.".to_string(),
                    )
                } else {
                    TokenOutcome::ok(token.clone())
                }
            })
            .collect())
    }
}
