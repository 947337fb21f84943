//! Notifier trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// An outbound email message.
#[derive(Debug, Clone)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Error returned by a failed mail dispatch.
///
/// Callers in the transaction core log and count these; they are never
/// propagated into a transaction outcome.
#[derive(Debug, Error)]
#[error("mail dispatch failed: {0}")]
pub struct NotifierError(pub String);

/// Trait for best-effort mail dispatch.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a single message.
    async fn send(&self, mail: Mail) -> Result<(), NotifierError>;
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<Mail>,
    fail_on_send: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every send call.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of messages sent.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns copies of all sent messages.
    pub fn sent(&self) -> Vec<Mail> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns true if a message was sent to the given address.
    pub fn sent_to(&self, to: &str) -> bool {
        self.state.read().unwrap().sent.iter().any(|m| m.to == to)
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, mail: Mail) -> Result<(), NotifierError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(NotifierError("SMTP relay unreachable".to_string()));
        }

        state.sent.push(mail);
        Ok(())
    }
}
