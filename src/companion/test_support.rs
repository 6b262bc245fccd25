//! Scripted completion backend for orchestrator and decision tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::inference::{ChatMessage, CompletionBackend, CompletionError};
use crate::storage::Credential;

/// One scripted reply.
pub enum Reply {
    Content(String),
    Error(CompletionError),
    /// Never answers within any reasonable test timeout.
    Hang,
}

/// Replays queued replies in order and counts calls.
///
/// When the queue runs dry every further call fails with `RateLimited`.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self::new(vec![Reply::Content(content.into())])
    }

    pub fn error(err: CompletionError) -> Self {
        Self::new(vec![Reply::Error(err)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        _credential: &Credential,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages;
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Content(c)) => Ok(c),
            Some(Reply::Error(e)) => Err(e),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(CompletionError::RateLimited)
            }
            None => Err(CompletionError::RateLimited),
        }
    }
}
