//! Mock provider for testing and offline development.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::traits::*;

/// Scripted reply
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

impl Reply {
    fn into_result(self) -> Result<String, ProviderError> {
        match self {
            Reply::Text(text) => Ok(text),
            Reply::Fail(reason) => Err(ProviderError::Unavailable(reason)),
        }
    }
}

/// Mock provider.
///
/// Replies are chosen in this order: queued one-shot replies, then the first
/// rule whose needle occurs in the prompt, then the default reply.
pub struct MockProvider {
    name: String,
    default_reply: Reply,
    rules: Vec<(String, Reply)>,
    queue: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_count: AtomicU32,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_reply: Reply::Text("Mock response".to_string()),
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the default reply.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.default_reply = Reply::Text(content.into());
        self
    }

    /// Fail every call that no rule or queued reply covers.
    pub fn failing(mut self) -> Self {
        self.default_reply = Reply::Fail(format!("{} disabled", self.name));
        self
    }

    /// Reply with `content` whenever the prompt contains `needle`.
    pub fn when(mut self, needle: impl Into<String>, content: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Text(content.into())));
        self
    }

    /// Fail whenever the prompt contains `needle`.
    pub fn fail_when(mut self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        let reason = format!("scripted failure for '{}'", needle);
        self.rules.push((needle, Reply::Fail(reason)));
        self
    }

    /// Queue one-shot replies consumed before any rule applies.
    pub fn then(self, content: impl Into<String>) -> Self {
        self.lock_queue().push_back(Reply::Text(content.into()));
        self
    }

    /// Queue a one-shot failure.
    pub fn then_fail(self) -> Self {
        let reason = format!("{} scripted failure", self.name);
        self.lock_queue().push_back(Reply::Fail(reason));
        self
    }

    /// Number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Reply>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Mock")
    }
}

#[async_trait]
impl ScoringProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let reply = self.lock_queue().pop_front().unwrap_or_else(|| {
            self.rules
                .iter()
                .find(|(needle, _)| request.prompt.contains(needle.as_str()))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| self.default_reply.clone())
        });

        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request);
        }

        reply.into_result()
    }
}
