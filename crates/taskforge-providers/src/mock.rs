use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::{Error, Result, TextCompleter};

/// Deterministic completer for tests: fixed responses in order, optional
/// artificial delay, optional simulated failure.
pub struct MockCompleter {
    responses: Vec<String>,
    call_count: AtomicUsize,
    delay: Option<Duration>,
    fail_with: Option<String>,
}

impl MockCompleter {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            call_count: AtomicUsize::new(0),
            delay: None,
            fail_with: None,
        }
    }

    pub fn single(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Sleep before responding; lets tests drive the caller's timeout race.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every call with an upstream error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: vec![],
            call_count: AtomicUsize::new(0),
            delay: None,
            fail_with: Some(message.into()),
        }
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextCompleter for MockCompleter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail_with {
            return Err(Error::Upstream(message.clone()));
        }
        self.responses
            .get(call.min(self.responses.len().saturating_sub(1)))
            .cloned()
            .ok_or_else(|| Error::Upstream("mock has no responses configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_responses_in_order() {
        let mock = MockCompleter::new(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(mock.complete("p").await.unwrap(), "first");
        assert_eq!(mock.complete("p").await.unwrap(), "second");
        // Last response repeats once exhausted.
        assert_eq!(mock.complete("p").await.unwrap(), "second");
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockCompleter::failing("boom");
        let err = mock.complete("p").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
