use async_trait::async_trait;

use crate::Result;

/// Injected free-text completion capability.
///
/// The story decomposer is the only consumer. The caller owns the deadline:
/// it races `complete` against a timer and maps expiry to its own timeout
/// error, so implementations do not need timeout handling of their own.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    /// Identifier for logs and error messages (e.g. "command", "mock").
    fn name(&self) -> &str;

    /// Complete a prompt and return the raw text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Whether the backing capability can run at all (binary present,
    /// endpoint configured). Checked before building a prompt.
    fn is_available(&self) -> bool {
        true
    }
}
