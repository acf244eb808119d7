use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Outbound side of a messenger.
///
/// Handlers talk to this trait rather than to a concrete sender so they can be
/// exercised against a fake.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send `text` (Markdown) to `chat_id`. Not retried.
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()>;
}
