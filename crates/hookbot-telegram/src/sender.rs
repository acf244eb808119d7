//! Outbound `sendMessage` client.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use tracing::{debug, warn};

use hookbot_core::{
    config::SessionConfig,
    domain::ChatId,
    errors::{Error, SendError},
    messaging::{port::MessagingPort, types::OutboundMessage},
    Result,
};

/// Keep error bodies short in logs and error values.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct TelegramSender {
    url: String,
    http: reqwest::Client,
}

impl TelegramSender {
    pub fn new(cfg: &SessionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.send_timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self {
            url: cfg.send_message_url(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `text` as Markdown to `chat_id`.
    ///
    /// Succeeds only on HTTP 200, after the response body has been drained.
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
    ) -> std::result::Result<(), SendError> {
        let result = self.send(OutboundMessage::markdown(chat_id, text)).await;
        match &result {
            Ok(()) => debug!(chat_id = chat_id.0, "sendMessage ok"),
            Err(e) => warn!(chat_id = chat_id.0, kind = ?e.kind(), "sendMessage failed: {e}"),
        }
        result
    }

    async fn send(&self, msg: OutboundMessage) -> std::result::Result<(), SendError> {
        let body = serde_json::to_vec(&msg)?;

        // Telegram accepts a JSON body on GET; keep it that way.
        let request = self
            .http
            .get(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()
            .map_err(SendError::build)?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(SendError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(SendError::ResponseRead)?;

        if status != StatusCode::OK {
            return Err(SendError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(MAX_ERROR_BODY_CHARS)
                    .collect(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl MessagingPort for TelegramSender {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        TelegramSender::send_message(self, chat_id, text)
            .await
            .map_err(Error::from)
    }
}
