use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChatId, MessageId, UserId};

/// Update posted by Telegram to the webhook when a message is delivered.
///
/// Decoding is lenient: missing fields keep their zero value and unknown fields
/// are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundMessage {
    pub update_id: i64,
    pub message: MessageRecord,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageRecord {
    pub message_id: MessageId,
    pub from: Sender,
    pub chat: Chat,
    /// Unix timestamp (seconds).
    pub date: i64,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sender {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chat {
    pub id: ChatId,
    pub first_name: String,
    pub last_name: String,
    /// "private", "group", "supergroup" or "channel".
    #[serde(rename = "type")]
    pub kind: String,
}

impl InboundMessage {
    pub fn chat_id(&self) -> ChatId {
        self.message.chat.id
    }

    pub fn text(&self) -> &str {
        &self.message.text
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.message.date, 0)
    }
}

/// Formatting applied by Telegram to an outbound text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[default]
    #[serde(rename = "")]
    Plain,
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

/// Body of a `sendMessage` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub parse_mode: ParseMode,
}

impl OutboundMessage {
    pub fn markdown(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: ParseMode::Markdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"{"update_id":1,"message":{"message_id":2,"from":{"id":10,"first_name":"A"},"chat":{"id":10,"type":"private"},"date":1000,"text":"hi"}}"#;

    #[test]
    fn decodes_provider_update() {
        let msg: InboundMessage = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(msg.update_id, 1);
        assert_eq!(msg.message.message_id, MessageId(2));
        assert_eq!(msg.message.from.id, UserId(10));
        assert_eq!(msg.message.from.first_name, "A");
        assert_eq!(msg.message.from.last_name, "");
        assert_eq!(msg.chat_id(), ChatId(10));
        assert_eq!(msg.message.chat.kind, "private");
        assert_eq!(msg.text(), "hi");
        assert_eq!(msg.sent_at().unwrap().timestamp(), 1000);
    }

    #[test]
    fn reencoding_keeps_populated_fields() {
        let msg: InboundMessage = serde_json::from_str(SAMPLE).unwrap();
        let v = serde_json::to_value(&msg).unwrap();

        assert_eq!(v["update_id"], 1);
        assert_eq!(v["message"]["message_id"], 2);
        assert_eq!(v["message"]["from"]["id"], 10);
        assert_eq!(v["message"]["from"]["first_name"], "A");
        assert_eq!(v["message"]["chat"]["id"], 10);
        assert_eq!(v["message"]["chat"]["type"], "private");
        assert_eq!(v["message"]["date"], 1000);
        assert_eq!(v["message"]["text"], "hi");

        let again: InboundMessage = serde_json::from_value(v).unwrap();
        assert_eq!(again, msg);
    }

    #[test]
    fn missing_and_unknown_fields_are_tolerated() {
        let msg: InboundMessage =
            serde_json::from_value(json!({"update_id": 7, "edited_message": {"x": 1}})).unwrap();
        assert_eq!(msg.update_id, 7);
        assert_eq!(msg.message, MessageRecord::default());

        let msg: InboundMessage = serde_json::from_str("{}").unwrap();
        assert_eq!(msg, InboundMessage::default());
    }

    #[test]
    fn malformed_bodies_fail_to_decode() {
        assert!(serde_json::from_str::<InboundMessage>("{not json").is_err());
        assert!(serde_json::from_str::<InboundMessage>("[1,2]").is_err());
        assert!(serde_json::from_str::<InboundMessage>(r#"{"update_id":"x"}"#).is_err());
    }

    #[test]
    fn outbound_uses_provider_parse_mode_strings() {
        let body = serde_json::to_value(OutboundMessage::markdown(ChatId(10), "hello")).unwrap();
        assert_eq!(
            body,
            json!({"chat_id": 10, "text": "hello", "parse_mode": "Markdown"})
        );

        assert_eq!(serde_json::to_value(ParseMode::Html).unwrap(), json!("HTML"));
        assert_eq!(serde_json::to_value(ParseMode::Plain).unwrap(), json!(""));
    }
}
