//! Telegram webhook adapter.
//!
//! [`Session`] receives updates on an HTTPS callback endpoint, hands them one at
//! a time to a caller-supplied [`Handler`], and sends replies through the Bot
//! API's `sendMessage`.

pub mod sender;
pub mod session;
pub mod webhook;

pub use sender::TelegramSender;
pub use session::{Handler, Session};
