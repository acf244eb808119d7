//! Echo handler: replies to every text message with the same text.

use hookbot_core::{
    messaging::{
        delivery::{Delivery, DeliveryReceiver},
        port::MessagingPort,
    },
    Result,
};
use hookbot_telegram::Session;
use tracing::{debug, warn};

pub async fn run(mut inbox: DeliveryReceiver, session: Session) {
    while let Some(delivery) = inbox.recv().await {
        if let Err(e) = echo(&session, delivery).await {
            warn!("echo reply failed: {e}");
        }
    }
}

/// Returns `Ok(true)` if a reply was sent.
async fn echo(port: &dyn MessagingPort, delivery: Delivery) -> Result<bool> {
    let Delivery::Message(update) = delivery else {
        warn!("discarding malformed update");
        return Ok(false);
    };

    if update.text().trim().is_empty() {
        debug!(update_id = update.update_id, "no text to echo");
        return Ok(false);
    }

    port.send_message(update.chat_id(), update.text()).await?;
    Ok(true)
}
