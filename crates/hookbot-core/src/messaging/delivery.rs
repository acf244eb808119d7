//! Hand-off queue between the webhook receiver and the handler task.
//!
//! The queue holds at most one event, and a producer's `deliver` only resolves
//! once the consumer has taken its event. With a single consumer this means the
//! receiver never decodes ahead of the handler: one message in flight, always.

use tokio::sync::{mpsc, oneshot};

use crate::{errors::Error, messaging::types::InboundMessage, Result};

/// One inbound event as seen by the handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Message(InboundMessage),
    /// The webhook body could not be read or decoded.
    Malformed,
}

impl Delivery {
    pub fn into_message(self) -> Option<InboundMessage> {
        match self {
            Delivery::Message(m) => Some(m),
            Delivery::Malformed => None,
        }
    }
}

struct Handoff {
    delivery: Delivery,
    taken: oneshot::Sender<()>,
}

/// Producing end; cloned into every request handler.
#[derive(Clone)]
pub struct DeliverySender {
    tx: mpsc::Sender<Handoff>,
}

/// Consuming end; owned by the single handler task.
pub struct DeliveryReceiver {
    rx: mpsc::Receiver<Handoff>,
}

pub fn delivery_channel() -> (DeliverySender, DeliveryReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (DeliverySender { tx }, DeliveryReceiver { rx })
}

impl DeliverySender {
    /// Hand `delivery` to the consumer and wait until it has been taken.
    pub async fn deliver(&self, delivery: Delivery) -> Result<()> {
        let (taken, ack) = oneshot::channel();
        self.tx
            .send(Handoff { delivery, taken })
            .await
            .map_err(|_| Error::External("delivery handler is gone".to_string()))?;
        ack.await
            .map_err(|_| Error::External("delivery handler dropped the event".to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl DeliveryReceiver {
    /// Next event, or `None` once every sender is gone (shutdown).
    pub async fn recv(&mut self) -> Option<Delivery> {
        let handoff = self.rx.recv().await?;
        Some(Self::take(handoff))
    }

    /// Blocking variant for handlers running on a dedicated OS thread.
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<Delivery> {
        let handoff = self.rx.blocking_recv()?;
        Some(Self::take(handoff))
    }

    fn take(handoff: Handoff) -> Delivery {
        // The producer may have been cancelled meanwhile; nothing to tell it then.
        let _ = handoff.taken.send(());
        handoff.delivery
    }
}
