//! Webhook receiver: decodes Telegram updates and hands them to the handler.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    routing::post,
    Router,
};
use tracing::{debug, warn};

use hookbot_core::messaging::{
    delivery::{Delivery, DeliverySender},
    types::InboundMessage,
};

#[derive(Clone)]
struct WebhookState {
    inbox: DeliverySender,
}

/// Router serving `POST path`.
///
/// Each request is answered only after the handler has taken the event.
pub fn router(path: &str, inbox: DeliverySender) -> Router {
    Router::new()
        .route(path, post(receive_update))
        .with_state(WebhookState { inbox })
}

async fn receive_update(
    State(state): State<WebhookState>,
    body: Result<Bytes, BytesRejection>,
) -> StatusCode {
    let delivery = decode(body);

    match state.inbox.deliver(delivery).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!("webhook update not delivered: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn decode(body: Result<Bytes, BytesRejection>) -> Delivery {
    let bytes = match body {
        Ok(b) => b,
        Err(e) => {
            warn!("failed to read webhook body: {e}");
            return Delivery::Malformed;
        }
    };

    match serde_json::from_slice::<InboundMessage>(&bytes) {
        Ok(update) => {
            debug!(
                update_id = update.update_id,
                chat_id = update.chat_id().0,
                "webhook update decoded"
            );
            Delivery::Message(update)
        }
        Err(e) => {
            warn!(len = bytes.len(), "malformed webhook body: {e}");
            Delivery::Malformed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use hookbot_core::{
        domain::ChatId,
        messaging::delivery::{delivery_channel, DeliveryReceiver},
    };
    use tokio::task::JoinHandle;
    use tower::ServiceExt;

    const SAMPLE: &str = r#"{"update_id":1,"message":{"message_id":2,"from":{"id":10,"first_name":"A"},"chat":{"id":10,"type":"private"},"date":1000,"text":"hi"}}"#;

    fn collect(mut rx: DeliveryReceiver) -> JoinHandle<Vec<Delivery>> {
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(d) = rx.recv().await {
                seen.push(d);
            }
            seen
        })
    }

    fn post_to(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn delivers_decoded_update() {
        let (tx, rx) = delivery_channel();
        let seen = collect(rx);
        let app = router("/bot123:abc", tx);

        let resp = app
            .clone()
            .oneshot(post_to("/bot123:abc", SAMPLE))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        drop(app);
        let seen = seen.await.unwrap();
        assert_eq!(seen.len(), 1);
        let msg = seen[0].clone().into_message().unwrap();
        assert_eq!(msg.text(), "hi");
        assert_eq!(msg.chat_id(), ChatId(10));
        assert_eq!(msg.update_id, 1);
    }

    #[tokio::test]
    async fn malformed_body_yields_one_marker_per_request() {
        let (tx, rx) = delivery_channel();
        let seen = collect(rx);
        let app = router("/hook", tx);

        for body in ["{not json", "", "[1,2,3]"] {
            let resp = app.clone().oneshot(post_to("/hook", body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        drop(app);
        let seen = seen.await.unwrap();
        assert_eq!(seen, vec![Delivery::Malformed; 3]);
    }

    #[tokio::test]
    async fn sequential_requests_arrive_in_order() {
        let (tx, rx) = delivery_channel();
        let seen = collect(rx);
        let app = router("/hook", tx);

        for id in 1..=3 {
            let body = format!(r#"{{"update_id":{id},"message":{{"text":"m{id}"}}}}"#);
            let resp = app.clone().oneshot(post_to("/hook", body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        drop(app);
        let ids: Vec<i64> = seen
            .await
            .unwrap()
            .into_iter()
            .filter_map(Delivery::into_message)
            .map(|m| m.update_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn other_paths_and_methods_are_not_delivered() {
        let (tx, rx) = delivery_channel();
        let seen = collect(rx);
        let app = router("/hook", tx);

        let resp = app
            .clone()
            .oneshot(post_to("/elsewhere", SAMPLE))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let get = Request::builder()
            .method("GET")
            .uri("/hook")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(get).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

        drop(app);
        assert!(seen.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn departed_handler_is_service_unavailable() {
        let (tx, rx) = delivery_channel();
        drop(rx);
        let app = router("/hook", tx);

        let resp = app.oneshot(post_to("/hook", SAMPLE)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
