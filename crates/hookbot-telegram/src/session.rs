use std::{
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hookbot_core::{
    config::SessionConfig,
    domain::ChatId,
    errors::{Error, SendError},
    messaging::{
        delivery::{delivery_channel, DeliveryReceiver},
        port::MessagingPort,
    },
    Result,
};

use crate::{sender::TelegramSender, webhook};

/// How long in-flight webhook requests get to finish on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Caller-supplied, long-lived consumer of inbound updates.
///
/// `run` is started once per [`Session::serve`] on its own task. It owns the
/// receiving end of the delivery channel and typically loops on `recv()` until
/// it returns `None`.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn run(&self, inbox: DeliveryReceiver, session: Session);
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(DeliveryReceiver, Session) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(&self, inbox: DeliveryReceiver, session: Session) {
        (self)(inbox, session).await
    }
}

/// One webhook session: configuration, outbound client and handler.
///
/// Cheap to clone; the handler receives a clone so it can reply through
/// [`Session::send_message`].
#[derive(Clone)]
pub struct Session {
    config: Arc<SessionConfig>,
    sender: TelegramSender,
    handler: Arc<dyn Handler>,
    serving: Arc<AtomicBool>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("serving", &self.serving.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(config: SessionConfig, handler: impl Handler) -> Result<Self> {
        config.validate()?;
        let sender = TelegramSender::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            sender,
            handler: Arc::new(handler),
            serving: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Serve the webhook over HTTPS until the listener fails.
    ///
    /// Blocks for the life of the process on success.
    pub async fn serve(&self) -> Result<()> {
        self.serve_until(CancellationToken::new()).await
    }

    /// Like [`Session::serve`], but returns `Ok(())` once `shutdown` is cancelled.
    ///
    /// On return the delivery channel is closed, so the handler's `recv()`
    /// yields `None` after any in-flight update.
    pub async fn serve_until(&self, shutdown: CancellationToken) -> Result<()> {
        if self.serving.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyServing);
        }
        let addr = self.config.listen_addr()?;

        let (inbox_tx, inbox_rx) = delivery_channel();
        let handler = self.handler.clone();
        let snapshot = self.clone();
        tokio::spawn(async move {
            info!("handler task started");
            handler.run(inbox_rx, snapshot).await;
            info!("handler task exited");
        });

        let app = webhook::router(&self.config.local_path, inbox_tx);

        // Both ring and aws-lc-rs may be compiled in; pin ring.
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }
        let tls = RustlsConfig::from_pem_file(&self.config.cert_path, &self.config.key_path)
            .await
            .map_err(|source| Error::Tls {
                cert: self.config.cert_path.clone(),
                key: self.config.key_path.clone(),
                source,
            })?;

        let handle = Handle::new();
        let watcher = {
            let handle = handle.clone();
            tokio::spawn(async move {
                shutdown.cancelled().await;
                info!("shutdown requested");
                handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
            })
        };

        info!(%addr, path = %self.config.local_path, "webhook listener starting");
        let served = axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await;
        watcher.abort();

        served.map_err(|source| Error::Listener { addr, source })?;
        info!(%addr, "webhook listener stopped");
        Ok(())
    }

    /// Send `text` as Markdown to `chat_id`. See [`TelegramSender::send_message`].
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
    ) -> std::result::Result<(), SendError> {
        self.sender.send_message(chat_id, text).await
    }
}

#[async_trait]
impl MessagingPort for Session {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        Session::send_message(self, chat_id, text)
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn idle(mut inbox: DeliveryReceiver, _session: Session) {
        while inbox.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let cfg = SessionConfig::new("https://api.example/bot1/", "no-slash", 8443, "c", "k");
        let err = Session::new(cfg, idle).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn clones_share_config() {
        let cfg = SessionConfig::new("https://api.example/bot1/", "/hook", 8443, "c", "k");
        let session = Session::new(cfg.clone(), idle).unwrap();
        let snapshot = session.clone();
        assert_eq!(snapshot.config(), &cfg);
        assert!(format!("{snapshot:?}").contains("/hook"));
    }
}
