use hookbot_core::config::SessionConfig;
use hookbot_telegram::Session;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod echo;

#[tokio::main]
async fn main() -> Result<(), hookbot_core::Error> {
    hookbot_core::logging::init("hookbot")?;

    let cfg = SessionConfig::from_env()?;
    info!(
        path = %cfg.local_path,
        port = cfg.port,
        "starting webhook session"
    );

    let session = Session::new(cfg, echo::run)?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("ctrl-c received"),
                Err(e) => warn!("failed to listen for ctrl-c: {e}"),
            }
            shutdown.cancel();
        });
    }

    session.serve_until(shutdown).await
}
