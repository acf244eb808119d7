use std::{net::SocketAddr, path::PathBuf};

/// Core error type for the webhook adapter.
///
/// Adapter crates map their specific failures into this type so the embedding
/// application can handle startup and delivery problems in one place.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to load TLS material (cert {cert}, key {key}): {source}")]
    Tls {
        cert: PathBuf,
        key: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("webhook listener on {addr} failed: {source}")]
    Listener {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Send(#[from] SendError),

    #[error("session is already serving")]
    AlreadyServing,

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single outbound `sendMessage` call.
///
/// One variant per stage of the request; none of them are retried here.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("request failed in request building stage: {0}")]
    Build(#[source] BoxError),

    #[error("request failed in transit to the provider: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request failed in response reading stage: {0}")]
    ResponseRead(#[source] reqwest::Error),

    #[error("request failed with HTTP status {status}")]
    Status { status: u16, body: String },
}

/// Fieldless discriminant of [`SendError`], handy for matching and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendErrorKind {
    Build,
    Transport,
    ResponseRead,
    Status,
}

impl SendError {
    pub fn kind(&self) -> SendErrorKind {
        match self {
            SendError::Build(_) => SendErrorKind::Build,
            SendError::Transport(_) => SendErrorKind::Transport,
            SendError::ResponseRead(_) => SendErrorKind::ResponseRead,
            SendError::Status { .. } => SendErrorKind::Status,
        }
    }

    /// HTTP status returned by the provider, for [`SendError::Status`] only.
    pub fn status(&self) -> Option<u16> {
        match self {
            SendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn build(e: impl Into<BoxError>) -> Self {
        SendError::Build(e.into())
    }
}

impl From<serde_json::Error> for SendError {
    fn from(e: serde_json::Error) -> Self {
        SendError::build(e)
    }
}
