use std::{
    env, fs,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Connection parameters for one webhook session.
///
/// Everything that identifies a bot (API URL, callback path, port, TLS files) is
/// a mandatory constructor argument. Nothing is compiled in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Provider API base, e.g. `https://api.telegram.org/bot<token>/`.
    pub api_url: String,
    /// Local path the provider posts updates to, e.g. `/bot<token>`.
    pub local_path: String,
    pub bind_host: String,
    pub port: u16,
    /// PEM file holding the full certificate chain.
    pub cert_path: PathBuf,
    /// PEM file holding the private key.
    pub key_path: PathBuf,
    /// Hard total timeout for a single outbound request.
    pub send_timeout: Duration,
}

impl SessionConfig {
    pub fn new(
        api_url: impl Into<String>,
        local_path: impl Into<String>,
        port: u16,
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            local_path: local_path.into(),
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port,
            cert_path: cert_path.into(),
            key_path: key_path.into(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_bind_host(mut self, host: impl Into<String>) -> Self {
        self.bind_host = host.into();
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("API URL must not be empty".to_string()));
        }
        if !self.local_path.starts_with('/') {
            return Err(Error::Config(format!(
                "webhook path must start with '/': {:?}",
                self.local_path
            )));
        }
        if let Some(segment) = self
            .local_path
            .split('/')
            .find(|seg| seg.starts_with(':') || seg.starts_with('*') || seg.contains(['{', '}']))
        {
            return Err(Error::Config(format!(
                "webhook path segment {segment:?} would be read as a route parameter"
            )));
        }
        if self.port == 0 {
            return Err(Error::Config("webhook port must not be 0".to_string()));
        }
        if self.send_timeout.is_zero() {
            return Err(Error::Config("send timeout must not be 0".to_string()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_host.trim().parse().map_err(|e| {
            Error::Config(format!("invalid bind host {:?}: {e}", self.bind_host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// `<api_url>/sendMessage`, whether or not the base ends with a slash.
    pub fn send_message_url(&self) -> String {
        format!("{}/sendMessage", self.api_url.trim_end_matches('/'))
    }

    /// Build a config from the process environment (after reading `.env`).
    ///
    /// Embedding binaries may use this; the library never reads the environment
    /// on its own.
    pub fn from_env() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] over an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| var(key).and_then(non_empty);

        let token = get("TELEGRAM_BOT_TOKEN");
        let api_url = get("TELEGRAM_API_URL")
            .or_else(|| token.as_ref().map(|t| format!("{TELEGRAM_API_BASE}/bot{t}/")))
            .ok_or_else(|| {
                Error::Config(
                    "TELEGRAM_API_URL or TELEGRAM_BOT_TOKEN environment variable is required"
                        .to_string(),
                )
            })?;
        let local_path = get("TELEGRAM_WEBHOOK_PATH")
            .or_else(|| token.as_ref().map(|t| format!("/bot{t}")))
            .ok_or_else(|| {
                Error::Config(
                    "TELEGRAM_WEBHOOK_PATH or TELEGRAM_BOT_TOKEN environment variable is required"
                        .to_string(),
                )
            })?;

        let port = get("WEBHOOK_PORT")
            .ok_or_else(|| {
                Error::Config("WEBHOOK_PORT environment variable is required".to_string())
            })?
            .trim()
            .parse::<u16>()
            .map_err(|e| Error::Config(format!("WEBHOOK_PORT is not a valid port: {e}")))?;

        let cert_path = get("TLS_CERT_PATH").map(PathBuf::from).ok_or_else(|| {
            Error::Config("TLS_CERT_PATH environment variable is required".to_string())
        })?;
        let key_path = get("TLS_KEY_PATH").map(PathBuf::from).ok_or_else(|| {
            Error::Config("TLS_KEY_PATH environment variable is required".to_string())
        })?;

        let mut cfg = Self::new(api_url, local_path, port, cert_path, key_path);
        if let Some(host) = get("WEBHOOK_BIND_HOST") {
            cfg = cfg.with_bind_host(host);
        }
        if let Some(ms) = get("SEND_TIMEOUT_MS") {
            let ms = ms.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("SEND_TIMEOUT_MS is not a valid duration: {e}"))
            })?;
            cfg = cfg.with_send_timeout(Duration::from_millis(ms));
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in dotenv_entries(&contents, |k| env::var_os(k).is_some()) {
        env::set_var(key, val);
    }
}

/// `KEY=value` pairs from a `.env` file, minus keys the process already has.
fn dotenv_entries<'a>(
    contents: &'a str,
    already_set: impl Fn(&str) -> bool,
) -> Vec<(&'a str, &'a str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim(), unquote(v.trim())))
        .filter(|(k, _)| !k.is_empty() && !already_set(*k))
        .collect()
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
