// Presence server configuration.
//
// Centralizes environment variable parsing with defaults for local
// development. The CORS layer reads its own env var; this module
// covers the core server settings.

use std::net::SocketAddr;

use url::Url;

/// Core presence server configuration.
///
/// Constructed via [`PresenceConfig::from_env`] which reads environment
/// variables and falls back to sensible development defaults.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Listen address (host:port).
    pub listen_addr: SocketAddr,
    /// Base URL of the identity service that verifies collaboration
    /// credentials. Absence is reported to clients at handshake time
    /// as `SERVER_CONFIG_ERROR`, not at startup.
    pub auth_base_url: Option<Url>,
    /// Log filter directive (e.g. `info`, `tessera_presence=debug`).
    pub log_filter: String,
}

impl PresenceConfig {
    /// Parse configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `TESSERA_PRESENCE_HOST` | `0.0.0.0` |
    /// | `TESSERA_PRESENCE_PORT` | `8080` |
    /// | `TESSERA_PRESENCE_AUTH_BASE_URL` | *(none)* |
    /// | `TESSERA_PRESENCE_LOG_FILTER` | `info` |
    pub fn from_env() -> Self {
        Self::from_env_fn(|key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    fn from_env_fn<F>(env: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let host = env("TESSERA_PRESENCE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env("TESSERA_PRESENCE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let listen_addr = format!("{host}:{port}")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));

        // An unparseable URL is as unusable as a missing one; both
        // surface as SERVER_CONFIG_ERROR when a client connects.
        let auth_base_url = env("TESSERA_PRESENCE_AUTH_BASE_URL")
            .ok()
            .and_then(|v| Url::parse(&v).ok());

        let log_filter =
            env("TESSERA_PRESENCE_LOG_FILTER").unwrap_or_else(|_| "info".into());

        Self { listen_addr, auth_base_url, log_filter }
    }
}
