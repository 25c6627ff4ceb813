use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime configuration for the babgacha server process.
///
/// Built from environment variables; see [`crate::load_app_config`].
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Naver Local Search API credentials. `None` when unset; the nearby
    /// search endpoint answers 503 in that case instead of failing startup.
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub search_timeout_secs: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Returns Naver credentials as a pair, or `None` when either half is
    /// missing. Both headers are required by the upstream API.
    #[must_use]
    pub fn naver_credentials(&self) -> Option<(&str, &str)> {
        match (&self.naver_client_id, &self.naver_client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "naver_client_id",
                &self.naver_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "naver_client_secret",
                &self.naver_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
