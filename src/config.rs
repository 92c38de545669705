//! Configuration types for docdb-eval

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for [`QueryExecutor`](crate::executor::QueryExecutor)
///
/// All fields have sensible defaults; only `server_url` and `credentials`
/// typically need to be set for a secured endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the evaluation server (default: "http://localhost:8000")
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Credentials for the digest handshake (None = unauthenticated)
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Timeout for buffered small-result requests (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Timeout for streamed requests (default: 300 seconds)
    ///
    /// Larger than `request_timeout` because bodies destined for disk can run
    /// to hundreds of megabytes.
    #[serde(default = "default_stream_timeout", with = "duration_serde")]
    pub stream_timeout: Duration,

    /// Root directory for streamed result directories (default: "./stream-results")
    #[serde(default = "default_stream_dir")]
    pub stream_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            credentials: None,
            request_timeout: default_request_timeout(),
            stream_timeout: default_stream_timeout(),
            stream_dir: default_stream_dir(),
        }
    }
}

/// Username and password for the digest handshake
///
/// The `Debug` impl redacts the password so credential-bearing structs can
/// appear in tracing output without leaking secrets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account username
    pub username: String,

    /// Account password; never logged, never sent in the clear
    pub password: String,
}

impl Credentials {
    /// Create credentials from username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_stream_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_stream_dir() -> PathBuf {
    PathBuf::from("./stream-results")
}

// Duration serialization helper (seconds as u64)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
