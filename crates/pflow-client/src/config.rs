use serde::{Deserialize, Serialize};

/// Configuration for the HTTP Remote Client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Engine API root; resource paths are appended to it
    pub base_url: String,

    /// Timeout in seconds for each request
    pub timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 10,
        }
    }
}
