use serde::{Deserialize, Serialize};

/// Connection settings for the automation backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend API
    pub base_url: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Optional bearer token
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8765".into(),
            timeout_ms: 30_000,
            api_key: None,
        }
    }
}
