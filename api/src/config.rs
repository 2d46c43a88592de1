//! API configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP API server.
///
/// # Example
///
/// ```rust
/// use grover_api::ApiConfig;
///
/// let config = ApiConfig {
///     host: "127.0.0.1".to_string(),
///     port: 8080,
///     enable_cors: true,
///     cors_origins: vec!["*".to_string()],
///     enable_swagger: false,
///     max_concurrent_requests: Some(4),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    ///
    /// Default: `0.0.0.0`
    pub host: String,

    /// Port to bind the HTTP server to.
    ///
    /// Default: 8080
    pub port: u16,

    /// Enable Cross-Origin Resource Sharing (CORS).
    ///
    /// Default: true
    pub enable_cors: bool,

    /// Allowed origins for CORS requests.
    ///
    /// Use `["*"]` to allow all origins.
    ///
    /// Default: `["*"]`
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI documentation.
    ///
    /// When enabled, API docs are available at `/swagger-ui/`.
    ///
    /// Default: true
    pub enable_swagger: bool,

    /// Upper bound on requests handled at the same time.
    ///
    /// Every prediction starts two external processes, so this is the
    /// only admission control the server has. `None` means unlimited.
    ///
    /// Default: `None`
    pub max_concurrent_requests: Option<usize>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            enable_swagger: true,
            max_concurrent_requests: None,
        }
    }
}

impl ApiConfig {
    /// `host:port` as given, for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
