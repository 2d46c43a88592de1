//! CORS middleware configuration.

use crate::config::ApiConfig;
use tower_http::cors::{Any, CorsLayer};

/// Create CORS layer from configuration.
///
/// A disabled config yields a layer that adds no CORS headers.
pub fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if !config.enable_cors {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        cors.allow_origin(origins)
    }
}
