//! GROVER API crate.
//!
//! HTTP layer for the fingerprint service, built on Axum.
//!
//! # Routes
//!
//! - `POST /predict`: `[[{"input": SMILES}, ...]]` to `[[{"fingerprint": [...]}, ...]]`
//! - `GET /health`: liveness
//! - `/swagger-ui/` and `/api-doc/openapi.json` when enabled
//!
//! The backend is any [`FingerprintProvider`]; the server binary passes a
//! `GroverRunner`, tests pass stubs.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use common::{FingerprintProvider, FingerprintResult, ProviderError};
//! use grover_api::{run_server_with_config, ApiConfig};
//!
//! struct Zeros;
//!
//! #[async_trait::async_trait]
//! impl FingerprintProvider for Zeros {
//!     async fn predict(&self, molecules: Vec<String>)
//!         -> Result<Vec<FingerprintResult>, ProviderError>
//!     {
//!         Ok(molecules.iter().map(|_| FingerprintResult::new(vec![0.0; 4])).collect())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server_with_config(Arc::new(Zeros), ApiConfig::default()).await
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod config;
mod error;
mod middleware;
mod router;
pub mod route_trait;
pub mod routes;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ProblemDetails};

use common::FingerprintProvider;
use std::sync::Arc;

/// Concrete router state: the shared fingerprint backend.
pub type AppState = Arc<dyn FingerprintProvider>;

/// Build the full router (routes, middleware, state) without binding a socket.
pub fn build_router(state: AppState, config: &ApiConfig) -> axum::Router {
    router::configure_routes(state, config)
}

/// Run the HTTP API server.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server hits a
/// fatal I/O error.
pub async fn run_server_with_config(state: AppState, config: ApiConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    let addr = listener.local_addr()?;

    tracing::info!("GROVER API server listening on http://{}", addr);
    if config.enable_swagger {
        tracing::info!("Swagger UI:    http://{}/swagger-ui/", addr);
        tracing::info!("OpenAPI Spec:  http://{}/api-doc/openapi.json", addr);
    }

    let app = build_router(state, &config);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
