//! Health check endpoint.

use async_trait::async_trait;
use axum::http::Method;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiResult;
use crate::route_trait::{RouteHandler, RouteMetadata};

/// Health check request (empty for GET endpoint).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HealthRequest;

/// Health check response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service name
    pub service: String,
    /// Version
    pub version: String,
}

/// Health check route handler.
///
/// Reports liveness only; it does not run the model.
pub struct HealthRoute;

#[async_trait]
impl RouteHandler for HealthRoute {
    type Request = HealthRequest;
    type Response = HealthResponse;

    fn metadata() -> RouteMetadata {
        RouteMetadata {
            path: "/health",
            method: Method::GET,
            tags: &["System"],
            description: "Health check endpoint for service monitoring and load balancer probes",
        }
    }

    async fn validate_request(_req: &Self::Request) -> ApiResult<()> {
        Ok(())
    }

    async fn handle<S>(_req: Self::Request, _state: &S) -> ApiResult<Self::Response>
    where
        S: common::FingerprintProvider + Send + Sync,
    {
        let request_id = uuid::Uuid::new_v4();
        tracing::debug!(request_id = %request_id, "Health check request received");

        Ok(HealthResponse {
            status: "ok".to_string(),
            service: "grover-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}
