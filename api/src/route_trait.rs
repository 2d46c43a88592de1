//! Route handler trait.
//!
//! Every route declares its metadata, validates its request before touching
//! the backend, and reports failures as [`ApiError`]. Registration is shared,
//! so JSON extraction and rejection mapping behave the same on every route.

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::http::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Route metadata.
#[derive(Debug, Clone)]
pub struct RouteMetadata {
    /// HTTP path (e.g., "/predict")
    pub path: &'static str,
    /// HTTP method
    pub method: Method,
    /// OpenAPI tags for grouping
    pub tags: &'static [&'static str],
    /// Description for documentation
    pub description: &'static str,
}

impl RouteMetadata {
    /// Check the metadata is complete enough to register.
    pub fn check(&self) -> Result<(), String> {
        if self.path.is_empty() {
            return Err("route has empty path".to_string());
        }
        if self.description.is_empty() {
            return Err(format!("route {} has empty description", self.path));
        }
        Ok(())
    }
}

/// Route handler trait - every route implements this.
///
/// `validate_request` always runs before `handle`, so a rejected request
/// never reaches the fingerprint backend.
#[async_trait]
pub trait RouteHandler: Send + Sync + 'static {
    /// Request type. GET routes receive `Default::default()`.
    type Request: DeserializeOwned + Debug + Default + Send + Sync + 'static;

    /// Response type
    type Response: Serialize + Debug + Send + Sync + 'static;

    /// Provide route metadata
    fn metadata() -> RouteMetadata;

    /// Validate the request shape; return `ApiError::ValidationError` for
    /// field-level problems.
    async fn validate_request(req: &Self::Request) -> ApiResult<()>;

    /// Handle the request.
    ///
    /// Generates a request id, logs start and end, and logs failures with
    /// the same id before returning them.
    async fn handle<S>(req: Self::Request, state: &S) -> ApiResult<Self::Response>
    where
        S: common::FingerprintProvider + Send + Sync;
}

/// Route registration - auto-implemented for all [`RouteHandler`]s.
pub trait RegisterableRoute: RouteHandler {
    /// Register this route with the Axum router.
    fn register(router: axum::Router<AppState>) -> axum::Router<AppState> {
        let metadata = Self::metadata();
        if let Err(reason) = metadata.check() {
            tracing::error!(path = metadata.path, %reason, "Route not registered");
            return router;
        }
        tracing::debug!(
            path = metadata.path,
            method = %metadata.method,
            tags = ?metadata.tags,
            description = metadata.description,
            "Registering route"
        );

        match metadata.method {
            Method::GET => {
                let handler = |axum::extract::State(state): axum::extract::State<AppState>| async move {
                    let req = Self::Request::default();
                    Self::validate_request(&req).await?;
                    let response = Self::handle(req, &state).await?;
                    Ok::<_, ApiError>(axum::Json(response))
                };
                router.route(metadata.path, axum::routing::get(handler))
            }
            Method::POST => {
                let handler = |axum::extract::State(state): axum::extract::State<AppState>,
                               body: Result<axum::Json<Self::Request>, JsonRejection>| async move {
                    let axum::Json(req) = body?;
                    Self::validate_request(&req).await?;
                    let response = Self::handle(req, &state).await?;
                    Ok::<_, ApiError>(axum::Json(response))
                };
                router.route(metadata.path, axum::routing::post(handler))
            }
            other => {
                tracing::warn!(path = metadata.path, method = %other, "Unsupported method; route not registered");
                router
            }
        }
    }
}

impl<T: RouteHandler> RegisterableRoute for T {}

fn field_error(field: &str, message: String) -> ApiError {
    ApiError::ValidationError {
        field: field.to_string(),
        message,
        request_id: Some(uuid::Uuid::new_v4().to_string()),
    }
}

/// Field validators shared by request types.
pub mod validators {
    use super::*;

    /// A JSON object field that must hold a string
    pub struct StringField(pub &'static str);

    impl StringField {
        /// The string under `key`, or a `ValidationError` naming `key`.
        pub fn extract<'a>(&self, target: &'a serde_json::Value) -> ApiResult<&'a str> {
            match target.get(self.0) {
                Some(serde_json::Value::String(s)) => Ok(s.as_str()),
                Some(_) => Err(field_error(self.0, format!("'{}' must be a string", self.0))),
                None => Err(field_error(self.0, format!("record has no '{}' field", self.0))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validators::*;
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use common::{FingerprintProvider, FingerprintResult, ProviderError};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct NoModel;

    #[async_trait]
    impl FingerprintProvider for NoModel {
        async fn predict(&self, _molecules: Vec<String>) -> Result<Vec<FingerprintResult>, ProviderError> {
            Ok(Vec::new())
        }
    }

    #[derive(Debug, Default, serde::Deserialize)]
    struct Empty;

    struct Undocumented;

    #[async_trait]
    impl RouteHandler for Undocumented {
        type Request = Empty;
        type Response = String;

        fn metadata() -> RouteMetadata {
            RouteMetadata {
                path: "/undocumented",
                method: Method::GET,
                tags: &[],
                description: "",
            }
        }

        async fn validate_request(_req: &Self::Request) -> ApiResult<()> {
            Ok(())
        }

        async fn handle<S>(_req: Self::Request, _state: &S) -> ApiResult<Self::Response>
        where
            S: common::FingerprintProvider + Send + Sync,
        {
            Ok("reached".to_string())
        }
    }

    #[test]
    fn test_metadata_check() {
        let meta = RouteMetadata {
            path: "/predict",
            method: Method::POST,
            tags: &["Fingerprints"],
            description: "",
        };
        assert!(meta.check().unwrap_err().contains("/predict"));

        let meta = RouteMetadata { path: "", description: "x", ..meta };
        assert!(meta.check().is_err());
    }

    #[tokio::test]
    async fn test_undocumented_route_is_not_registered() {
        let state: AppState = Arc::new(NoModel);
        let app = Undocumented::register(axum::Router::new()).with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/undocumented").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_extract_returns_the_string() {
        let record = json!({"input": "c1ccccc1", "id": 3});
        assert_eq!(StringField("input").extract(&record).unwrap(), "c1ccccc1");

        let err = StringField("input").extract(&json!({"input": null})).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { ref field, .. } if field == "input"));
    }

    #[test]
    fn test_extract_rejects_missing_and_non_string() {
        let rule = StringField("input");
        for record in [json!({"input": 5}), json!({"smiles": "CCO"}), json!("CCO")] {
            match rule.extract(&record).unwrap_err() {
                ApiError::ValidationError { field, request_id, .. } => {
                    assert_eq!(field, "input");
                    assert!(request_id.is_some());
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
