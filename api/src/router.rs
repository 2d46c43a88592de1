//! Router configuration and setup.

use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::ApiConfig, middleware, routes, AppState};

/// Build the application router with all routes and middleware.
///
/// Layers are applied before `.with_state()`, outermost last.
pub fn configure_routes(state: AppState, config: &ApiConfig) -> Router {
    use crate::route_trait::RegisterableRoute;

    let mut router: Router<AppState> = Router::new();
    router = routes::health::HealthRoute::register(router);
    router = routes::predict::PredictRoute::register(router);

    if config.enable_swagger {
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", routes::ApiDoc::openapi()),
        );
    }

    if let Some(limit) = config.max_concurrent_requests {
        tracing::info!(limit, "Limiting concurrent requests");
        router = router.layer(ConcurrencyLimitLayer::new(limit));
    }

    router = router
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(middleware::cors_layer(config));

    router.with_state(state)
}
