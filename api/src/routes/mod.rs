//! API route handlers.

pub mod health;
pub mod predict;

use utoipa::OpenApi;

/// OpenAPI documentation for all routes.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GROVER Fingerprint API",
        version = "1.0.0",
        description = "Molecular fingerprints from SMILES strings via the GROVER framework",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    paths(),
    components(schemas(
        health::HealthResponse,
        predict::PredictRequest,
        predict::PredictResponse,
        crate::error::ProblemDetails,
    ))
)]
pub struct ApiDoc;
