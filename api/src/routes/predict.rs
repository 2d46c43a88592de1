//! Fingerprint prediction endpoint.
//!
//! Wire format:
//!
//! ```text
//! request:  [[{"input": "CCO"}, {"input": "c1ccccc1"}], ...ignored]
//! response: [[{"fingerprint": [..]}, {"fingerprint": [..]}]]
//! ```
//!
//! Only the first element of the outer array is the batch. Any further
//! elements are neither read nor validated.

use async_trait::async_trait;
use axum::http::Method;
use common::FingerprintResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::route_trait::{validators::StringField, RouteHandler, RouteMetadata};

/// Field every molecule record must carry.
pub const INPUT_FIELD: &str = "input";

/// Outer request array; element 0 is the batch of `{"input": SMILES}` records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Vec<Vec<Object>>)]
pub struct PredictRequest(pub Vec<serde_json::Value>);

impl PredictRequest {
    /// SMILES strings of the first batch, in order.
    ///
    /// # Errors
    ///
    /// `BadRequest` for an empty outer array or a batch that is not an array,
    /// `ValidationError` on field `input` for a record without a string `input`.
    pub fn molecules(&self) -> ApiResult<Vec<String>> {
        let batch = self
            .0
            .first()
            .ok_or_else(|| ApiError::BadRequest("request must contain at least one batch".into()))?;

        let records = batch
            .as_array()
            .ok_or_else(|| ApiError::BadRequest("batch must be an array of records".into()))?;

        records
            .iter()
            .map(|record| StringField(INPUT_FIELD).extract(record).map(str::to_string))
            .collect()
    }
}

/// Single-element outer array wrapping one result per input molecule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Vec<Vec<Object>>)]
pub struct PredictResponse(pub Vec<Vec<FingerprintResult>>);

/// Prediction route handler.
///
/// Runs the whole batch through the fingerprint backend. Any backend failure
/// fails the request; partial results are never returned.
pub struct PredictRoute;

#[async_trait]
impl RouteHandler for PredictRoute {
    type Request = PredictRequest;
    type Response = PredictResponse;

    fn metadata() -> RouteMetadata {
        RouteMetadata {
            path: "/predict",
            method: Method::POST,
            tags: &["Fingerprints"],
            description: "Compute one GROVER fingerprint per input SMILES string",
        }
    }

    async fn validate_request(req: &Self::Request) -> ApiResult<()> {
        req.molecules().map(|_| ())
    }

    async fn handle<S>(req: Self::Request, state: &S) -> ApiResult<Self::Response>
    where
        S: common::FingerprintProvider + Send + Sync,
    {
        let request_id = uuid::Uuid::new_v4();
        let molecules = req.molecules()?;
        let count = molecules.len();

        tracing::info!(
            request_id = %request_id,
            molecules = count,
            ignored_batches = req.0.len().saturating_sub(1),
            "Prediction request received"
        );

        let results = state.predict(molecules).await.map_err(|e| {
            tracing::error!(request_id = %request_id, molecules = count, error = %e, "Prediction failed");
            ApiError::from(e)
        })?;

        tracing::info!(
            request_id = %request_id,
            molecules = results.len(),
            dim = results.first().map(FingerprintResult::dim).unwrap_or(0),
            "Prediction successful"
        );

        Ok(PredictResponse(vec![results]))
    }
}
