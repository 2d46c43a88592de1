//! Backend trait shared by every entry point.
//!
//! The HTTP layer (and the one-shot CLI) never talks to the runner directly;
//! it calls a `FingerprintProvider`. This keeps transports testable with a
//! stub provider and keeps subprocess details inside `grover-runner`.
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐
//! │   API    │   │ CLI predict │
//! └────┬─────┘   └──────┬──────┘
//!      └───────┬────────┘
//!              ▼
//!   ┌──────────────────────┐
//!   │ FingerprintProvider  │
//!   │ predict(molecules)   │
//!   └──────────┬───────────┘
//!              ▼
//!   ┌──────────────────────┐
//!   │ GroverRunner         │
//!   │ (external framework) │
//!   └──────────────────────┘
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::models::FingerprintResult;

/// Errors a provider reports back to the transport layer.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The prediction pipeline failed (I/O, subprocess, output parsing)
    #[error("prediction failed: {0}")]
    Failed(String),

    /// The model produced a different number of rows than molecules submitted
    #[error("model returned {actual} fingerprints for {expected} molecules")]
    OutputMismatch { expected: usize, actual: usize },

    /// The blocking worker running the pipeline did not complete
    #[error("worker task failed: {0}")]
    Join(String),
}

/// Fingerprint backend used by all transports.
///
/// Implementations must return exactly one result per molecule, in input
/// order, or an error. Partial results are never returned.
#[async_trait]
pub trait FingerprintProvider: Send + Sync + 'static {
    /// Compute one fingerprint per SMILES string.
    async fn predict(&self, molecules: Vec<String>) -> Result<Vec<FingerprintResult>, ProviderError>;
}

/// Allows `Arc<dyn FingerprintProvider>` to be used as a concrete state type.
#[async_trait]
impl FingerprintProvider for std::sync::Arc<dyn FingerprintProvider> {
    async fn predict(&self, molecules: Vec<String>) -> Result<Vec<FingerprintResult>, ProviderError> {
        (**self).predict(molecules).await
    }
}
