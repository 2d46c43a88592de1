//! GROVER runner - molecular fingerprints via the external GROVER framework.
//!
//! This crate drives an installed GROVER checkout as two child processes
//! (feature extraction, then fingerprint inference) and exposes the result
//! through the [`FingerprintProvider`] trait used by the HTTP layer.
//!
//! # Architecture
//!
//! ```text
//! HTTP handler
//!   ├─▶ FingerprintProvider::predict(molecules)
//!   │     └─▶ spawn_blocking
//!   │           └─▶ GroverRunner::predict
//!   │                 ├─▶ data.csv
//!   │                 ├─▶ python save_features.py  ─▶ features.npz
//!   │                 ├─▶ python main.py fingerprint ─▶ pred.npz
//!   │                 └─▶ read "fps" ─▶ Vec<FingerprintResult>
//!   └─▶ Back to the handler with one fingerprint per molecule
//! ```
//!
//! [`artifact::Artifact`] packs a runner together with copies of its
//! framework and checkpoints directories into a relocatable bundle.
//!
//! # Examples
//!
//! ```rust,no_run
//! use common::ModelConfig;
//! use grover_runner::GroverRunner;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = GroverRunner::new(ModelConfig::new("/opt/grover", "/opt/grover/model"));
//!     let fps = runner.predict(&["CCO".to_string()])?;
//!     println!("Fingerprint dimension: {}", fps[0].dim());
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod error;
pub mod npz;
pub mod runner;

use async_trait::async_trait;
use common::{FingerprintProvider, FingerprintResult, ProviderError};

pub use artifact::{Artifact, BundleManifest, DEFAULT_ARTIFACT_NAME};
pub use error::{ArtifactError, ArtifactResult, RunnerError, RunnerResult};
pub use runner::{GroverRunner, PipelineStep, RunnerSettings};

#[async_trait]
impl FingerprintProvider for GroverRunner {
    async fn predict(&self, molecules: Vec<String>) -> Result<Vec<FingerprintResult>, ProviderError> {
        // The pipeline blocks on two child processes; keep it off the async workers.
        let runner = self.clone();
        tokio::task::spawn_blocking(move || {
            GroverRunner::predict(&runner, &molecules).map_err(ProviderError::from)
        })
        .await
        .map_err(|e| ProviderError::Join(e.to_string()))?
    }
}
