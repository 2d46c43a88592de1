//! Domain types for fingerprint prediction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Feature-generation script, relative to the framework directory.
pub const FEATURES_SCRIPT: &str = "grover/scripts/save_features.py";

/// Fingerprint-inference entry point, relative to the framework directory.
pub const FINGERPRINT_SCRIPT: &str = "grover/main.py";

/// Checkpoint file consumed by the inference step, inside the checkpoints directory.
pub const CHECKPOINT_FILE: &str = "grover_large.pt";

/// Location of the external framework and its trained weights.
///
/// Both paths are expected to be absolute once a runner is built from a
/// bundle. Nothing is checked on construction; see [`ModelConfig::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// GROVER installation (contains `grover/main.py`)
    pub framework_dir: PathBuf,
    /// Directory holding `grover_large.pt`
    pub checkpoints_dir: PathBuf,
}

impl ModelConfig {
    /// Create a config from the two directories.
    pub fn new(framework_dir: impl Into<PathBuf>, checkpoints_dir: impl Into<PathBuf>) -> Self {
        Self {
            framework_dir: framework_dir.into(),
            checkpoints_dir: checkpoints_dir.into(),
        }
    }

    pub fn features_script(&self) -> PathBuf {
        self.framework_dir.join(FEATURES_SCRIPT)
    }

    pub fn fingerprint_script(&self) -> PathBuf {
        self.framework_dir.join(FINGERPRINT_SCRIPT)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoints_dir.join(CHECKPOINT_FILE)
    }

    /// Check that the two scripts and the checkpoint file are present.
    ///
    /// The runner never calls this itself; a missing file otherwise only
    /// shows up when the external process fails to find it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPaths`] listing every absent path.
    pub fn verify(&self) -> Result<(), ConfigError> {
        let missing: Vec<PathBuf> = [
            self.features_script(),
            self.fingerprint_script(),
            self.checkpoint_path(),
        ]
        .into_iter()
        .filter(|p| !p.is_file())
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingPaths(missing))
        }
    }
}

/// Configuration problems detected before running the framework.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required framework or checkpoint files are absent
    #[error("missing required path(s): {}", join_paths(.0))]
    MissingPaths(Vec<PathBuf>),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fingerprint of one molecule, in input order.
///
/// Serialises as `{"fingerprint": [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintResult {
    pub fingerprint: Vec<f64>,
}

impl FingerprintResult {
    pub fn new(fingerprint: Vec<f64>) -> Self {
        Self { fingerprint }
    }

    /// Vector length as produced by the external model.
    pub fn dim(&self) -> usize {
        self.fingerprint.len()
    }
}

impl From<Vec<f64>> for FingerprintResult {
    fn from(fingerprint: Vec<f64>) -> Self {
        Self { fingerprint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_resolve_under_dirs() {
        let config = ModelConfig::new("/opt/grover", "/opt/ckpt");
        assert_eq!(
            config.features_script(),
            PathBuf::from("/opt/grover/grover/scripts/save_features.py")
        );
        assert_eq!(config.fingerprint_script(), PathBuf::from("/opt/grover/grover/main.py"));
        assert_eq!(config.checkpoint_path(), PathBuf::from("/opt/ckpt/grover_large.pt"));
    }

    #[test]
    fn test_fingerprint_result_wire_shape() {
        let result = FingerprintResult::new(vec![0.5, 1.0]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({ "fingerprint": [0.5, 1.0] }));
        assert_eq!(result.dim(), 2);
    }
}
