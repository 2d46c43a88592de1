//! Error types for the runner and bundle packing.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

use crate::npz::NpzError;
use crate::runner::PipelineStep;

/// Errors from a single prediction call. All of them abort the whole batch.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Could not create the per-call scratch directory
    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    /// Could not write the staged input file
    #[error("failed to stage input file: {0}")]
    Staging(#[from] csv::Error),

    /// Generic filesystem error inside the scratch directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The external program could not be started
    #[error("failed to start {step} ({program}): {source}")]
    Spawn {
        step: PipelineStep,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran but exited unsuccessfully
    #[error("{step} exited with {status} (log: {}){}", .log.display(), format_tail(.tail))]
    StepFailed {
        step: PipelineStep,
        status: ExitStatus,
        log: PathBuf,
        tail: String,
    },

    /// The output array is missing or unreadable
    #[error("failed to read model output: {0}")]
    Output(#[from] NpzError),

    /// The model returned a different number of rows than molecules submitted
    #[error("model returned {actual} fingerprints for {expected} molecules")]
    RowCountMismatch { expected: usize, actual: usize },
}

fn format_tail(tail: &str) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!("\n{tail}")
    }
}

impl From<RunnerError> for common::ProviderError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::RowCountMismatch { expected, actual } => {
                common::ProviderError::OutputMismatch { expected, actual }
            }
            other => common::ProviderError::Failed(other.to_string()),
        }
    }
}

/// Errors while saving or loading a model bundle.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// `save` was called before `pack`
    #[error("no model packed into artifact '{0}'")]
    NotPacked(String),

    /// A destination subdirectory already exists and has content
    #[error("destination directory is not empty: {}", .0.display())]
    DestinationNotEmpty(PathBuf),

    /// Copying a dependency directory into the bundle failed
    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest could not be read or written
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Manifest written by an incompatible version
    #[error("unsupported bundle format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type RunnerResult<T> = Result<T, RunnerError>;
pub type ArtifactResult<T> = Result<T, ArtifactError>;
