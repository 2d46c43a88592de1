//! The GROVER fingerprint pipeline.
//!
//! One call to [`GroverRunner::predict`]:
//!
//! 1. creates a fresh scratch directory,
//! 2. stages `data.csv` (header `smiles`, one molecule per row),
//! 3. runs feature extraction and then fingerprint inference as two external
//!    processes, both writing to `run.log`,
//! 4. reads array `fps` from `pred.npz`, one row per molecule.
//!
//! Everything is blocking. There is no timeout on the external processes.

use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use common::{FingerprintResult, ModelConfig};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::{RunnerError, RunnerResult};
use crate::npz;

pub const DATA_FILE: &str = "data.csv";
pub const FEATURES_FILE: &str = "features.npz";
pub const PRED_FILE: &str = "pred.npz";
pub const LOG_FILE: &str = "run.log";

/// Header of the staged input file.
pub const SMILES_COLUMN: &str = "smiles";

/// Key of the fingerprint array inside `pred.npz`.
pub const OUTPUT_ARRAY: &str = "fps";

const SCRATCH_PREFIX: &str = "grover-";
const LOG_TAIL_BYTES: u64 = 2048;

/// How the runner invokes the framework and manages scratch space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Program used to run the framework's Python scripts.
    ///
    /// Default: `python`
    pub interpreter: String,

    /// Parent directory for per-call scratch directories.
    ///
    /// Default: the system temp directory
    pub scratch_root: Option<PathBuf>,

    /// Leave scratch directories (inputs, outputs, `run.log`) behind after
    /// each call. When false they are removed on every exit path.
    ///
    /// Default: true
    pub keep_scratch: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            interpreter: "python".to_string(),
            scratch_root: None,
            keep_scratch: true,
        }
    }
}

/// The two external steps of one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// `save_features.py`: normalized RDKit 2D descriptors
    Features,
    /// `main.py fingerprint`: GROVER fingerprints
    Fingerprint,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Features => write!(f, "feature extraction"),
            Self::Fingerprint => write!(f, "fingerprint inference"),
        }
    }
}

/// Files used by one prediction call, all inside the scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchPaths {
    pub dir: PathBuf,
    pub data: PathBuf,
    pub features: PathBuf,
    pub pred: PathBuf,
    pub log: PathBuf,
}

impl ScratchPaths {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            data: dir.join(DATA_FILE),
            features: dir.join(FEATURES_FILE),
            pred: dir.join(PRED_FILE),
            log: dir.join(LOG_FILE),
        }
    }
}

/// One external command as an argument vector (never passed through a shell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub step: PipelineStep,
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// Build the feature-extraction and fingerprint-inference commands.
///
/// Flag names and the checkpoint file name are part of the framework's
/// command-line contract and must not change.
pub fn pipeline_commands(
    config: &ModelConfig,
    interpreter: &str,
    paths: &ScratchPaths,
) -> [Invocation; 2] {
    let features = Invocation {
        step: PipelineStep::Features,
        program: interpreter.to_string(),
        args: vec![
            config.features_script().into(),
            "--data_path".into(),
            paths.data.clone().into(),
            "--save_path".into(),
            paths.features.clone().into(),
            "--features_generator".into(),
            "rdkit_2d_normalized".into(),
            "--restart".into(),
        ],
    };

    let fingerprint = Invocation {
        step: PipelineStep::Fingerprint,
        program: interpreter.to_string(),
        args: vec![
            config.fingerprint_script().into(),
            "fingerprint".into(),
            "--data_path".into(),
            paths.data.clone().into(),
            "--features_path".into(),
            paths.features.clone().into(),
            "--checkpoint_path".into(),
            config.checkpoint_path().into(),
            "--fingerprint_source".into(),
            "both".into(),
            "--output".into(),
            paths.pred.clone().into(),
            "--no_cuda".into(),
        ],
    };

    [features, fingerprint]
}

#[cfg(windows)]
fn line_terminator() -> csv::Terminator {
    csv::Terminator::CRLF
}

#[cfg(not(windows))]
fn line_terminator() -> csv::Terminator {
    csv::Terminator::Any(b'\n')
}

/// Write the input file: header `smiles`, then one row per molecule in order.
pub fn stage_inputs(path: &Path, molecules: &[String]) -> RunnerResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(line_terminator())
        .from_path(path)?;

    writer.write_record([SMILES_COLUMN])?;
    for smiles in molecules {
        writer.write_record([smiles.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Scratch directory for one call, either kept or removed on drop.
enum Scratch {
    Kept(PathBuf),
    Scoped(TempDir),
}

impl Scratch {
    fn path(&self) -> &Path {
        match self {
            Self::Kept(path) => path,
            Self::Scoped(dir) => dir.path(),
        }
    }
}

/// Runs the external GROVER framework to compute molecular fingerprints.
///
/// Holds only read-only configuration, so clones are cheap and can be moved
/// onto blocking worker threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroverRunner {
    config: ModelConfig,
    settings: RunnerSettings,
}

impl GroverRunner {
    /// Create a runner with default settings.
    pub fn new(config: ModelConfig) -> Self {
        Self::with_settings(config, RunnerSettings::default())
    }

    pub fn with_settings(config: ModelConfig, settings: RunnerSettings) -> Self {
        Self { config, settings }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: RunnerSettings) {
        self.settings = settings;
    }

    /// Point the runner at a different checkpoints directory (made absolute).
    pub fn set_checkpoints_dir(&mut self, dir: impl AsRef<Path>) -> std::io::Result<()> {
        self.config.checkpoints_dir = std::path::absolute(dir)?;
        Ok(())
    }

    /// Point the runner at a different framework directory (made absolute).
    pub fn set_framework_dir(&mut self, dir: impl AsRef<Path>) -> std::io::Result<()> {
        self.config.framework_dir = std::path::absolute(dir)?;
        Ok(())
    }

    /// Compute one fingerprint per molecule, in input order.
    ///
    /// An empty input still runs the framework on a header-only file; what
    /// the framework does with zero rows is up to it.
    ///
    /// # Errors
    ///
    /// Any failure aborts the whole batch: scratch or staging I/O, a process
    /// that cannot start or exits unsuccessfully, an unreadable output array,
    /// or a row count that differs from `molecules.len()`.
    pub fn predict(&self, molecules: &[String]) -> RunnerResult<Vec<FingerprintResult>> {
        let scratch = self.acquire_scratch()?;
        let paths = ScratchPaths::new(scratch.path());

        info!(
            molecules = molecules.len(),
            scratch = %paths.dir.display(),
            "Running GROVER fingerprint pipeline"
        );

        stage_inputs(&paths.data, molecules)?;

        let log = File::create(&paths.log)?;
        for invocation in pipeline_commands(&self.config, &self.settings.interpreter, &paths) {
            run_step(&invocation, &log, &paths.log)?;
        }

        let array = npz::read_array2(&paths.pred, OUTPUT_ARRAY)?;
        if array.nrows() != molecules.len() {
            warn!(
                expected = molecules.len(),
                actual = array.nrows(),
                scratch = %paths.dir.display(),
                "Fingerprint row count does not match input"
            );
            return Err(RunnerError::RowCountMismatch {
                expected: molecules.len(),
                actual: array.nrows(),
            });
        }

        let results: Vec<FingerprintResult> = array
            .outer_iter()
            .map(|row| FingerprintResult::new(row.to_vec()))
            .collect();

        info!(
            molecules = results.len(),
            dim = array.ncols(),
            "GROVER fingerprints computed"
        );

        Ok(results)
    }

    fn acquire_scratch(&self) -> RunnerResult<Scratch> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match &self.settings.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(RunnerError::Scratch)?;

        if self.settings.keep_scratch {
            Ok(Scratch::Kept(dir.keep()))
        } else {
            Ok(Scratch::Scoped(dir))
        }
    }
}

/// Run one step to completion with stdout and stderr appended to the log.
fn run_step(invocation: &Invocation, log: &File, log_path: &Path) -> RunnerResult<()> {
    debug!(step = %invocation.step, program = %invocation.program, args = ?invocation.args, "Starting step");

    let status = invocation
        .command()
        .stdin(Stdio::null())
        .stdout(Stdio::from(log.try_clone()?))
        .stderr(Stdio::from(log.try_clone()?))
        .status()
        .map_err(|source| RunnerError::Spawn {
            step: invocation.step,
            program: invocation.program.clone(),
            source,
        })?;

    if !status.success() {
        warn!(step = %invocation.step, %status, log = %log_path.display(), "Step failed");
        return Err(RunnerError::StepFailed {
            step: invocation.step,
            status,
            log: log_path.to_path_buf(),
            tail: read_tail(log_path),
        });
    }

    debug!(step = %invocation.step, "Step finished");
    Ok(())
}

/// Last few KiB of the log, for error messages (the log may be deleted).
fn read_tail(path: &Path) -> String {
    let read = || -> std::io::Result<String> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        file.seek(SeekFrom::Start(len.saturating_sub(LOG_TAIL_BYTES)))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).trim_end().to_string())
    };
    read().unwrap_or_default()
}
