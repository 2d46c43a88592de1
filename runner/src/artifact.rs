//! Relocatable model bundles.
//!
//! A bundle is a directory holding everything a runner needs:
//!
//! ```text
//! <root>/
//!   <name>.json      manifest (format version, layout, interpreter)
//!   checkpoints/     copy of the checkpoints directory
//!   framework/       copy of the GROVER installation
//! ```
//!
//! Loading always resolves the two directories next to the manifest, so a
//! bundle can be moved or copied anywhere after it is saved.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use common::ModelConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ArtifactError, ArtifactResult};
use crate::runner::{GroverRunner, RunnerSettings};

pub const CHECKPOINTS_BASEDIR: &str = "checkpoints";
pub const FRAMEWORK_BASEDIR: &str = "framework";
pub const MANIFEST_EXTENSION: &str = "json";
pub const DEFAULT_ARTIFACT_NAME: &str = "model";

/// Current manifest format.
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// On-disk description of a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub format_version: u32,
    pub name: String,
    /// Relative to the bundle root
    pub checkpoints_dir: PathBuf,
    /// Relative to the bundle root
    pub framework_dir: PathBuf,
    pub interpreter: String,
    pub created_at: DateTime<Utc>,
}

/// A named, persistable runner.
#[derive(Debug, Clone)]
pub struct Artifact {
    name: String,
    model: Option<GroverRunner>,
}

impl Artifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind a runner to this artifact for a later [`save`](Self::save).
    pub fn pack(mut self, model: GroverRunner) -> Self {
        self.model = Some(model);
        self
    }

    pub fn get(&self) -> Option<&GroverRunner> {
        self.model.as_ref()
    }

    pub fn into_inner(self) -> Option<GroverRunner> {
        self.model
    }

    /// Path of the manifest inside a bundle rooted at `base`.
    pub fn manifest_path(&self, base: &Path) -> PathBuf {
        base.join(format!("{}.{}", self.name, MANIFEST_EXTENSION))
    }

    /// Write the bundle under `dst`.
    ///
    /// Each destination subdirectory that already exists is removed first
    /// with a non-recursive removal, so only an empty placeholder is
    /// accepted; a non-empty one aborts the save.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::NotPacked`] without a runner,
    /// [`ArtifactError::DestinationNotEmpty`] for a populated destination,
    /// [`ArtifactError::Copy`] when a source directory cannot be copied.
    pub fn save(&self, dst: impl AsRef<Path>) -> ArtifactResult<()> {
        let dst = dst.as_ref();
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ArtifactError::NotPacked(self.name.clone()))?;

        fs::create_dir_all(dst)?;
        info!(artifact = %self.name, bundle = %dst.display(), "Saving model bundle");

        replace_dir(&model.config().checkpoints_dir, &dst.join(CHECKPOINTS_BASEDIR))?;
        replace_dir(&model.config().framework_dir, &dst.join(FRAMEWORK_BASEDIR))?;

        let manifest = BundleManifest {
            format_version: MANIFEST_FORMAT_VERSION,
            name: self.name.clone(),
            checkpoints_dir: PathBuf::from(CHECKPOINTS_BASEDIR),
            framework_dir: PathBuf::from(FRAMEWORK_BASEDIR),
            interpreter: model.settings().interpreter.clone(),
            created_at: Utc::now(),
        };
        let file = fs::File::create(self.manifest_path(dst))?;
        serde_json::to_writer_pretty(file, &manifest)?;

        info!(artifact = %self.name, bundle = %dst.display(), "Model bundle saved");
        Ok(())
    }

    /// Load the bundle named `name` from `src`.
    ///
    /// The runner's directories are set to `src/checkpoints` and
    /// `src/framework` (absolute), whatever the manifest recorded.
    pub fn load(name: impl Into<String>, src: impl AsRef<Path>) -> ArtifactResult<Self> {
        let artifact = Self::new(name);
        let src = src.as_ref();
        let manifest_path = artifact.manifest_path(src);

        let file = fs::File::open(&manifest_path)?;
        let manifest: BundleManifest = serde_json::from_reader(file)?;
        if manifest.format_version != MANIFEST_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: manifest.format_version,
                expected: MANIFEST_FORMAT_VERSION,
            });
        }
        if manifest.checkpoints_dir != Path::new(CHECKPOINTS_BASEDIR)
            || manifest.framework_dir != Path::new(FRAMEWORK_BASEDIR)
        {
            warn!(
                manifest = %manifest_path.display(),
                "Manifest records a non-standard layout; using bundle defaults"
            );
        }

        let root = std::path::absolute(src)?;
        let settings = RunnerSettings {
            interpreter: manifest.interpreter,
            ..RunnerSettings::default()
        };
        let mut runner = GroverRunner::with_settings(
            ModelConfig::new(PathBuf::new(), PathBuf::new()),
            settings,
        );
        runner.set_checkpoints_dir(root.join(CHECKPOINTS_BASEDIR))?;
        runner.set_framework_dir(root.join(FRAMEWORK_BASEDIR))?;

        info!(
            artifact = %artifact.name,
            framework = %runner.config().framework_dir.display(),
            checkpoints = %runner.config().checkpoints_dir.display(),
            "Model bundle loaded"
        );
        Ok(artifact.pack(runner))
    }
}

/// Replace `dst` with a verbatim copy of `src`.
fn replace_dir(src: &Path, dst: &Path) -> ArtifactResult<()> {
    if dst.exists() {
        if fs::read_dir(dst)?.next().is_some() {
            return Err(ArtifactError::DestinationNotEmpty(dst.to_path_buf()));
        }
        fs::remove_dir(dst)?;
    }

    debug!(from = %src.display(), to = %dst.display(), "Copying directory");
    copy_dir_all(src, dst).map_err(|source| ArtifactError::Copy {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source,
    })
}

/// Recursive copy; symlinks are followed and copied as regular content.
fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !fs::metadata(src)?.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a directory", src.display()),
        ));
    }

    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if fs::metadata(&from)?.is_dir() {
            copy_dir_all(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_path_uses_name() {
        let artifact = Artifact::new("grover");
        assert_eq!(
            artifact.manifest_path(Path::new("/bundles/v1")),
            PathBuf::from("/bundles/v1/grover.json")
        );
    }

    #[test]
    fn test_save_without_pack_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Artifact::new("model").save(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::NotPacked(name) if name == "model"));
    }

    #[test]
    fn test_copy_dir_all_nested() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("a/b")).unwrap();
        fs::write(src.path().join("a/b/file.txt"), "hello").unwrap();
        fs::write(src.path().join("top.txt"), "top").unwrap();

        let dst = tempfile::tempdir().unwrap();
        let target = dst.path().join("copy");
        copy_dir_all(src.path(), &target).unwrap();

        assert_eq!(fs::read_to_string(target.join("a/b/file.txt")).unwrap(), "hello");
        assert_eq!(fs::read_to_string(target.join("top.txt")).unwrap(), "top");
    }

    #[test]
    fn test_replace_dir_removes_empty_placeholder() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("weights.pt"), "w").unwrap();

        let dst = tempfile::tempdir().unwrap();
        let target = dst.path().join(CHECKPOINTS_BASEDIR);
        fs::create_dir(&target).unwrap();

        replace_dir(src.path(), &target).unwrap();
        assert!(target.join("weights.pt").is_file());
    }

    #[test]
    fn test_replace_dir_refuses_populated_destination() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let target = dst.path().join(FRAMEWORK_BASEDIR);
        fs::create_dir(&target).unwrap();
        fs::write(target.join("stale.py"), "old").unwrap();

        let err = replace_dir(src.path(), &target).unwrap_err();
        assert!(matches!(err, ArtifactError::DestinationNotEmpty(p) if p == target));
        assert!(target.join("stale.py").is_file());
    }
}
