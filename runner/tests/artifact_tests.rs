use std::fs;
use std::path::Path;

use common::ModelConfig;
use grover_runner::artifact::{BundleManifest, CHECKPOINTS_BASEDIR, FRAMEWORK_BASEDIR, MANIFEST_FORMAT_VERSION};
use grover_runner::{Artifact, ArtifactError, GroverRunner, RunnerSettings};

fn populate(root: &Path) -> ModelConfig {
    let framework = root.join("grover-src");
    fs::create_dir_all(framework.join("grover/scripts")).unwrap();
    fs::write(framework.join("grover/main.py"), "# main").unwrap();
    fs::write(framework.join("grover/scripts/save_features.py"), "# features").unwrap();

    let checkpoints = root.join("ckpt");
    fs::create_dir_all(&checkpoints).unwrap();
    fs::write(checkpoints.join("grover_large.pt"), b"weights").unwrap();

    ModelConfig::new(framework, checkpoints)
}

fn packed(config: ModelConfig) -> Artifact {
    let settings = RunnerSettings {
        interpreter: "python3".to_string(),
        ..RunnerSettings::default()
    };
    Artifact::new("model").pack(GroverRunner::with_settings(config, settings))
}

#[test]
fn test_save_writes_manifest_and_copies() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let artifact = packed(populate(src.path()));

    artifact.save(out.path()).unwrap();

    assert!(out.path().join(CHECKPOINTS_BASEDIR).join("grover_large.pt").is_file());
    assert!(out.path().join(FRAMEWORK_BASEDIR).join("grover/main.py").is_file());

    let manifest: BundleManifest =
        serde_json::from_str(&fs::read_to_string(out.path().join("model.json")).unwrap()).unwrap();
    assert_eq!(manifest.format_version, MANIFEST_FORMAT_VERSION);
    assert_eq!(manifest.name, "model");
    assert_eq!(manifest.interpreter, "python3");
    assert_eq!(manifest.checkpoints_dir, Path::new(CHECKPOINTS_BASEDIR));
}

#[test]
fn test_load_after_move_points_inside_new_root() {
    let src = tempfile::tempdir().unwrap();
    let first = tempfile::tempdir().unwrap();
    packed(populate(src.path())).save(first.path()).unwrap();

    // Relocate the whole bundle and drop the original sources
    let moved = tempfile::tempdir().unwrap();
    let bundle = moved.path().join("bundle");
    fs::rename(first.path(), &bundle)
        .or_else(|_| copy_tree(first.path(), &bundle))
        .unwrap();
    drop(src);

    let loaded = Artifact::load("model", &bundle).unwrap();
    let runner = loaded.get().unwrap();
    let root = std::path::absolute(&bundle).unwrap();

    assert_eq!(runner.config().checkpoints_dir, root.join(CHECKPOINTS_BASEDIR));
    assert_eq!(runner.config().framework_dir, root.join(FRAMEWORK_BASEDIR));
    assert_eq!(runner.settings().interpreter, "python3");
    runner.config().verify().unwrap();
}

#[test]
fn test_load_ignores_recorded_layout() {
    let out = tempfile::tempdir().unwrap();
    let manifest = serde_json::json!({
        "format_version": MANIFEST_FORMAT_VERSION,
        "name": "model",
        "checkpoints_dir": "/somewhere/else/ckpt",
        "framework_dir": "/somewhere/else/grover",
        "interpreter": "python",
        "created_at": "2024-01-01T00:00:00Z"
    });
    fs::write(out.path().join("model.json"), manifest.to_string()).unwrap();

    let runner = Artifact::load("model", out.path()).unwrap().into_inner().unwrap();
    assert!(runner.config().checkpoints_dir.ends_with(CHECKPOINTS_BASEDIR));
    assert!(runner.config().framework_dir.ends_with(FRAMEWORK_BASEDIR));
    assert!(runner.config().framework_dir.is_absolute());
}

#[test]
fn test_save_into_populated_destination_fails() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fs::create_dir(out.path().join(CHECKPOINTS_BASEDIR)).unwrap();
    fs::write(out.path().join(CHECKPOINTS_BASEDIR).join("old.pt"), b"old").unwrap();

    let err = packed(populate(src.path())).save(out.path()).unwrap_err();
    assert!(matches!(err, ArtifactError::DestinationNotEmpty(_)));
}

#[test]
fn test_save_replaces_empty_placeholders() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fs::create_dir(out.path().join(CHECKPOINTS_BASEDIR)).unwrap();
    fs::create_dir(out.path().join(FRAMEWORK_BASEDIR)).unwrap();

    packed(populate(src.path())).save(out.path()).unwrap();
    assert!(out.path().join(CHECKPOINTS_BASEDIR).join("grover_large.pt").is_file());
}

#[test]
fn test_save_missing_source_is_copy_error() {
    let out = tempfile::tempdir().unwrap();
    let config = ModelConfig::new("/nonexistent/grover", "/nonexistent/ckpt");

    let err = packed(config).save(out.path()).unwrap_err();
    assert!(matches!(err, ArtifactError::Copy { .. }));
}

#[test]
fn test_load_rejects_unknown_version() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    packed(populate(src.path())).save(out.path()).unwrap();

    let path = out.path().join("model.json");
    let mut manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    manifest["format_version"] = serde_json::json!(99);
    fs::write(&path, manifest.to_string()).unwrap();

    let err = Artifact::load("model", out.path()).unwrap_err();
    assert!(matches!(
        err,
        ArtifactError::UnsupportedVersion { found: 99, expected: 1 }
    ));
}

#[test]
fn test_load_missing_manifest_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Artifact::load("absent", dir.path()).unwrap_err();
    assert!(matches!(err, ArtifactError::Io(_)));
}

fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let to = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &to)?;
        } else {
            fs::copy(entry.path(), &to)?;
        }
    }
    Ok(())
}
