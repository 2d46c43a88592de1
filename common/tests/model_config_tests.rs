//! Layout checks for `ModelConfig::verify`.

use common::{ConfigError, ModelConfig, CHECKPOINT_FILE, FEATURES_SCRIPT, FINGERPRINT_SCRIPT};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

#[test]
fn test_verify_complete_layout() {
    let root = tempdir().unwrap();
    let framework = root.path().join("framework");
    let checkpoints = root.path().join("checkpoints");
    touch(&framework.join(FEATURES_SCRIPT));
    touch(&framework.join(FINGERPRINT_SCRIPT));
    touch(&checkpoints.join(CHECKPOINT_FILE));

    let config = ModelConfig::new(&framework, &checkpoints);
    assert!(config.verify().is_ok());
}

#[test]
fn test_verify_reports_every_missing_path() {
    let root = tempdir().unwrap();
    let framework = root.path().join("framework");
    let checkpoints = root.path().join("checkpoints");
    touch(&framework.join(FINGERPRINT_SCRIPT));

    let config = ModelConfig::new(&framework, &checkpoints);
    let ConfigError::MissingPaths(missing) = config.verify().unwrap_err();

    assert_eq!(missing.len(), 2);
    assert!(missing.contains(&framework.join(FEATURES_SCRIPT)));
    assert!(missing.contains(&checkpoints.join(CHECKPOINT_FILE)));
}

#[test]
fn test_verify_error_message_names_paths() {
    let config = ModelConfig::new("/nonexistent/framework", "/nonexistent/checkpoints");
    let message = config.verify().unwrap_err().to_string();
    assert!(message.starts_with("missing required path(s):"));
    assert!(message.contains("grover_large.pt"));
}
