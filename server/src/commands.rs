//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{Context, Result};
use common::{FingerprintProvider, ModelConfig};
use grover_api::routes::predict::PredictResponse;
use grover_api::AppState;
use grover_runner::{Artifact, GroverRunner, RunnerSettings};
use tracing::info;

use crate::config::{BundleArgs, PackArgs, PredictArgs, RunnerConfig, ServeArgs, ServerConfig};

/// Load a bundle, apply runner overrides and check the framework layout.
pub fn load_runner(bundle: &BundleArgs, overrides: &RunnerConfig) -> Result<GroverRunner> {
    let artifact = Artifact::load(&bundle.name, &bundle.bundle).with_context(|| {
        format!(
            "Failed to load bundle '{}' from {}",
            bundle.name,
            bundle.bundle.display()
        )
    })?;
    let mut runner = artifact
        .into_inner()
        .context("Bundle did not produce a model")?;

    let settings = overrides.apply(runner.settings().clone());
    runner.set_settings(settings);

    runner
        .config()
        .verify()
        .with_context(|| format!("Bundle at {} is incomplete", bundle.bundle.display()))?;

    info!(
        framework = %runner.config().framework_dir.display(),
        checkpoints = %runner.config().checkpoints_dir.display(),
        interpreter = %runner.settings().interpreter,
        keep_scratch = runner.settings().keep_scratch,
        "Model ready"
    );
    Ok(runner)
}

/// `serve`: load the bundle and run the HTTP API until shutdown.
pub async fn serve(args: &ServeArgs, config: ServerConfig) -> Result<()> {
    let runner = load_runner(&args.bundle, &config.runner)?;
    let state: AppState = Arc::new(runner);
    grover_api::run_server_with_config(state, config.http).await
}

/// `pack`: copy the framework and checkpoints into a bundle at `args.out`.
pub fn pack(args: &PackArgs, config: &ServerConfig) -> Result<()> {
    let model = ModelConfig::new(
        std::path::absolute(&args.framework_dir)?,
        std::path::absolute(&args.checkpoints_dir)?,
    );
    model
        .verify()
        .context("Refusing to pack an incomplete GROVER installation")?;

    let runner = GroverRunner::with_settings(model, config.runner.apply(RunnerSettings::default()));
    Artifact::new(args.name.as_str())
        .pack(runner)
        .save(&args.out)
        .with_context(|| format!("Failed to save bundle to {}", args.out.display()))?;

    info!(bundle = %args.out.display(), name = %args.name, "Bundle packed");
    Ok(())
}

/// `predict`: run one batch and return the response body the API would send.
pub async fn predict(args: &PredictArgs, config: &ServerConfig) -> Result<String> {
    let runner = load_runner(&args.bundle, &config.runner)?;
    let results = FingerprintProvider::predict(&runner, args.smiles.clone())
        .await
        .context("Prediction failed")?;

    Ok(serde_json::to_string_pretty(&PredictResponse(vec![results]))?)
}
