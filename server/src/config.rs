//! Configuration system for the GROVER server.
//!
//! Sources, highest priority first:
//! - CLI arguments
//! - Environment variables (`GROVER_*`, resolved by clap)
//! - TOML config file (`--config`)
//! - Defaults

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use grover_api::ApiConfig;
use grover_runner::{RunnerSettings, DEFAULT_ARTIFACT_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command-line arguments for the GROVER server.
#[derive(Parser, Debug, Clone)]
#[command(name = "grover-server")]
#[command(about = "GROVER molecular fingerprint service")]
#[command(version)]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(long, short = 'c', global = true, env = "GROVER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// What the binary does.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve a model bundle over HTTP
    Serve(ServeArgs),
    /// Copy a GROVER installation and its checkpoints into a relocatable bundle
    Pack(PackArgs),
    /// Run one prediction from the command line and print the JSON response
    Predict(PredictArgs),
}

/// Which bundle to load.
#[derive(Args, Debug, Clone)]
pub struct BundleArgs {
    /// Bundle root directory
    #[arg(long, env = "GROVER_BUNDLE")]
    pub bundle: PathBuf,

    /// Artifact name (manifest is `<name>.json`)
    #[arg(long, default_value = DEFAULT_ARTIFACT_NAME, env = "GROVER_MODEL_NAME")]
    pub name: String,
}

/// Overrides for how the framework is invoked.
#[derive(Args, Debug, Clone, Default)]
pub struct RunnerArgs {
    /// Program used to run the framework scripts
    #[arg(long, env = "GROVER_INTERPRETER")]
    pub interpreter: Option<String>,

    /// Parent directory for per-request scratch directories
    #[arg(long, env = "GROVER_SCRATCH_ROOT")]
    pub scratch_root: Option<PathBuf>,

    /// Keep scratch directories after each prediction (true/false)
    #[arg(long, env = "GROVER_KEEP_SCRATCH")]
    pub keep_scratch: Option<bool>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    #[command(flatten)]
    pub runner: RunnerArgs,

    /// Address to bind
    #[arg(long, env = "GROVER_HOST")]
    pub host: Option<String>,

    /// HTTP port
    #[arg(long, short = 'p', env = "GROVER_PORT")]
    pub port: Option<u16>,

    /// Maximum number of requests handled at once
    #[arg(long, env = "GROVER_MAX_CONCURRENT")]
    pub max_concurrent: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct PackArgs {
    /// GROVER installation to copy
    #[arg(long)]
    pub framework_dir: PathBuf,

    /// Directory containing grover_large.pt
    #[arg(long)]
    pub checkpoints_dir: PathBuf,

    /// Bundle root to write
    #[arg(long)]
    pub out: PathBuf,

    /// Artifact name
    #[arg(long, default_value = DEFAULT_ARTIFACT_NAME)]
    pub name: String,

    #[command(flatten)]
    pub runner: RunnerArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    #[command(flatten)]
    pub runner: RunnerArgs,

    /// SMILES strings, in order
    #[arg(required = true)]
    pub smiles: Vec<String>,
}

/// `[runner]` section. Unset fields keep what the bundle recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub interpreter: Option<String>,
    pub scratch_root: Option<PathBuf>,
    pub keep_scratch: Option<bool>,
}

impl RunnerConfig {
    /// Overlay the fields that are set onto `settings`.
    pub fn apply(&self, mut settings: RunnerSettings) -> RunnerSettings {
        if let Some(interpreter) = &self.interpreter {
            settings.interpreter = interpreter.clone();
        }
        if let Some(root) = &self.scratch_root {
            settings.scratch_root = Some(root.clone());
        }
        if let Some(keep) = self.keep_scratch {
            settings.keep_scratch = keep;
        }
        settings
    }

    fn merge_args(&mut self, args: &RunnerArgs) {
        if args.interpreter.is_some() {
            self.interpreter = args.interpreter.clone();
        }
        if args.scratch_root.is_some() {
            self.scratch_root = args.scratch_root.clone();
        }
        if args.keep_scratch.is_some() {
            self.keep_scratch = args.keep_scratch;
        }
    }
}

/// Full server configuration (merged from all sources).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP API settings
    pub http: ApiConfig,

    /// Framework invocation settings
    pub runner: RunnerConfig,
}

impl ServerConfig {
    /// Load configuration from CLI args and optional config file.
    ///
    /// Priority: CLI args > Environment > Config file > Defaults
    pub fn load(args: &CliArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Self::default(),
        };

        match &args.command {
            Command::Serve(serve) => {
                if let Some(host) = &serve.host {
                    config.http.host = host.clone();
                }
                if let Some(port) = serve.port {
                    config.http.port = port;
                }
                if serve.max_concurrent.is_some() {
                    config.http.max_concurrent_requests = serve.max_concurrent;
                }
                config.runner.merge_args(&serve.runner);
            }
            Command::Pack(pack) => config.runner.merge_args(&pack.runner),
            Command::Predict(predict) => config.runner.merge_args(&predict.runner),
        }

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
