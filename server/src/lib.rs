//! GROVER server binary crate.
//!
//! Wires the runner into the HTTP layer and provides the `pack` and
//! one-shot `predict` commands. Behaviour lives in `grover-runner` and
//! `grover-api`; this crate only loads configuration and bundles.

pub mod commands;
pub mod config;

pub use config::{CliArgs, Command, ServerConfig};
