//! Common types shared across the GROVER serving crates.
//!
//! This crate sits at the bottom of the dependency hierarchy:
//! - Has NO dependencies on other workspace crates
//! - Provides the domain types (`ModelConfig`, `FingerprintResult`)
//! - Defines the `FingerprintProvider` trait that transports call into

pub mod backend;
pub mod models;

pub use backend::{FingerprintProvider, ProviderError};
pub use models::{
    ConfigError, FingerprintResult, ModelConfig, CHECKPOINT_FILE, FEATURES_SCRIPT,
    FINGERPRINT_SCRIPT,
};
