//! Configuration for the aico provider layer
//!
//! Loads the provider table (credentials, base URLs, model descriptors) and
//! telemetry settings from TOML, expanding `{{ env.VAR }}` placeholders first.

#![allow(clippy::must_use_candidate)]

mod env;
mod loader;
pub mod provider;
pub mod telemetry;

use indexmap::IndexMap;
use serde::Deserialize;

pub use provider::*;
pub use telemetry::*;

/// Top-level aico configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Provider configurations keyed by provider name
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
}
