//! Named provider lookup built from configuration
//!
//! Each provider config declares a driver kind; the registry resolves it
//! against caller-supplied override factories first, then the built-in ones,
//! and stores the resulting adapters in an immutable map.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use aico_config::ProviderConfig;
use indexmap::IndexMap;
use thiserror::Error;
use url::Url;

use crate::backend::{HttpBackend, LITELLM_BASE_URL, OPENAI_BASE_URL};
use crate::driver::{BackendDriver, ModelNaming};
use crate::error::{ErrorKind, ProviderError};
use crate::provider::CompletionProvider;

/// Builds an adapter for `(provider_name, config)`
pub type DriverFactory =
    Arc<dyn Fn(&str, &ProviderConfig) -> Result<Arc<dyn CompletionProvider>, ProviderError> + Send + Sync>;

/// Driver kind routing models through a LiteLLM proxy
pub const LITELLM_DRIVER: &str = "litellm";

/// Driver kind talking to an OpenAI-compatible endpoint directly
pub const OPENAI_DRIVER: &str = "openai";

/// Errors raised while building or querying a [`ProviderRegistry`]
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No usable factory for the provider's driver kind
    #[error("cannot build provider '{provider}' with driver '{driver}': {reason}")]
    DriverFactoryNotFound {
        provider: String,
        driver: String,
        reason: String,
    },

    /// Lookup of a provider name that was never registered
    #[error("provider '{provider}' is not registered (available: {})", .available.join(", "))]
    DriverNotRegistered { provider: String, available: Vec<String> },
}

/// Immutable map of provider name to adapter
///
/// Cloning is cheap and clones share the same map.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    drivers: Arc<BTreeMap<String, Arc<dyn CompletionProvider>>>,
}

impl ProviderRegistry {
    /// Create a registry holding a copy of `drivers`
    pub fn new(drivers: &BTreeMap<String, Arc<dyn CompletionProvider>>) -> Self {
        Self {
            drivers: Arc::new(drivers.clone()),
        }
    }

    /// Build adapters for every configured provider using the built-in factories
    pub fn from_config(providers: &IndexMap<String, ProviderConfig>) -> Result<Self, RegistryError> {
        Self::from_config_with_overrides(providers, &HashMap::new())
    }

    /// Build adapters, consulting `overrides` (keyed by driver kind) before the built-in factories
    pub fn from_config_with_overrides(
        providers: &IndexMap<String, ProviderConfig>,
        overrides: &HashMap<String, DriverFactory>,
    ) -> Result<Self, RegistryError> {
        let defaults = default_factories();
        let mut drivers = BTreeMap::new();

        for (name, config) in providers {
            let driver = config.driver.as_str();
            let not_found = |reason: String| RegistryError::DriverFactoryNotFound {
                provider: name.clone(),
                driver: driver.to_owned(),
                reason,
            };

            let factory = overrides
                .get(driver)
                .or_else(|| defaults.get(driver))
                .ok_or_else(|| not_found("unknown driver kind".to_owned()))?;

            let adapter = factory(name, config).map_err(|e| not_found(format!("factory failed: {e}")))?;

            tracing::debug!(provider = %name, driver = %driver, "registered provider");
            drivers.insert(name.clone(), adapter);
        }

        Ok(Self {
            drivers: Arc::new(drivers),
        })
    }

    /// Adapter registered under `name`
    pub fn get(&self, name: &str) -> Result<Arc<dyn CompletionProvider>, RegistryError> {
        self.drivers
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::DriverNotRegistered {
                provider: name.to_owned(),
                available: self.list_providers(),
            })
    }

    /// Registered provider names in sorted order
    pub fn list_providers(&self) -> Vec<String> {
        self.drivers.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.drivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Built-in factories keyed by driver kind
fn default_factories() -> HashMap<&'static str, DriverFactory> {
    HashMap::from([
        (LITELLM_DRIVER, http_driver_factory(ModelNaming::ProviderPrefixed, LITELLM_BASE_URL)),
        (OPENAI_DRIVER, http_driver_factory(ModelNaming::Bare, OPENAI_BASE_URL)),
    ])
}

fn http_driver_factory(naming: ModelNaming, default_base_url: &'static str) -> DriverFactory {
    Arc::new(
        move |name: &str, config: &ProviderConfig| -> Result<Arc<dyn CompletionProvider>, ProviderError> {
            let base_url = Url::parse(default_base_url)
                .map_err(|e| ProviderError::new(ErrorKind::Internal, format!("invalid default base URL: {e}")))?;
            let backend = Arc::new(HttpBackend::new(base_url));
            Ok(Arc::new(BackendDriver::new(name, config, backend, naming)?))
        },
    )
}
