//! Programmatic provider configuration for integration tests

use aico_config::{Config, ProviderConfig, ProviderModelConfig};

/// Model id every test provider serves
pub const MODEL_ID: &str = "mock-model-1";

/// Alias of [`MODEL_ID`]
pub const MODEL_ALIAS: &str = "mock";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Add a provider with the given driver kind pointed at a mock backend
    pub fn with_provider(mut self, name: &str, driver: &str, base_url: &str) -> Self {
        let provider = ProviderConfig::new(driver)
            .with_api_key("test-key")
            .with_base_url(base_url.parse().expect("valid URL"))
            .with_model(
                ProviderModelConfig::new(MODEL_ID)
                    .with_alias(MODEL_ALIAS)
                    .with_costs(0.003, 0.015)
                    .with_max_context(8_000),
            );
        self.config.providers.insert(name.to_owned(), provider);
        self
    }

    /// Add a LiteLLM-routed provider
    pub fn with_litellm_provider(self, name: &str, base_url: &str) -> Self {
        self.with_provider(name, "litellm", base_url)
    }

    /// Add a directly addressed OpenAI-compatible provider
    pub fn with_openai_provider(self, name: &str, base_url: &str) -> Self {
        self.with_provider(name, "openai", base_url)
    }

    pub fn build(self) -> Config {
        self.config
    }
}
