use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Driver kind used when a provider does not declare one
pub const DEFAULT_DRIVER: &str = "litellm";

/// Decimal places used when rounding computed costs
pub const DEFAULT_COST_DECIMALS: u32 = 10;

/// Largest rounding precision that still survives an `f64` round trip
pub const MAX_COST_DECIMALS: u32 = 15;

/// Context window assumed when a model does not declare one
pub const DEFAULT_MAX_CONTEXT: u32 = 200_000;

/// Configuration for a single completion provider
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Driver kind selecting the adapter factory (e.g. `"litellm"`)
    #[serde(default = "default_driver")]
    pub driver: String,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override for the backend
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Decimal places used when rounding computed costs
    #[serde(default = "default_cost_decimals")]
    pub cost_decimals: u32,
    /// Models served by this provider
    #[serde(default)]
    pub models: Vec<ProviderModelConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            api_key: None,
            base_url: None,
            cost_decimals: DEFAULT_COST_DECIMALS,
            models: Vec::new(),
        }
    }
}

impl ProviderConfig {
    /// Create an empty provider configuration for the given driver kind
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Self::default()
        }
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Append a model descriptor
    #[must_use]
    pub fn with_model(mut self, model: ProviderModelConfig) -> Self {
        self.models.push(model);
        self
    }
}

/// Configuration for one model within a provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderModelConfig {
    /// Backend model identifier (e.g. `"claude-sonnet-4-6"`)
    pub id: String,
    /// Short provider-scoped alternate name (e.g. `"sonnet"`)
    #[serde(default)]
    pub alias: Option<String>,
    /// Cost per 1000 input tokens in USD
    #[serde(default)]
    pub cost_per_1k_input: f64,
    /// Cost per 1000 output tokens in USD
    #[serde(default)]
    pub cost_per_1k_output: f64,
    /// Context window size in tokens
    #[serde(default = "default_max_context")]
    pub max_context: u32,
}

impl ProviderModelConfig {
    /// Create a model descriptor with zero cost and the default context window
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias: None,
            cost_per_1k_input: 0.0,
            cost_per_1k_output: 0.0,
            max_context: DEFAULT_MAX_CONTEXT,
        }
    }

    /// Set the alias
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set per-1k input and output costs
    #[must_use]
    pub const fn with_costs(mut self, per_1k_input: f64, per_1k_output: f64) -> Self {
        self.cost_per_1k_input = per_1k_input;
        self.cost_per_1k_output = per_1k_output;
        self
    }

    /// Set the context window
    #[must_use]
    pub const fn with_max_context(mut self, max_context: u32) -> Self {
        self.max_context = max_context;
        self
    }
}

fn default_driver() -> String {
    DEFAULT_DRIVER.to_owned()
}

const fn default_cost_decimals() -> u32 {
    DEFAULT_COST_DECIMALS
}

const fn default_max_context() -> u32 {
    DEFAULT_MAX_CONTEXT
}
