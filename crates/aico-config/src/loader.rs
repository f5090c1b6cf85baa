use std::collections::HashSet;
use std::path::Path;

use crate::{Config, MAX_COST_DECIMALS, ProviderConfig};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if [`Config::parse`] fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// Expands `{{ env.VAR }}` placeholders, deserializes, then validates.
    ///
    /// # Errors
    ///
    /// Returns an error if variable expansion, TOML parsing, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate every provider entry
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending provider
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, provider) in &self.providers {
            provider.validate(name)?;
        }
        Ok(())
    }
}

impl ProviderConfig {
    /// Validate this provider's driver kind and model table
    ///
    /// # Errors
    ///
    /// Returns an error on a blank driver, an out-of-range cost precision,
    /// a malformed model descriptor, or a duplicate model id or alias
    pub fn validate(&self, name: &str) -> anyhow::Result<()> {
        if self.driver.trim().is_empty() {
            anyhow::bail!("provider '{name}': driver must not be blank");
        }

        if self.cost_decimals > MAX_COST_DECIMALS {
            anyhow::bail!("provider '{name}': cost_decimals must be at most {MAX_COST_DECIMALS}");
        }

        let mut ids = HashSet::new();
        for model in &self.models {
            if model.id.trim().is_empty() {
                anyhow::bail!("provider '{name}': model id must not be blank");
            }
            if !ids.insert(model.id.as_str()) {
                anyhow::bail!("provider '{name}': duplicate model id '{}'", model.id);
            }
            for (field, rate) in [
                ("cost_per_1k_input", model.cost_per_1k_input),
                ("cost_per_1k_output", model.cost_per_1k_output),
            ] {
                if !rate.is_finite() || rate < 0.0 {
                    anyhow::bail!("provider '{name}': model '{}' has invalid {field}: {rate}", model.id);
                }
            }
            if model.max_context == 0 {
                anyhow::bail!("provider '{name}': model '{}' must have max_context > 0", model.id);
            }
        }

        let mut aliases = HashSet::new();
        for model in &self.models {
            let Some(alias) = model.alias.as_deref() else {
                continue;
            };
            if alias.trim().is_empty() {
                anyhow::bail!("provider '{name}': model '{}' has a blank alias", model.id);
            }
            if !aliases.insert(alias) {
                anyhow::bail!("provider '{name}': duplicate model alias '{alias}'");
            }
            if alias != model.id && ids.contains(alias) {
                anyhow::bail!(
                    "provider '{name}': alias '{alias}' of model '{}' collides with another model id",
                    model.id
                );
            }
        }

        Ok(())
    }
}
