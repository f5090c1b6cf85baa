use std::time::Duration;

use serde::Serialize;

use super::ValidationError;

/// Optional sampling parameters for a completion
///
/// Unset fields are left to the backend's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<Duration>,
}

impl CompletionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampling temperature in `[0, 2]`
    pub fn with_temperature(mut self, temperature: f64) -> Result<Self, ValidationError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ValidationError::new("temperature", format!("must be within [0, 2], got {temperature}")));
        }
        self.temperature = Some(temperature);
        Ok(self)
    }

    /// Upper bound on generated tokens, greater than zero
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Result<Self, ValidationError> {
        if max_tokens == 0 {
            return Err(ValidationError::new("max_tokens", "must be greater than 0"));
        }
        self.max_tokens = Some(max_tokens);
        Ok(self)
    }

    /// Nucleus sampling threshold in `[0, 1]`
    pub fn with_top_p(mut self, top_p: f64) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&top_p) {
            return Err(ValidationError::new("top_p", format!("must be within [0, 1], got {top_p}")));
        }
        self.top_p = Some(top_p);
        Ok(self)
    }

    /// Request timeout, greater than zero
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ValidationError> {
        if timeout.is_zero() {
            return Err(ValidationError::new("timeout", "must be greater than 0"));
        }
        self.timeout = Some(timeout);
        Ok(self)
    }

    #[must_use]
    pub fn with_stop_sequences<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_sequences = stop.into_iter().map(Into::into).collect();
        self
    }

    pub const fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub const fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn stop_sequences(&self) -> &[String] {
        &self.stop_sequences
    }

    pub const fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unset() {
        let config = CompletionConfig::new();
        assert_eq!(config.temperature(), None);
        assert_eq!(config.max_tokens(), None);
        assert!(config.stop_sequences().is_empty());
    }

    #[test]
    fn temperature_bounds() {
        assert!(CompletionConfig::new().with_temperature(0.0).is_ok());
        assert!(CompletionConfig::new().with_temperature(2.0).is_ok());
        assert!(CompletionConfig::new().with_temperature(2.1).is_err());
        assert!(CompletionConfig::new().with_temperature(-0.1).is_err());
        assert!(CompletionConfig::new().with_temperature(f64::NAN).is_err());
    }

    #[test]
    fn top_p_bounds() {
        assert!(CompletionConfig::new().with_top_p(1.0).is_ok());
        assert!(CompletionConfig::new().with_top_p(1.5).is_err());
    }

    #[test]
    fn max_tokens_and_timeout_positive() {
        assert!(CompletionConfig::new().with_max_tokens(0).is_err());
        assert!(CompletionConfig::new().with_timeout(Duration::ZERO).is_err());
        let config = CompletionConfig::new()
            .with_max_tokens(256)
            .and_then(|c| c.with_timeout(Duration::from_secs(5)))
            .unwrap()
            .with_stop_sequences(["END"]);
        assert_eq!(config.max_tokens(), Some(256));
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.stop_sequences(), vec!["END".to_owned()]);
    }
}
