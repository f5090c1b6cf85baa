use serde::Serialize;

use super::{ValidationError, non_negative};

/// Token counts and cost of one completion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TokenUsage {
    input_tokens: u64,
    output_tokens: u64,
    total_tokens: u64,
    cost_usd: f64,
}

impl TokenUsage {
    /// Create a usage record
    ///
    /// `total_tokens` must equal `input_tokens + output_tokens` and the cost
    /// must be finite and non-negative.
    pub fn new(input_tokens: u64, output_tokens: u64, total_tokens: u64, cost_usd: f64) -> Result<Self, ValidationError> {
        let sum = input_tokens
            .checked_add(output_tokens)
            .ok_or_else(|| ValidationError::new("total_tokens", "token count overflow"))?;
        if total_tokens != sum {
            return Err(ValidationError::new(
                "total_tokens",
                format!("{total_tokens} != input_tokens ({input_tokens}) + output_tokens ({output_tokens})"),
            ));
        }
        Ok(Self {
            input_tokens,
            output_tokens,
            total_tokens,
            cost_usd: non_negative("cost_usd", cost_usd)?,
        })
    }

    pub const fn input_tokens(&self) -> u64 {
        self.input_tokens
    }

    pub const fn output_tokens(&self) -> u64 {
        self.output_tokens
    }

    pub const fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Cost in US dollars
    pub const fn cost_usd(&self) -> f64 {
        self.cost_usd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_must_be_sum() {
        assert!(TokenUsage::new(10, 5, 15, 0.0).is_ok());
        let err = TokenUsage::new(10, 5, 16, 0.0).unwrap_err();
        assert_eq!(err.field(), "total_tokens");
    }

    #[test]
    fn cost_must_be_finite_and_non_negative() {
        assert!(TokenUsage::new(0, 0, 0, -0.1).is_err());
        assert!(TokenUsage::new(0, 0, 0, f64::NAN).is_err());
        assert!(TokenUsage::new(0, 0, 0, f64::INFINITY).is_err());
    }

    #[test]
    fn overflowing_counts_rejected() {
        assert!(TokenUsage::new(u64::MAX, 1, 0, 0.0).is_err());
    }
}
