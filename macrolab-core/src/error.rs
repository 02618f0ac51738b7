//! Error taxonomy for the statistics engine.
//!
//! Degenerate-but-valid inputs (zero variance, constant windows, empty
//! bands) are not errors: they resolve to sentinel values in the component
//! that meets them. Only unmet sample-size preconditions, malformed series,
//! and invalid call parameters surface here.

use thiserror::Error;

/// Errors raised by engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// An operation's minimum sample-size precondition was not met.
    #[error("insufficient data for {operation}: need at least {required} observations, got {actual}")]
    InsufficientData {
        operation: &'static str,
        required: usize,
        actual: usize,
    },

    /// A series failed validation at construction time.
    #[error("invalid series '{key}': {reason}")]
    InvalidSeries { key: String, reason: String },

    /// A call parameter is out of its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl StatsError {
    pub(crate) fn insufficient(operation: &'static str, required: usize, actual: usize) -> Self {
        StatsError::InsufficientData {
            operation,
            required,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message_names_operation_and_counts() {
        let err = StatsError::insufficient("lead_lag", 7, 4);
        assert_eq!(
            err.to_string(),
            "insufficient data for lead_lag: need at least 7 observations, got 4"
        );
    }
}
