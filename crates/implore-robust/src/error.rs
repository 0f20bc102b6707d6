//! Error types for implore-robust
//!
//! Only caller-contract violations are errors. Statistical degeneracies
//! (all-blank input, zero spread, a poorly symmetric mode, an outlier scan
//! that finds nothing) are reported through NaN fields, `None` or a
//! `converged` flag on the result instead.

use thiserror::Error;

/// Invalid arguments given to a statistics operation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// Quantile probability outside [0, 1]
    #[error("Quantile must be between 0.0 and 1.0 (inclusive), got {quantile}")]
    QuantileOutOfRange { quantile: f64 },

    /// The operation is not defined on a zero-sized input
    #[error("{operation}: input has no (non-blank) elements")]
    EmptyInput { operation: &'static str },

    /// Bins were requested with `numbins == 0`
    #[error("Number of bins cannot be zero")]
    ZeroBins,

    /// Histogram or CFP requested on bins that are not regularly spaced
    #[error("Bins are not regular; only regular bins are supported")]
    IrregularBins,

    /// Both `normalize` and `maxone` were requested
    #[error("Only one of 'normalize' and 'maxone' may be given")]
    ConflictingScaling,

    /// A parameter that must be strictly positive was not
    #[error("'{name}' must be greater than zero, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// A clip count (param >= 1) was not a whole number
    #[error("A clip 'param' of 1.0 or more is a number of rounds and must be an integer, got {value}")]
    NonIntegralRounds { value: f64 },

    /// Outlier window too short to define a baseline
    #[error("Window size {window} is too small (must be at least {minimum})")]
    WindowTooSmall { window: usize, minimum: usize },

    /// Paired columns have different lengths
    #[error("Paired inputs differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

impl StatsError {
    /// Every variant is a caller-contract violation (the InvalidArgument class).
    pub fn is_invalid_argument(&self) -> bool {
        true
    }
}

/// Result type for statistics operations
pub type StatsResult<T> = Result<T, StatsError>;

/// Check that a parameter is strictly positive (NaN is rejected too).
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> StatsResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(StatsError::NonPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive("x", 1.0).is_ok());
        assert_eq!(
            ensure_positive("x", 0.0),
            Err(StatsError::NonPositive { name: "x", value: 0.0 })
        );
        assert!(ensure_positive("x", f64::NAN).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = StatsError::QuantileOutOfRange { quantile: 1.5 };
        assert!(err.to_string().contains("1.5"));
        assert!(err.is_invalid_argument());
    }
}
