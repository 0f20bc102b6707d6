//! Quantiles and the quantile function
//!
//! A quantile maps a probability to a sorted position; the quantile function
//! goes the other way, from a value to the probability of its closest
//! element. Both work on a [`SortedView`] and honor its direction, so that
//! `q = 0` is always the low extreme.
//!
//! Index rounding is round-to-nearest with an exact `.5` rounding *down*.
//! Existing catalogs were built with that rule, so it is kept as is.

use crate::array::Buffer;
use crate::element::Element;
use crate::error::{StatsError, StatsResult};
use crate::view::{no_blank_sorted, SortedView};

fn check_probability(q: f64) -> StatsResult<()> {
    if (0.0..=1.0).contains(&q) {
        Ok(())
    } else {
        Err(StatsError::QuantileOutOfRange { quantile: q })
    }
}

/// Index of quantile `q` in a sorted array of `size` elements
///
/// # Errors
/// `EmptyInput` when `size == 0`, `QuantileOutOfRange` when `q` is not in
/// `[0, 1]` (NaN included).
pub fn quantile_index(size: usize, q: f64) -> StatsResult<usize> {
    if size == 0 {
        return Err(StatsError::EmptyInput {
            operation: "quantile_index",
        });
    }
    check_probability(q)?;

    let float_index = (size - 1) as f64 * q;
    let floor = float_index.floor();
    let index = if float_index - floor > 0.5 {
        float_index.ceil()
    } else {
        floor
    };
    Ok(index as usize)
}

impl<'a, T: Element> SortedView<'a, T> {
    /// Position in the view holding the element `rank` places above the
    /// smallest one.
    pub(crate) fn position_from_low(&self, rank: usize) -> usize {
        if self.is_increasing() {
            rank
        } else {
            self.len() - 1 - rank
        }
    }

    /// Element at quantile `q` (0 is the smallest value)
    pub fn quantile(&self, q: f64) -> StatsResult<T> {
        let index = quantile_index(self.len(), q)?;
        // Reading the complementary quantile directly on a decreasing view
        // gives the same element.
        let index = if self.is_increasing() {
            index
        } else {
            quantile_index(self.len(), 1.0 - q)?
        };
        Ok(self.as_slice()[index])
    }

    /// Index of the element closest to `value`, `None` outside the data.
    ///
    /// When `value` sits exactly halfway between two neighbors the later
    /// one (in view order) is returned.
    pub fn quantile_function_index(&self, value: f64) -> Option<usize> {
        let data = self.as_slice();
        let first = data.first()?.to_f64();
        let last = data[data.len() - 1].to_f64();
        let increasing = self.is_increasing();

        let inside = if increasing {
            value >= first && value <= last
        } else {
            value <= first && value >= last
        };
        if !inside {
            return None;
        }

        for k in 1..data.len() {
            let current = data[k].to_f64();
            let previous = data[k - 1].to_f64();
            if increasing && current > value {
                return Some(if value - previous < current - value { k - 1 } else { k });
            }
            if !increasing && current < value {
                return Some(if previous - value < value - current { k - 1 } else { k });
            }
        }

        // Only reached when `value` equals the final element.
        Some(data.len() - 1)
    }

    /// Probability of the element closest to `value`
    ///
    /// Outside the data the result is `-inf` (below the minimum) or `+inf`
    /// (above the maximum) rather than a clamped 0 or 1. An empty view gives
    /// NaN, as does a single-element view (there is no spread of ranks).
    pub fn quantile_function(&self, value: f64) -> f64 {
        let (Some(min), Some(max)) = (self.min_value(), self.max_value()) else {
            return f64::NAN;
        };

        match self.quantile_function_index(value) {
            Some(index) => {
                let rank = self.position_from_low(index);
                rank as f64 / (self.len() - 1) as f64
            }
            None if value < min.to_f64() => f64::NEG_INFINITY,
            None if value > max.to_f64() => f64::INFINITY,
            // NaN probe
            None => f64::NAN,
        }
    }
}

/// Element at quantile `q` of the non-blank values
///
/// # Errors
/// `EmptyInput` when there are no non-blank values, `QuantileOutOfRange`
/// when `q` is not in `[0, 1]`.
pub fn quantile<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B, q: f64) -> StatsResult<T> {
    check_probability(q)?;
    no_blank_sorted(input).quantile(q)
}

/// Index (in the sorted view) of the element closest to `value`
pub fn quantile_function_index<'a, T: Element, B: Into<Buffer<'a, T>>>(
    input: B,
    value: f64,
) -> Option<usize> {
    no_blank_sorted(input).quantile_function_index(value)
}

/// Quantile (probability) of `value` within the non-blank values
pub fn quantile_function<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B, value: f64) -> f64 {
    no_blank_sorted(input).quantile_function(value)
}

/// How concentrated the central part of a distribution is
///
/// The sorted values are rescaled onto `[0, 1]` using the second smallest
/// and second largest values (so a single extreme outlier does not set the
/// scale). The result is the quantile width divided by the rescaled value
/// width of the central `q_width` of the data: values far above 1 mean the
/// center is strongly concentrated.
///
/// # Errors
/// `QuantileOutOfRange` when `q_width` is not in `(0, 1]`.
pub fn concentration<'a, T: Element, B: Into<Buffer<'a, T>>>(
    input: B,
    q_width: f64,
) -> StatsResult<f64> {
    if !(q_width > 0.0 && q_width <= 1.0) {
        return Err(StatsError::QuantileOutOfRange { quantile: q_width });
    }

    let view = no_blank_sorted(input);
    let n = view.len();
    if n <= 2 {
        return Ok(f64::NAN);
    }

    let ranked = |rank: usize| view.as_slice()[view.position_from_low(rank)].to_f64();
    let min = ranked(1);
    let max = ranked(n - 2);

    let low = ranked(quantile_index(n, 0.5 - q_width / 2.0)?);
    let high = ranked(quantile_index(n, 0.5 + q_width / 2.0)?);

    let scale = |v: f64| (v - min) / (max - min);
    Ok(q_width / (scale(high) - scale(low)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_index_rounding() {
        assert_eq!(quantile_index(5, 0.0).unwrap(), 0);
        assert_eq!(quantile_index(5, 1.0).unwrap(), 4);
        assert_eq!(quantile_index(5, 0.5).unwrap(), 2);
        // 0.5 exactly rounds down, anything above rounds up
        assert_eq!(quantile_index(2, 0.5).unwrap(), 0);
        assert_eq!(quantile_index(2, 0.51).unwrap(), 1);
        assert_eq!(quantile_index(11, 0.26).unwrap(), 3);
    }

    #[test]
    fn test_quantile_index_errors() {
        assert!(matches!(
            quantile_index(0, 0.5),
            Err(StatsError::EmptyInput { .. })
        ));
        assert!(matches!(
            quantile_index(10, 1.5),
            Err(StatsError::QuantileOutOfRange { .. })
        ));
        assert!(quantile_index(10, -0.01).is_err());
        assert!(quantile_index(10, f64::NAN).is_err());
    }

    #[test]
    fn test_quantile_values() {
        let data = [5u16, 1, 4, 2, 3];
        assert_eq!(quantile(&data, 0.0).unwrap(), 1);
        assert_eq!(quantile(&data, 1.0).unwrap(), 5);
        assert_eq!(quantile(&data, 0.25).unwrap(), 2);
        assert!(quantile::<f32, _>(&[f32::NAN], 0.5).is_err());
    }

    #[test]
    fn test_quantile_decreasing_view() {
        let data = [10.0, 8.0, 6.0, 4.0, 2.0];
        let view = no_blank_sorted(&data);
        assert!(!view.is_increasing());
        assert_eq!(view.quantile(0.0).unwrap(), 2.0);
        assert_eq!(view.quantile(0.25).unwrap(), 4.0);
        assert_eq!(view.quantile(1.0).unwrap(), 10.0);
    }

    #[test]
    fn test_quantile_function_index() {
        let data = [1.0, 2.0, 4.0, 8.0];
        assert_eq!(quantile_function_index(&data, 1.0), Some(0));
        assert_eq!(quantile_function_index(&data, 2.9), Some(1));
        // Halfway between 2 and 4 picks the later element
        assert_eq!(quantile_function_index(&data, 3.0), Some(2));
        assert_eq!(quantile_function_index(&data, 8.0), Some(3));
        assert_eq!(quantile_function_index(&data, 0.5), None);
        assert_eq!(quantile_function_index(&data, 9.0), None);
        assert_eq!(quantile_function_index::<f64, _>(&[], 1.0), None);
    }

    #[test]
    fn test_quantile_function_index_decreasing() {
        let data = [8.0, 4.0, 2.0, 1.0];
        assert_eq!(quantile_function_index(&data, 8.0), Some(0));
        assert_eq!(quantile_function_index(&data, 3.5), Some(1));
        assert_eq!(quantile_function_index(&data, 1.0), Some(3));
        assert_eq!(quantile_function_index(&data, 9.0), None);
    }

    #[test]
    fn test_quantile_function() {
        let data = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_function(&data, 2.0), 0.5);
        assert_eq!(quantile_function(&data, -1.0), f64::NEG_INFINITY);
        assert_eq!(quantile_function(&data, 7.0), f64::INFINITY);
        assert!(quantile_function::<f64, _>(&[], 1.0).is_nan());

        // Direction does not change the probability of a value
        let reversed = [4.0, 3.0, 2.0, 1.0, 0.0];
        assert_eq!(quantile_function(&reversed, 1.0), 0.25);
        assert_eq!(quantile_function(&reversed, 5.0), f64::INFINITY);
    }

    #[test]
    fn test_concentration() {
        let uniform: Vec<f64> = (0..101).map(|i| i as f64).collect();
        let c = concentration(&uniform, 0.5).unwrap();
        assert!((c - 0.99).abs() < 0.05, "uniform concentration {c}");

        let mut peaked = uniform.clone();
        peaked.extend(std::iter::repeat(50.0).take(200));
        assert!(concentration(&peaked, 0.5).unwrap() > 2.0);

        assert!(concentration(&[1.0, 2.0], 0.5).unwrap().is_nan());
        assert!(concentration(&uniform, 0.0).is_err());
        assert!(concentration(&uniform, 1.5).is_err());
    }
}
