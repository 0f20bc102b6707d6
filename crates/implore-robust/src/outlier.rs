//! First-outlier detection on sorted data
//!
//! Both detectors walk the sorted, blank-free values and compare a local
//! spacing against a MAD-clipped baseline of the spacings seen just before
//! it. Neither is an error when nothing is found: the result is `None`.

use crate::array::Buffer;
use crate::clip::{clip_mad, validate_clip_params, ExtraStats};
use crate::element::Element;
use crate::error::{ensure_positive, StatsError, StatsResult};
use crate::view::{no_blank_sorted, SortedView};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Stride of the differences used by [`outlier_flat_cfp`]
pub const FLAT_CFP_STRIDE: usize = 2;

/// A baseline std at or below this never flags a difference
const FLAT_CFP_MIN_STD: f64 = 1e-6;

/// Smallest window that can define a spacing baseline
pub(crate) const MIN_WINDOW: usize = 3;

/// Which end of the distribution to search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Walk upward from the low end, looking for a jump to higher values
    Positive,
    /// Walk downward from the high end, looking for a jump to lower values
    Negative,
}

/// An element flagged by a detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    /// Position in the sorted, blank-free view of the input
    pub index: usize,
    /// The element at `index`, widened to `f64`
    pub value: f64,
}

/// Values of the view in increasing order, widened to `f64`
fn ascending<T: Element>(view: &SortedView<'_, T>) -> Vec<f64> {
    let mut values = view.to_f64_vec();
    if !view.is_increasing() {
        values.reverse();
    }
    values
}

fn outlier_at<T: Element>(view: &SortedView<'_, T>, values: &[f64], rank: usize) -> Outlier {
    Outlier {
        index: view.position_from_low(rank),
        value: values[rank],
    }
}

/// Rank (in `values`, increasing) of the element right before the first
/// gap that stands out from the `window_size - 1` gaps preceding it.
fn first_jump(values: &[f64], window_size: usize, sigma: f64, clip_multiplier: f32, clip_param: f32) -> StatsResult<Option<usize>> {
    let wanted = ExtraStats {
        std: true,
        ..ExtraStats::NONE
    };

    for i in window_size..values.len() {
        let mut gaps: Vec<f64> = values[i - window_size..i].windows(2).map(|w| w[1] - w[0]).collect();
        let baseline = clip_mad(&mut gaps, clip_multiplier, clip_param, wanted)?;

        let gap = values[i] - values[i - 1];
        trace!(
            position = i,
            gap,
            median = baseline.center,
            std = baseline.std,
            "outlier distance check"
        );

        if gap - baseline.center > sigma * baseline.std {
            return Ok(Some(i - 1));
        }
    }
    Ok(None)
}

/// First outlier by distance to its neighbor
///
/// At every position past the first `window_size` elements, the gaps
/// between consecutive elements inside the window are MAD-clipped into a
/// baseline. When the next gap exceeds `median + sigma·std` of that
/// baseline, the element right before the jump is the last "normal" one
/// and is returned.
///
/// # Errors
/// `WindowTooSmall` when `window_size <= 2`, `NonPositive` for a
/// non-positive `sigma`, and the clip argument errors of
/// [`crate::clip_mad`].
pub fn outlier_bydistance<'a, T: Element, B: Into<Buffer<'a, T>>>(
    direction: Direction,
    input: B,
    window_size: usize,
    sigma: f32,
    clip_multiplier: f32,
    clip_param: f32,
) -> StatsResult<Option<Outlier>> {
    if window_size < MIN_WINDOW {
        return Err(StatsError::WindowTooSmall {
            window: window_size,
            minimum: MIN_WINDOW,
        });
    }
    ensure_positive("sigma", sigma as f64)?;
    validate_clip_params(clip_multiplier, clip_param)?;

    let view = no_blank_sorted(input);
    if view.is_empty() {
        return Ok(None);
    }
    let values = ascending(&view);
    let n = values.len();

    let found = match direction {
        Direction::Positive => first_jump(&values, window_size, sigma as f64, clip_multiplier, clip_param)?,
        Direction::Negative => {
            // Scanning the negated, reversed values walks down from the top
            let mirrored: Vec<f64> = values.iter().rev().map(|v| -v).collect();
            first_jump(&mirrored, window_size, sigma as f64, clip_multiplier, clip_param)?.map(|k| n - 1 - k)
        }
    };

    Ok(found.map(|rank| {
        let outlier = outlier_at(&view, &values, rank);
        debug!(?direction, index = outlier.index, value = outlier.value, "outlier found by distance");
        outlier
    }))
}

/// Where the cumulative frequency plot flattens out
///
/// Walks the sorted values computing `v[p + 2] - v[p - 2]`. The last
/// `numprev` of these differences are MAD-clipped into a baseline, and a
/// difference is flagged when it is more than `thresh` baseline stds above
/// the baseline median (a wider spacing is a flatter CFP). The start of the
/// first run of `numcontig` consecutive flagged positions is returned.
///
/// # Errors
/// `NonPositive` when `thresh`, `numprev` or `numcontig` is not above zero,
/// and the clip argument errors of [`crate::clip_mad`].
pub fn outlier_flat_cfp<'a, T: Element, B: Into<Buffer<'a, T>>>(
    input: B,
    numprev: usize,
    clip_multiplier: f32,
    clip_param: f32,
    thresh: f32,
    numcontig: usize,
) -> StatsResult<Option<Outlier>> {
    ensure_positive("thresh", thresh as f64)?;
    ensure_positive("numprev", numprev as f64)?;
    ensure_positive("numcontig", numcontig as f64)?;
    validate_clip_params(clip_multiplier, clip_param)?;

    let view = no_blank_sorted(input);
    let values = ascending(&view);
    let d = FLAT_CFP_STRIDE;
    let wanted = ExtraStats {
        std: true,
        ..ExtraStats::NONE
    };

    let mut previous: VecDeque<f64> = VecDeque::with_capacity(numprev);
    let mut run_start = 0;
    let mut run_len = 0;

    for p in d..values.len().saturating_sub(d) {
        let diff = values[p + d] - values[p - d];

        if previous.len() == numprev {
            let mut window: Vec<f64> = previous.iter().copied().collect();
            let baseline = clip_mad(&mut window, clip_multiplier, clip_param, wanted)?;
            let check = (diff - baseline.center) / baseline.std;
            trace!(position = p, diff, check, "flat cfp check");

            if baseline.std > FLAT_CFP_MIN_STD && check > thresh as f64 {
                if run_len == 0 {
                    run_start = p;
                }
                run_len += 1;
                if run_len == numcontig {
                    let outlier = outlier_at(&view, &values, run_start);
                    debug!(index = outlier.index, value = outlier.value, "cfp flattens");
                    return Ok(Some(outlier));
                }
            } else {
                run_len = 0;
            }
            previous.pop_front();
        }
        previous.push_back(diff);
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bydistance_injected_gap() {
        let mut data: Vec<f64> = (0..30).map(|i| i as f64).collect();
        data.push(500.0);
        data.push(501.0);
        let found = outlier_bydistance(Direction::Positive, &data, 5, 3.0, 3.0, 0.2).unwrap();
        assert_eq!(found, Some(Outlier { index: 29, value: 29.0 }));
    }

    #[test]
    fn test_bydistance_uniform_finds_nothing() {
        let data: Vec<i32> = (0..200).collect();
        let found = outlier_bydistance(Direction::Positive, &data, 10, 3.0, 3.0, 0.2).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_bydistance_negative_direction() {
        let mut data: Vec<f64> = vec![-400.0, -399.0];
        data.extend((0..30).map(|i| i as f64));
        let found = outlier_bydistance(Direction::Negative, &data, 5, 3.0, 3.0, 0.2).unwrap();
        assert_eq!(found, Some(Outlier { index: 2, value: 0.0 }));

        // Same data stored in decreasing order reports the view position
        data.reverse();
        let found = outlier_bydistance(Direction::Negative, &data, 5, 3.0, 3.0, 0.2).unwrap();
        assert_eq!(found, Some(Outlier { index: 29, value: 0.0 }));
    }

    #[test]
    fn test_bydistance_arguments() {
        let data = [1.0, 2.0, 3.0];
        assert_eq!(
            outlier_bydistance(Direction::Positive, &data, 2, 3.0, 3.0, 0.2),
            Err(StatsError::WindowTooSmall { window: 2, minimum: 3 })
        );
        assert!(outlier_bydistance(Direction::Positive, &data, 5, 0.0, 3.0, 0.2).is_err());
        assert!(outlier_bydistance(Direction::Positive, &data, 5, 3.0, 3.0, 1.5).is_err());
        assert_eq!(
            outlier_bydistance::<f64, _>(Direction::Positive, &[], 5, 3.0, 3.0, 0.2),
            Ok(None)
        );
    }

    #[test]
    fn test_flat_cfp_detects_spread_out_tail() {
        // Gaps cycle through 8..=12, then the values spread out
        let mut data = vec![0.0];
        for i in 0..75 {
            let gap = if i < 60 { 8 + i % 5 } else { 200 };
            data.push(data[i] + gap as f64);
        }

        let found = outlier_flat_cfp(&data, 10, 3.0, 0.2, 5.0, 3).unwrap().unwrap();
        assert_eq!(found.index, 59);
        assert_eq!(found.value, data[59]);
    }

    #[test]
    fn test_flat_cfp_none_and_arguments() {
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        // Perfectly even spacing: baseline std is zero, nothing flags
        assert_eq!(outlier_flat_cfp(&data, 10, 3.0, 0.2, 5.0, 3).unwrap(), None);
        assert!(outlier_flat_cfp(&data[..3], 10, 3.0, 0.2, 5.0, 3).unwrap().is_none());

        assert!(outlier_flat_cfp(&data, 0, 3.0, 0.2, 5.0, 3).is_err());
        assert!(outlier_flat_cfp(&data, 10, 3.0, 0.2, 0.0, 3).is_err());
        assert!(outlier_flat_cfp(&data, 10, 3.0, 0.2, 5.0, 0).is_err());
    }
}
