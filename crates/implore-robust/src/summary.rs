//! Summary statistics for numeric buffers
//!
//! Provides the building blocks the clipping and outlier code reuse:
//! - Count, minimum, maximum, sum
//! - Mean, standard deviation (population)
//! - Robust statistics (median, MAD)
//!
//! Blank elements are ignored everywhere. An empty (or all-blank) input is
//! not an error: the floating-point results are NaN.

use crate::array::Buffer;
use crate::element::Element;
use crate::view::no_blank_sorted;
use serde::{Deserialize, Serialize};

fn non_blank<T: Element>(data: &[T]) -> impl Iterator<Item = T> + '_ {
    data.iter().copied().filter(|v| !v.is_blank())
}

/// Number of non-blank elements
pub fn number<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> usize {
    non_blank(input.into().as_slice()).count()
}

/// Smallest non-blank element
pub fn minimum<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> Option<T> {
    non_blank(input.into().as_slice()).reduce(|a, b| if b < a { b } else { a })
}

/// Largest non-blank element
pub fn maximum<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> Option<T> {
    non_blank(input.into().as_slice()).reduce(|a, b| if b > a { b } else { a })
}

/// Sum of the non-blank elements (NaN when there are none)
pub fn sum<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> f64 {
    let buffer = input.into();
    let (n, s) = non_blank(buffer.as_slice()).fold((0usize, 0.0), |(n, s), v| (n + 1, s + v.to_f64()));
    if n == 0 {
        f64::NAN
    } else {
        s
    }
}

/// Mean of the non-blank elements
pub fn mean<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> f64 {
    mean_std_of(input.into().as_slice()).0
}

/// Population standard deviation of the non-blank elements
pub fn std<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> f64 {
    mean_std_of(input.into().as_slice()).1
}

/// Mean and standard deviation in one pass
pub fn mean_std<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> (f64, f64) {
    mean_std_of(input.into().as_slice())
}

/// Standard deviation from an already accumulated sum and sum of squares.
///
/// Zero elements give NaN and a single element gives 0. When rounding makes
/// `sum²/n` exceed `sum_sq` the values are identical within precision, so
/// the result is 0.
pub fn std_from_sums(sum: f64, sum_sq: f64, num: usize) -> f64 {
    match num {
        0 => f64::NAN,
        1 => 0.0,
        _ => {
            let ss = sum * sum / num as f64;
            if ss > sum_sq {
                0.0
            } else {
                ((sum_sq - ss) / num as f64).sqrt()
            }
        }
    }
}

/// Mean and std of the non-blank values of a slice.
///
/// Each value is widened to `f64` before squaring so integers near their
/// type limits do not overflow.
pub(crate) fn mean_std_of<T: Element>(data: &[T]) -> (f64, f64) {
    let (mut n, mut s, mut s2) = (0usize, 0.0f64, 0.0f64);
    for v in non_blank(data) {
        let v = v.to_f64();
        n += 1;
        s += v;
        s2 += v * v;
    }
    match n {
        0 => (f64::NAN, f64::NAN),
        1 => (s, 0.0),
        _ => (s / n as f64, std_from_sums(s, s2, n)),
    }
}

/// Median of a blank-free sorted slice (either direction).
pub(crate) fn median_of_sorted<T: Element>(sorted: &[T]) -> f64 {
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => sorted[n / 2].to_f64(),
        _ => (sorted[n / 2].to_f64() + sorted[n / 2 - 1].to_f64()) / 2.0,
    }
}

/// Median absolute deviation of a blank-free slice about `center`.
pub(crate) fn mad_about<T: Element>(values: &[T], center: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut deviations: Vec<f64> = values.iter().map(|v| (v.to_f64() - center).abs()).collect();
    crate::view::sort_increasing(&mut deviations);
    median_of_sorted(&deviations)
}

/// Median of the non-blank elements
///
/// A mutable buffer is compacted and sorted in place.
pub fn median<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> f64 {
    let view = no_blank_sorted(input);
    median_of_sorted(view.as_slice())
}

/// Median absolute deviation of the non-blank elements
pub fn mad<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> f64 {
    median_mad(input).1
}

/// Median and median absolute deviation
pub fn median_mad<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> (f64, f64) {
    let view = no_blank_sorted(input);
    let median = median_of_sorted(view.as_slice());
    (median, mad_about(view.as_slice(), median))
}

/// Unique non-blank values, in order of first appearance
pub fn unique<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> Vec<T> {
    let buffer = input.into();
    let mut indexed: Vec<(usize, T)> = buffer
        .as_slice()
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_blank())
        .collect();

    // Group equal values with the earliest index first, keep one per group.
    indexed.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    indexed.dedup_by(|later, first| later.1 == first.1);
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, v)| v).collect()
}

/// Whether any non-blank element is below zero
pub fn has_negative<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> bool {
    if !T::SIGNED {
        return false;
    }
    non_blank(input.into().as_slice()).any(|v| v.to_f64() < 0.0)
}

/// Every basic statistic of one buffer, gathered from a single sort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Non-blank elements
    pub number: usize,
    /// Blank elements
    pub blank: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub median: f64,
    /// Median absolute deviation about `median`
    pub mad: f64,
}

impl SummaryStats {
    /// Gather the statistics of the non-blank elements
    ///
    /// A mutable buffer is compacted and sorted in place, as by [`median`].
    pub fn from_buffer<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B) -> Self {
        let buffer = input.into();
        let total = buffer.len();
        let (mean, std) = mean_std_of(buffer.as_slice());
        let view = no_blank_sorted(buffer);
        let sorted = view.as_slice();
        let median = median_of_sorted(sorted);

        Self {
            number: sorted.len(),
            blank: total - sorted.len(),
            min: view.min_value().map_or(f64::NAN, |v| v.to_f64()),
            max: view.max_value().map_or(f64::NAN, |v| v.to_f64()),
            mean,
            std,
            median,
            mad: mad_about(sorted, median),
        }
    }
}
