//! Histograms and cumulative frequency plots over regular bins
//!
//! Bins are described by their centers. Only regularly spaced bins can be
//! histogrammed: the bin of an element is found arithmetically
//! (`floor((x - min) / width)`) instead of by search.

use crate::array::Buffer;
use crate::element::Element;
use crate::error::{StatsError, StatsResult};
use crate::summary::{maximum, minimum};
use serde::{Deserialize, Serialize};

/// Relative tolerance when deciding whether explicit centers are regular
const REGULAR_SPACING_TOLERANCE: f64 = 1e-9;

/// Ordered bin centers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bins {
    centers: Vec<f64>,
    width: f64,
    regular: bool,
}

impl Bins {
    /// `numbins` equal-width bins covering `[min, max]`
    ///
    /// With `onebinstart`, every center is shifted by the same offset so
    /// that a bin boundary falls exactly on that value (when it lies inside
    /// the range). Histograms of a sample and of its mirror can then be
    /// compared bin for bin.
    ///
    /// # Errors
    /// `ZeroBins` when `numbins == 0`.
    pub fn regular(min: f64, max: f64, numbins: usize, onebinstart: Option<f64>) -> StatsResult<Self> {
        if numbins == 0 {
            return Err(StatsError::ZeroBins);
        }

        let width = (max - min) / numbins as f64;
        let half = width / 2.0;
        let mut centers: Vec<f64> = (0..numbins).map(|i| min + i as f64 * width + half).collect();

        if let Some(start) = onebinstart.filter(|v| !v.is_nan()) {
            let containing = (0..numbins - 1)
                .find(|&i| centers[i] - half < start && centers[i + 1] - half > start);
            if let Some(i) = containing {
                let shift = start - (centers[i] - half);
                centers.iter_mut().for_each(|c| *c += shift);
            }
        }

        Ok(Self {
            centers,
            width,
            regular: true,
        })
    }

    /// Regular bins over a range taken from the data where not given
    ///
    /// Either end of `range` may be NaN, meaning "use the data's extreme".
    ///
    /// # Errors
    /// `ZeroBins`, or `EmptyInput` when an extreme must come from data that
    /// has no non-blank values.
    pub fn from_view<'a, T: Element, B: Into<Buffer<'a, T>>>(
        input: B,
        range: Option<(f64, f64)>,
        numbins: usize,
        onebinstart: Option<f64>,
    ) -> StatsResult<Self> {
        if numbins == 0 {
            return Err(StatsError::ZeroBins);
        }

        let buffer = input.into();
        let (low, high) = range.unwrap_or((f64::NAN, f64::NAN));
        let empty = || StatsError::EmptyInput {
            operation: "regular bins",
        };

        let min = if low.is_nan() {
            minimum(buffer.as_slice()).ok_or_else(empty)?.to_f64()
        } else {
            low
        };
        let max = if high.is_nan() {
            maximum(buffer.as_slice()).ok_or_else(empty)?.to_f64()
        } else {
            high
        };

        Self::regular(min, max, numbins, onebinstart)
    }

    /// Bins from explicit centers
    ///
    /// The bins are tagged regular only when there are at least two and the
    /// spacing is uniform.
    pub fn from_centers(centers: Vec<f64>) -> Self {
        let width = match centers.as_slice() {
            [a, b, ..] => b - a,
            _ => f64::NAN,
        };
        let regular = centers.len() >= 2
            && width > 0.0
            && centers
                .windows(2)
                .all(|w| ((w[1] - w[0]) - width).abs() <= REGULAR_SPACING_TOLERANCE * width.abs());

        Self {
            centers,
            width,
            regular,
        }
    }

    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Width of every bin (NaN for irregular bins)
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_regular(&self) -> bool {
        self.regular
    }

    /// Lower edge of the first bin
    pub fn lower_edge(&self) -> f64 {
        self.centers.first().map_or(f64::NAN, |c| c - self.width / 2.0)
    }

    /// Upper edge of the last bin
    pub fn upper_edge(&self) -> f64 {
        self.centers.last().map_or(f64::NAN, |c| c + self.width / 2.0)
    }

    fn ensure_regular(&self) -> StatsResult<()> {
        if self.regular && !self.centers.is_empty() {
            Ok(())
        } else {
            Err(StatsError::IrregularBins)
        }
    }

    /// Bin holding `x`, `None` outside `[lower_edge, upper_edge]`
    ///
    /// The edges are widened by the rounding error of their computation, so
    /// the data extremes used to build the bins always fall inside. An
    /// element on the upper edge lands in the last bin.
    pub fn index_of(&self, x: f64) -> Option<usize> {
        let slack = REGULAR_SPACING_TOLERANCE * self.width.abs();
        let (min, max) = (self.lower_edge(), self.upper_edge());
        if !(x >= min - slack && x <= max + slack) {
            return None;
        }
        // Saturating cast: a value inside the lower slack maps to bin 0
        let index = ((x - min) / self.width) as usize;
        Some(index.min(self.centers.len() - 1))
    }
}

/// Free-function form of [`Bins::regular`]
pub fn regular_bins(min: f64, max: f64, numbins: usize, onebinstart: Option<f64>) -> StatsResult<Bins> {
    Bins::regular(min, max, numbins, onebinstart)
}

/// How histogram values were scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistogramScaling {
    /// Raw counts
    Counts,
    /// Divided by the number of in-range elements (sums to 1)
    Normalized,
    /// Divided by the largest bin (peaks at 1)
    MaxOne,
}

/// Per-bin values aligned with a set of [`Bins`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// One value per bin
    pub values: Vec<f64>,
    /// Number of elements that fell inside the bins
    pub total: usize,
    pub scaling: HistogramScaling,
}

impl Histogram {
    /// Raw counts, whatever the scaling
    ///
    /// Rounding recovers exact integers from a normalized histogram; a
    /// max-one histogram is rescaled by its peak, which is only known up to
    /// the ratio, so `None` is returned for it.
    pub fn counts(&self) -> Option<Vec<usize>> {
        match self.scaling {
            HistogramScaling::Counts => Some(self.values.iter().map(|v| *v as usize).collect()),
            HistogramScaling::Normalized => Some(
                self.values
                    .iter()
                    .map(|v| (v * self.total as f64).round() as usize)
                    .collect(),
            ),
            HistogramScaling::MaxOne => None,
        }
    }
}

fn raw_counts<T: Element>(data: &[T], bins: &Bins) -> (Vec<usize>, usize) {
    let mut counts = vec![0usize; bins.len()];
    let mut total = 0;
    for x in data.iter().filter(|x| !x.is_blank()) {
        if let Some(i) = bins.index_of(x.to_f64()) {
            counts[i] += 1;
            total += 1;
        }
    }
    (counts, total)
}

/// Histogram of the non-blank values over regular bins
///
/// `normalize` divides by the number of in-range elements, `maxone` by the
/// largest bin.
///
/// # Errors
/// `IrregularBins`, `EmptyInput` for an input with no elements, or
/// `ConflictingScaling` when both scalings are asked for.
pub fn histogram<'a, T: Element, B: Into<Buffer<'a, T>>>(
    input: B,
    bins: &Bins,
    normalize: bool,
    maxone: bool,
) -> StatsResult<Histogram> {
    bins.ensure_regular()?;
    let buffer = input.into();
    if buffer.is_empty() {
        return Err(StatsError::EmptyInput {
            operation: "histogram",
        });
    }
    if normalize && maxone {
        return Err(StatsError::ConflictingScaling);
    }

    let (counts, total) = raw_counts(buffer.as_slice(), bins);
    let mut values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();

    let scaling = if normalize {
        let reference = total as f64;
        values.iter_mut().for_each(|v| *v /= reference);
        HistogramScaling::Normalized
    } else if maxone {
        let reference = values.iter().copied().fold(f64::MIN, f64::max);
        values.iter_mut().for_each(|v| *v /= reference);
        HistogramScaling::MaxOne
    } else {
        HistogramScaling::Counts
    };

    Ok(Histogram {
        values,
        total,
        scaling,
    })
}

/// Cumulative frequency plot aligned with a set of [`Bins`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cfp {
    /// Elements (or fraction of elements) up to and including each bin
    pub values: Vec<f64>,
    /// Number of elements that fell inside the bins
    pub total: usize,
    /// Whether `values` are fractions of `total` rather than counts
    pub normalized: bool,
}

/// Cumulative frequency plot of the non-blank values
///
/// A previously computed histogram over the same bins can be passed in to
/// avoid counting again; a normalized one makes the CFP normalized even
/// without `normalize`. A max-one histogram cannot be turned back into
/// counts and is ignored.
///
/// Normalization divides the cumulative *counts* by the histogram total, so
/// the last bin is exactly 1.
///
/// # Errors
/// Those of [`histogram`], plus `LengthMismatch` when the supplied
/// histogram does not have one value per bin.
pub fn cfp<'a, T: Element, B: Into<Buffer<'a, T>>>(
    input: B,
    bins: &Bins,
    normalize: bool,
    histogram_hint: Option<&Histogram>,
) -> StatsResult<Cfp> {
    bins.ensure_regular()?;
    let buffer = input.into();
    if buffer.is_empty() {
        return Err(StatsError::EmptyInput { operation: "cfp" });
    }

    let supplied = match histogram_hint {
        Some(h) if h.values.len() != bins.len() => {
            return Err(StatsError::LengthMismatch {
                left: h.values.len(),
                right: bins.len(),
            })
        }
        Some(h) => h.counts().map(|c| (c, h.total, h.scaling == HistogramScaling::Normalized)),
        None => None,
    };
    let (counts, total, normalize) = match supplied {
        Some((counts, total, was_normalized)) => (counts, total, normalize || was_normalized),
        None => {
            let (counts, total) = raw_counts(buffer.as_slice(), bins);
            (counts, total, normalize)
        }
    };

    let mut running = 0usize;
    let values = counts
        .iter()
        .map(|&c| {
            running += c;
            if normalize {
                running as f64 / total as f64
            } else {
                running as f64
            }
        })
        .collect();

    Ok(Cfp {
        values,
        total,
        normalized: normalize,
    })
}

/// Joint histogram of two paired columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram2d {
    /// Bin centers along the first column
    pub centers_a: Vec<f64>,
    /// Bin centers along the second column
    pub centers_b: Vec<f64>,
    /// Row-major counts: `counts[i * centers_b.len() + j]`
    pub counts: Vec<usize>,
}

impl Histogram2d {
    /// Count in bin `i` of the first column and bin `j` of the second
    pub fn get(&self, i: usize, j: usize) -> Option<usize> {
        if i < self.centers_a.len() && j < self.centers_b.len() {
            Some(self.counts[i * self.centers_b.len() + j])
        } else {
            None
        }
    }

    /// Number of pairs counted
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// 2D histogram of paired columns `a` and `b`
///
/// A pair is skipped when either value is blank or outside its bins.
///
/// # Errors
/// `LengthMismatch` when the columns differ in length, `IrregularBins`.
pub fn histogram2d<T: Element, U: Element>(
    a: &[T],
    b: &[U],
    bins_a: &Bins,
    bins_b: &Bins,
) -> StatsResult<Histogram2d> {
    if a.len() != b.len() {
        return Err(StatsError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    bins_a.ensure_regular()?;
    bins_b.ensure_regular()?;

    let cols = bins_b.len();
    let mut counts = vec![0usize; bins_a.len() * cols];
    for (x, y) in a.iter().zip(b) {
        if x.is_blank() || y.is_blank() {
            continue;
        }
        if let (Some(i), Some(j)) = (bins_a.index_of(x.to_f64()), bins_b.index_of(y.to_f64())) {
            counts[i * cols + j] += 1;
        }
    }

    Ok(Histogram2d {
        centers_a: bins_a.centers.clone(),
        centers_b: bins_b.centers.clone(),
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_regular_bins_centers() {
        let bins = Bins::regular(0.0, 10.0, 5, None).unwrap();
        assert_eq!(bins.centers(), &[1.0, 3.0, 5.0, 7.0, 9.0]);
        assert_eq!(bins.width(), 2.0);
        assert!(bins.is_regular());
        assert!(matches!(Bins::regular(0.0, 1.0, 0, None), Err(StatsError::ZeroBins)));
    }

    #[test]
    fn test_onebinstart_shift() {
        // Edges 0,2,4,..; 3.0 is inside the second bin, so everything shifts by +1
        let bins = Bins::regular(0.0, 10.0, 5, Some(3.0)).unwrap();
        assert!(approx(bins.centers()[0], 2.0));
        assert!(approx(bins.lower_edge() + bins.width(), 3.0));

        // Outside the range nothing moves
        let bins = Bins::regular(0.0, 10.0, 5, Some(42.0)).unwrap();
        assert_eq!(bins.centers()[0], 1.0);
    }

    #[test]
    fn test_bins_from_view_range() {
        let data = [2.0, 8.0, f64::NAN, 5.0];
        let bins = Bins::from_view(&data, None, 3, None).unwrap();
        assert!(approx(bins.lower_edge(), 2.0));
        assert!(approx(bins.upper_edge(), 8.0));

        let bins = Bins::from_view(&data, Some((f64::NAN, 20.0)), 2, None).unwrap();
        assert!(approx(bins.lower_edge(), 2.0));
        assert!(approx(bins.upper_edge(), 20.0));

        assert!(Bins::from_view::<f64, _>(&[], None, 3, None).is_err());
        assert!(Bins::from_view::<f64, _>(&[], Some((0.0, 1.0)), 3, None).is_ok());
    }

    #[test]
    fn test_from_centers_regularity() {
        assert!(Bins::from_centers(vec![0.5, 1.5, 2.5]).is_regular());
        assert!(!Bins::from_centers(vec![0.5, 1.5, 3.0]).is_regular());
        assert!(!Bins::from_centers(vec![0.5]).is_regular());
    }

    #[test]
    fn test_histogram_counts_and_edges() {
        let data = [0.0, 0.5, 1.0, 1.5, 2.0, 3.0, f64::NAN];
        let bins = Bins::regular(0.0, 2.0, 2, None).unwrap();
        let hist = histogram(&data, &bins, false, false).unwrap();
        // 2.0 sits on the upper edge and goes to the last bin; 3.0 is out
        assert_eq!(hist.values, vec![2.0, 3.0]);
        assert_eq!(hist.total, 5);
        assert_eq!(hist.scaling, HistogramScaling::Counts);
    }

    #[test]
    fn test_histogram_scalings() {
        let data = [1u8, 1, 1, 3];
        let bins = Bins::regular(0.0, 4.0, 2, None).unwrap();

        let norm = histogram(&data, &bins, true, false).unwrap();
        assert_eq!(norm.values, vec![0.75, 0.25]);

        let peak = histogram(&data, &bins, false, true).unwrap();
        assert_eq!(peak.values, vec![1.0, 1.0 / 3.0]);

        assert_eq!(
            histogram(&data, &bins, true, true),
            Err(StatsError::ConflictingScaling)
        );
        let irregular = Bins::from_centers(vec![0.0, 1.0, 5.0]);
        assert_eq!(
            histogram(&data, &irregular, false, false),
            Err(StatsError::IrregularBins)
        );
        assert!(histogram::<u8, _>(&[], &bins, false, false).is_err());
    }

    #[test]
    fn test_cfp() {
        let data = [0.5, 1.5, 1.6, 3.5];
        let bins = Bins::regular(0.0, 4.0, 4, None).unwrap();

        let plain = cfp(&data, &bins, false, None).unwrap();
        assert_eq!(plain.values, vec![1.0, 3.0, 3.0, 4.0]);

        let normalized = cfp(&data, &bins, true, None).unwrap();
        assert_eq!(normalized.values.last(), Some(&1.0));
        assert!(normalized.normalized);
    }

    #[test]
    fn test_cfp_from_supplied_histogram() {
        let data = [0.1, 0.2, 0.3, 2.5, 2.6, 2.7, 2.8];
        let bins = Bins::regular(0.0, 3.0, 3, None).unwrap();

        // A normalized histogram forces a normalized CFP
        let hist = histogram(&data, &bins, true, false).unwrap();
        let from_norm = cfp(&data, &bins, false, Some(&hist)).unwrap();
        assert!(from_norm.normalized);
        assert_eq!(from_norm.values.last(), Some(&1.0));

        // A max-one histogram is ignored
        let peak = histogram(&data, &bins, false, true).unwrap();
        let from_peak = cfp(&data, &bins, false, Some(&peak)).unwrap();
        assert_eq!(from_peak.values, vec![3.0, 3.0, 7.0]);

        let wrong = Histogram {
            values: vec![1.0],
            total: 1,
            scaling: HistogramScaling::Counts,
        };
        assert!(matches!(
            cfp(&data, &bins, false, Some(&wrong)),
            Err(StatsError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_histogram2d() {
        let a = [0.5, 0.5, 1.5, f64::NAN, 1.5];
        let b = [10i32, 30, 30, 10, i32::MIN];
        let bins_a = Bins::regular(0.0, 2.0, 2, None).unwrap();
        let bins_b = Bins::regular(0.0, 40.0, 2, None).unwrap();
        let h = histogram2d(&a, &b, &bins_a, &bins_b).unwrap();

        assert_eq!(h.get(0, 0), Some(1));
        assert_eq!(h.get(0, 1), Some(1));
        assert_eq!(h.get(1, 1), Some(1));
        assert_eq!(h.get(1, 0), Some(0));
        assert_eq!(h.get(2, 0), None);
        assert_eq!(h.total(), 3);

        assert!(matches!(
            histogram2d(&a, &b[..2], &bins_a, &bins_b),
            Err(StatsError::LengthMismatch { left: 5, right: 2 })
        ));
    }
}
