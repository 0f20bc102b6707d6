//! Mode estimation by mirroring the distribution
//!
//! For a candidate mode at sorted index `m`, the part of the distribution
//! below `m` is reflected about `v[m]` and compared with the part actually
//! above it. Near the true mode of a roughly symmetric peak the two match;
//! the score of a candidate is the largest index mismatch between them.
//!
//! The best candidate is found with a golden-section search between the
//! 1% and 55% quantiles. The search has one deliberate twist: when the
//! reflection overshoots the real data by more than the counting noise
//! allows ([`Score::MirrorAbove`]), the candidate is in a tail rather than
//! on the peak, and the search is pushed to the lower interval whatever the
//! ordinary comparison would say.
//!
//! A found mode is only reported when the data around it is symmetric
//! enough (see [`MODE_GOOD_SYM`]); otherwise every field is NaN.

use crate::array::Buffer;
use crate::element::Element;
use crate::error::{ensure_positive, StatsResult};
use crate::histogram::{cfp, histogram, Bins, Cfp, Histogram};
use crate::quantile::quantile_index;
use crate::view::{no_blank_sorted, SortedView};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Lower quantile of the mode search interval
pub const MODE_MIN_QUANTILE: f64 = 0.01;
/// Upper quantile of the mode search interval
pub const MODE_MAX_QUANTILE: f64 = 0.55;
/// Quantile (of `[0, 2m]`) used as the lower reference for symmetry
pub const MODE_SYM_LOW_QUANTILE: f64 = 0.01;
/// Golden ratio, `(1 + sqrt(5)) / 2`
pub const MODE_GOLDEN_RATIO: f32 = 1.618_034;
/// `2 - golden ratio`: where a probe is placed inside the larger interval
pub const MODE_TWO_TAKE_GR: f32 = 0.38197;
/// Relative interval width at which the search stops
pub const MODE_TOLERANCE: f32 = 0.01;
/// Symmetry a mode needs to be reported
pub const MODE_GOOD_SYM: f64 = 0.2;
/// At most this many mirror points are compared per score
pub const MODE_MAX_MIRROR_CHECKS: usize = 1000;
/// Upper bound on golden-section steps
const MODE_MAX_STEPS: usize = 1000;

/// Outcome of mirroring the distribution about one candidate index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Score {
    /// Largest index mismatch between the mirror and the data (lower is
    /// better)
    Valid(usize),
    /// The mirror ran above the data: the candidate is not on the peak.
    /// Ranks worse than every valid score.
    MirrorAbove,
}

/// Mode of a distribution and the quality of the estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeResult {
    /// Value at the mode
    pub mode: f64,
    /// Quantile of the mode, in `[0, 1]`
    pub quantile: f64,
    /// Ratio of the distances from the mode to the upper and lower
    /// symmetry bounds (1 for a perfectly symmetric peak)
    pub symmetry: f64,
    /// Value where the data stops being symmetric about the mode
    pub symmetry_value: f64,
}

impl ModeResult {
    /// The "no reliable mode" result
    pub fn rejected() -> Self {
        Self {
            mode: f64::NAN,
            quantile: f64::NAN,
            symmetry: f64::NAN,
            symmetry_value: f64::NAN,
        }
    }

    /// Whether a mode was found and passed the symmetry test
    pub fn is_accepted(&self) -> bool {
        !self.mode.is_nan()
    }
}

/// A blank-free view read in increasing order, whatever its storage order
struct Ascending<'v, T> {
    data: &'v [T],
    reversed: bool,
}

impl<'v, T: Element> Ascending<'v, T> {
    fn new(view: &'v SortedView<'_, T>) -> Self {
        Self {
            data: view.as_slice(),
            reversed: !view.is_increasing(),
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn at(&self, i: usize) -> f64 {
        let i = if self.reversed { self.data.len() - 1 - i } else { i };
        self.data[i].to_f64()
    }

    /// Offset `j` (from `m`) of the element closest to `target`, scanning
    /// forward from `start`; `len - m` when every element is below it.
    fn closest_above(&self, m: usize, start: usize, target: f64) -> usize {
        let size = self.len();
        for j in start..size - m {
            let current = self.at(m + j);
            if current > target {
                // `current > target >= at(m)` so `j >= 1` here
                let previous = self.at(m + j - 1);
                return if current - target < target - previous {
                    j
                } else {
                    j - 1
                };
            }
        }
        size - m
    }
}

/// Golden-section state: the interval and the score at its probe point
struct Search<'v, T> {
    data: Ascending<'v, T>,
    mirror_distance: f64,
    numcheck: usize,
    interval: usize,
    low: usize,
    mid: usize,
    high: usize,
    mid_score: Score,
}

impl<'v, T: Element> Search<'v, T> {
    fn new(data: Ascending<'v, T>, mirror_distance: f64) -> StatsResult<Self> {
        let size = data.len();
        let numcheck = size / 2;
        let interval = if numcheck > MODE_MAX_MIRROR_CHECKS {
            numcheck / MODE_MAX_MIRROR_CHECKS
        } else {
            1
        };

        let low = quantile_index(size, MODE_MIN_QUANTILE)?;
        let high = quantile_index(size, MODE_MAX_QUANTILE)?;
        let mid = ((high as f32 + MODE_GOLDEN_RATIO * low as f32) / (1.0 + MODE_GOLDEN_RATIO)) as usize;

        let mut search = Self {
            data,
            mirror_distance,
            numcheck,
            interval,
            low,
            mid,
            high,
            mid_score: Score::Valid(0),
        };
        search.mid_score = search.score(mid);
        Ok(search)
    }

    /// Allowed index mismatch at `m` from counting noise
    fn error_budget(&self, m: usize) -> usize {
        (self.mirror_distance * (m as f64).sqrt()) as usize
    }

    /// Mirror the data below `m` about `v[m]` and measure the mismatch
    fn score(&self, m: usize) -> Score {
        let size = self.data.len();
        let budget = self.error_budget(m);
        let center = self.data.at(m);

        let mut max_diff = 0;
        let mut prev_j = 0;
        let mut i = 1;
        while i < self.numcheck && i <= m && m + i < size {
            let mirrored = 2.0 * center - self.data.at(m - i);
            let j = self.data.closest_above(m, prev_j, mirrored);

            if i > j + budget {
                return Score::MirrorAbove;
            }
            max_diff = max_diff.max(i.abs_diff(j));
            prev_j = j;
            i += self.interval;
        }
        Score::Valid(max_diff)
    }

    fn upper_is_larger(&self) -> bool {
        self.high - self.mid > self.mid - self.low
    }

    /// Run the search to completion, returning the mode index
    fn run(&mut self) -> usize {
        for _ in 0..MODE_MAX_STEPS {
            let probe = if self.upper_is_larger() {
                (self.mid as f32 + MODE_TWO_TAKE_GR * (self.high - self.mid) as f32) as usize
            } else {
                (self.mid as f32 - MODE_TWO_TAKE_GR * (self.mid - self.low) as f32) as usize
            };

            let width = self.high - self.low;
            if (width as f32) < MODE_TOLERANCE * (self.mid + probe) as f32 || width <= 3 {
                return (self.high + self.low) / 2;
            }

            let score = self.score(probe);
            trace!(
                low = self.low,
                mid = self.mid,
                high = self.high,
                probe,
                ?score,
                "golden-section probe"
            );

            match score {
                // Candidate is in a tail: always move toward lower values.
                Score::MirrorAbove => {
                    if self.mid < probe {
                        self.high = probe;
                    } else {
                        self.high = self.mid;
                        self.mid = probe;
                        self.mid_score = score;
                    }
                }
                _ if score < self.mid_score => {
                    if self.upper_is_larger() {
                        self.low = self.mid;
                    } else {
                        self.high = self.mid;
                    }
                    self.mid = probe;
                    self.mid_score = score;
                }
                _ => {
                    if self.upper_is_larger() {
                        self.high = probe;
                    } else {
                        self.low = probe;
                    }
                }
            }
        }

        warn!(
            steps = MODE_MAX_STEPS,
            low = self.low,
            high = self.high,
            "mode search did not converge; using the interval midpoint"
        );
        (self.high + self.low) / 2
    }

    /// Symmetry ratio about `m` and the value bounding the symmetric part
    fn symmetricity(&self, m: usize) -> (f64, f64) {
        let size = self.data.len();
        let top = (2 * m).min(size - 1);
        let budget = self.error_budget(m);

        let center = self.data.at(m);
        let reference = match quantile_index(2 * m + 1, MODE_SYM_LOW_QUANTILE) {
            Ok(index) => self.data.at(index),
            Err(_) => return (0.0, f64::NAN),
        };
        if center <= reference {
            return (0.0, f64::NAN);
        }

        let mut bound = None;
        let mut prev_j = 0;
        for i in 1..top.saturating_sub(m) {
            let mirrored = 2.0 * center - self.data.at(m - i);
            let j = self.data.closest_above(m, prev_j, mirrored);
            if i > j + budget || j > i + budget {
                bound = Some(m + i);
                break;
            }
            prev_j = j;
        }

        let bound_value = self.data.at(bound.unwrap_or(top));
        let symmetry = if bound_value == reference {
            0.0
        } else {
            (bound_value - center) / (center - reference)
        };
        (symmetry, bound_value)
    }
}

/// Mode of the non-blank values
///
/// `mirror_distance` scales the noise allowance `sqrt(m)` when comparing
/// the mirrored and actual distributions (1.5 is a common choice).
///
/// # Errors
/// `NonPositive` when `mirror_distance <= 0`.
pub fn mode<'a, T: Element, B: Into<Buffer<'a, T>>>(input: B, mirror_distance: f32) -> StatsResult<ModeResult> {
    ensure_positive("mirror_distance", mirror_distance as f64)?;

    let view = no_blank_sorted(input);
    if view.is_empty() {
        return Ok(ModeResult::rejected());
    }

    let mut search = Search::new(Ascending::new(&view), mirror_distance as f64)?;
    let index = search.run();
    let (symmetry, symmetry_value) = search.symmetricity(index);

    if symmetry > MODE_GOOD_SYM {
        Ok(ModeResult {
            mode: search.data.at(index),
            quantile: index as f64 / (view.len() - 1) as f64,
            symmetry,
            symmetry_value,
        })
    } else {
        debug!(
            index,
            symmetry,
            dtype = T::TYPE_NAME,
            "mode rejected: distribution not symmetric enough about it"
        );
        Ok(ModeResult::rejected())
    }
}

/// A distribution mirrored about one of its values, ready for plotting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorPlots {
    /// Value the distribution was mirrored about
    pub mirror_value: f64,
    /// Bins with one boundary exactly on `mirror_value`
    pub bins: Bins,
    /// Histogram of the mirrored sample, scaled to a peak of 1
    pub histogram: Histogram,
    /// Normalized cumulative frequency plot of the mirrored sample
    pub cfp: Cfp,
}

/// Mirror the distribution about the element closest to `value`
///
/// Everything below that element is kept and reflected above it. Returns
/// `None` when there are no non-blank values, or the closest element is
/// the smallest one or `value` lies outside the data.
///
/// # Errors
/// `ZeroBins` when `numbins == 0`.
pub fn mode_mirror_plots<'a, T: Element, B: Into<Buffer<'a, T>>>(
    input: B,
    value: f64,
    numbins: usize,
) -> StatsResult<Option<MirrorPlots>> {
    let view = no_blank_sorted(input);
    let Some(found) = view.quantile_function_index(value) else {
        return Ok(None);
    };
    let index = view.position_from_low(found);
    if index == 0 {
        return Ok(None);
    }

    let data = Ascending::new(&view);
    let mirror_value = data.at(index);
    let mut mirror: Vec<f64> = (0..=index).map(|i| data.at(i)).collect();
    mirror.extend((1..=index).map(|i| 2.0 * mirror_value - data.at(index - i)));

    let bins = Bins::from_view(&mirror, None, numbins, Some(mirror_value))?;
    let histogram = histogram(&mirror, &bins, false, true)?;
    let cfp = cfp(&mirror, &bins, true, None)?;

    Ok(Some(MirrorPlots {
        mirror_value,
        bins,
        histogram,
        cfp,
    }))
}
