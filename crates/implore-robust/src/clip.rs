//! Sigma and MAD clipping
//!
//! Both variants share one loop over a sorted, blank-free range:
//!
//! 1. measure the center (median) and spread (std or MAD) of the range
//! 2. stop if the spread is zero, or (tolerance mode) if the spread shrank
//!    by less than `param` of itself since the previous round
//! 3. keep only the elements strictly inside `center ± multiplier·spread`
//!
//! `param` selects the stopping policy. Below 1 it is the relative
//! tolerance and at most [`CLIP_MAX_CONVERGE`] rounds are run; a tolerance
//! run that hits that bound has not converged and its center and spread are
//! NaN. From 1 upward it must be a whole number, and exactly that many
//! rounds are counted. Once a trim leaves the range unchanged the remaining
//! rounds are counted but not run, and the history ends with the round that
//! first measured the settled range.
//!
//! In tolerance mode the spread change is not taken as an absolute value: a
//! spread that *grows* after a trim means the previous round clipped too
//! much, and that also stops the loop.

use crate::array::Buffer;
use crate::element::Element;
use crate::error::{ensure_positive, StatsError, StatsResult};
use crate::summary::{mad_about, mean_std_of, median_of_sorted};
use crate::view::no_blank_sorted;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Most rounds run when clipping by tolerance
pub const CLIP_MAX_CONVERGE: usize = 50;

/// Which dispersion measure the clip uses as its spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipKind {
    /// Standard deviation
    Sigma,
    /// Median absolute deviation
    Mad,
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipKind::Sigma => write!(f, "sigma"),
            ClipKind::Mad => write!(f, "MAD"),
        }
    }
}

/// Extra statistics to measure once on the final retained range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraStats {
    /// Mean of the retained range
    pub mean: bool,
    /// Standard deviation of the retained range
    pub std: bool,
    /// MAD of the retained range about its median
    pub mad: bool,
}

impl ExtraStats {
    pub const NONE: Self = Self {
        mean: false,
        std: false,
        mad: false,
    };

    pub const ALL: Self = Self {
        mean: true,
        std: true,
        mad: true,
    };
}

/// Measurements taken at the start of one clipping round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRound {
    /// 1-based round number
    pub round: usize,
    /// Elements in the range this round measured
    pub number: usize,
    pub center: f64,
    pub spread: f64,
}

/// Outcome of a clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipResult {
    /// Median of the last measured range
    pub center: f64,
    /// Spread (std or MAD, per `kind`) of the last measured range
    pub spread: f64,
    /// Standard deviation (the spread for sigma clipping, otherwise only
    /// when requested as an extra)
    pub std: f64,
    /// Median absolute deviation (the spread for MAD clipping, otherwise
    /// only when requested as an extra)
    pub mad: f64,
    /// Mean, when requested as an extra
    pub mean: f64,
    /// Elements left after the final trim
    pub count_used: usize,
    /// Rounds completed (a trim followed each of them)
    pub iterations: usize,
    /// Stopped by zero spread or by tolerance, or ran all requested rounds
    pub converged: bool,
    pub kind: ClipKind,
    /// Per-round measurements, in order, up to the first round whose trim
    /// kept every element
    pub history: Vec<ClipRound>,
}

impl ClipResult {
    fn degenerate(kind: ClipKind, iterations: usize, history: Vec<ClipRound>) -> Self {
        Self {
            center: f64::NAN,
            spread: f64::NAN,
            std: f64::NAN,
            mad: f64::NAN,
            mean: f64::NAN,
            count_used: 0,
            iterations,
            converged: false,
            kind,
            history,
        }
    }

    /// Whether the clip produced a usable center and spread
    pub fn is_valid(&self) -> bool {
        !self.center.is_nan()
    }
}

/// Stopping policy derived from `param`
#[derive(Debug, Clone, Copy)]
enum Policy {
    Tolerance(f64),
    Rounds(usize),
}

impl Policy {
    fn from_param(param: f32) -> StatsResult<Self> {
        ensure_positive("param", param as f64)?;
        if param < 1.0 {
            Ok(Policy::Tolerance(param as f64))
        } else if param.ceil() == param {
            Ok(Policy::Rounds(param as usize))
        } else {
            Err(StatsError::NonIntegralRounds { value: param as f64 })
        }
    }

    fn max_rounds(&self) -> usize {
        match self {
            Policy::Tolerance(_) => CLIP_MAX_CONVERGE,
            Policy::Rounds(n) => *n,
        }
    }
}

/// Check clip arguments without running a clip
pub(crate) fn validate_clip_params(multiplier: f32, param: f32) -> StatsResult<()> {
    ensure_positive("multiplier", multiplier as f64)?;
    Policy::from_param(param).map(|_| ())
}

fn measure<T: Element>(range: &[T], kind: ClipKind) -> (f64, f64) {
    let center = median_of_sorted(range);
    let spread = match kind {
        ClipKind::Sigma => mean_std_of(range).1,
        ClipKind::Mad => mad_about(range, center),
    };
    (center, spread)
}

/// Narrow `[start, start + size)` to the elements strictly inside
/// `(low, high)`. Returns the new start and size (0 when nothing is left).
fn trim<T: Element>(data: &[T], increasing: bool, start: usize, size: usize, low: f64, high: f64) -> (usize, usize) {
    let range = &data[start..start + size];
    let keep_front = |x: f64| if increasing { x > low } else { x < high };
    let keep_back = |x: f64| if increasing { x < high } else { x > low };

    let Some(first) = range.iter().position(|x| keep_front(x.to_f64())) else {
        return (start, 0);
    };
    match range[first..].iter().rposition(|x| keep_back(x.to_f64())) {
        Some(last) => (start + first, last + 1),
        None => (start + first, 0),
    }
}

/// Clip the non-blank values, with the spread given by `kind`
///
/// # Errors
/// `NonPositive` when `multiplier` or `param` is not above zero,
/// `NonIntegralRounds` when `param >= 1` is not a whole number.
pub fn clip<'a, T: Element, B: Into<Buffer<'a, T>>>(
    input: B,
    kind: ClipKind,
    multiplier: f32,
    param: f32,
    extras: ExtraStats,
) -> StatsResult<ClipResult> {
    ensure_positive("multiplier", multiplier as f64)?;
    let policy = Policy::from_param(param)?;
    let multiplier = multiplier as f64;

    let view = no_blank_sorted(input);
    let data = view.as_slice();
    let increasing = view.is_increasing();

    if data.is_empty() {
        debug!(%kind, dtype = T::TYPE_NAME, "no {kind}-clipping: every element is blank or the input is empty");
        return Ok(ClipResult::degenerate(kind, 0, Vec::new()));
    }

    let max_rounds = policy.max_rounds();
    let mut history = Vec::new();
    let mut start = 0;
    let mut size = data.len();
    let mut num = 0;
    let mut center = f64::NAN;
    let mut spread = f64::NAN;
    let mut old_spread = f64::NAN;
    let mut stopped = false;

    if size == 1 {
        center = data[0].to_f64();
        spread = 0.0;
        num = 1;
        stopped = true;
        history.push(ClipRound {
            round: 1,
            number: 1,
            center,
            spread,
        });
    }

    while !stopped && num < max_rounds && size > 0 {
        let range = &data[start..start + size];
        (center, spread) = measure(range, kind);

        let round = ClipRound {
            round: num + 1,
            number: size,
            center,
            spread,
        };
        debug!(%kind, round = round.round, number = size, center, spread, "clip round");
        history.push(round);

        let settled = match policy {
            Policy::Tolerance(tolerance) => num > 0 && (old_spread - spread) / spread < tolerance,
            Policy::Rounds(_) => false,
        };
        if spread == 0.0 || settled {
            stopped = true;
            break;
        }

        let reach = multiplier * spread;
        let trimmed = trim(data, increasing, start, size, center - reach, center + reach);
        num += 1;
        if let Policy::Rounds(rounds) = policy {
            // Every later round would measure and keep this same range
            if trimmed == (start, size) && num < rounds {
                debug!(%kind, round = num, rounds, "clip range settled, skipping the remaining rounds");
                num = rounds;
                break;
            }
        }
        (start, size) = trimmed;
        old_spread = spread;
    }

    let converged = match policy {
        _ if size == 0 => false,
        Policy::Tolerance(_) => stopped,
        Policy::Rounds(_) => true,
    };

    if size == 0 || !converged {
        if size > 0 {
            warn!(%kind, rounds = num, "clipping did not converge within {CLIP_MAX_CONVERGE} rounds");
        } else {
            debug!(%kind, rounds = num, "clipping rejected every element");
        }
        return Ok(ClipResult::degenerate(kind, num, history));
    }

    let retained = &data[start..start + size];
    let mut result = ClipResult {
        center,
        spread,
        std: f64::NAN,
        mad: f64::NAN,
        mean: f64::NAN,
        count_used: size,
        iterations: num,
        converged,
        kind,
        history,
    };
    match kind {
        ClipKind::Sigma => result.std = spread,
        ClipKind::Mad => result.mad = spread,
    }
    fill_extras(&mut result, retained, extras);
    Ok(result)
}

/// Measure the requested extras that the clip itself did not produce
fn fill_extras<T: Element>(result: &mut ClipResult, retained: &[T], extras: ExtraStats) {
    let want_mean = extras.mean && result.mean.is_nan();
    let want_std = extras.std && result.std.is_nan();
    let want_mad = extras.mad && result.mad.is_nan();

    if want_mean || want_std {
        let (mean, std) = mean_std_of(retained);
        if want_mean {
            result.mean = mean;
        }
        if want_std {
            result.std = std;
        }
    }
    if want_mad {
        result.mad = mad_about(retained, median_of_sorted(retained));
    }
}

/// Sigma-clip: spread is the standard deviation
pub fn clip_sigma<'a, T: Element, B: Into<Buffer<'a, T>>>(
    input: B,
    multiplier: f32,
    param: f32,
    extras: ExtraStats,
) -> StatsResult<ClipResult> {
    clip(input, ClipKind::Sigma, multiplier, param, extras)
}

/// MAD-clip: spread is the median absolute deviation
pub fn clip_mad<'a, T: Element, B: Into<Buffer<'a, T>>>(
    input: B,
    multiplier: f32,
    param: f32,
    extras: ExtraStats,
) -> StatsResult<ClipResult> {
    clip(input, ClipKind::Mad, multiplier, param, extras)
}
