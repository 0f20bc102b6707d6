//! Deterministic synthetic samples
//!
//! Each sample evaluates an inverse CDF at evenly spaced probabilities
//! `(k + 0.5) / n`, so it is reproducible and already sorted.

#![allow(dead_code)]

fn probabilities(n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |k| (k as f64 + 0.5) / n as f64)
}

/// Triangular distribution on `[0, 2]` peaking at 1
pub fn triangular(n: usize) -> Vec<f64> {
    probabilities(n)
        .map(|p| {
            if p < 0.5 {
                (2.0 * p).sqrt()
            } else {
                2.0 - (2.0 * (1.0 - p)).sqrt()
            }
        })
        .collect()
}

/// Logistic distribution: bell-shaped like a Gaussian, with a closed-form
/// inverse CDF
pub fn logistic(n: usize, center: f64, scale: f64) -> Vec<f64> {
    probabilities(n).map(|p| center + scale * (p / (1.0 - p)).ln()).collect()
}

/// Density `20·x^19` on `[0, 1]`: piled against the upper edge, no peak
pub fn steep_edge(n: usize) -> Vec<f64> {
    probabilities(n).map(|p| p.powf(0.05)).collect()
}

/// `n` values repeating `10.0, 10.1, ..., 10.9`, followed by `extremes`
pub fn with_outliers(n: usize, extremes: &[f64]) -> Vec<f64> {
    let mut data: Vec<f64> = (0..n).map(|i| 10.0 + (i % 10) as f64 * 0.1).collect();
    data.extend_from_slice(extremes);
    data
}

/// Deterministic shuffle (a stride walk coprime with the length)
pub fn shuffled(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let stride = (n / 3 + 1..n).find(|s| gcd(*s, n) == 1).unwrap_or(1);
    (0..n).map(|k| data[(k * stride) % n]).collect()
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
