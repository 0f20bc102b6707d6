//! implore-robust - Robust order statistics for scientific data
//!
//! Statistics that stay meaningful when the data carries outliers,
//! missing values or a long tail:
//!
//! - **Quantiles**: quantile indices, quantiles and the inverse quantile
//!   function on sorted data
//! - **Histograms**: regular bins, histograms, cumulative frequency plots
//!   and 2D histograms
//! - **Mode**: mode estimation by mirroring the distribution about
//!   candidate points
//! - **Clipping**: iterative sigma and MAD clipping
//! - **Outliers**: first outlier by neighbor distance or by a flattening
//!   cumulative frequency plot
//!
//! # Inputs
//!
//! Every operation accepts anything convertible into a [`Buffer`]:
//! slices, arrays, `Vec`s and [`NumericArray`]s. Missing values are the
//! element type's blank marker (NaN for floats, `MIN`/`MAX` for integers)
//! and are ignored. Passing data by `&mut` lets an operation compact and
//! sort it in place instead of working on a copy.
//!
//! ```
//! use implore_robust::{clip_sigma, ExtraStats};
//!
//! let mut data: Vec<f64> = (0..100).map(|i| 10.0 + (i % 10) as f64 * 0.1).collect();
//! data.push(1000.0);
//!
//! let result = clip_sigma(&data, 3.0, 0.2, ExtraStats::NONE).unwrap();
//! assert_eq!(result.count_used, 100);
//! ```

pub mod array;
pub mod clip;
pub mod config;
pub mod element;
pub mod error;
pub mod histogram;
pub mod mode;
pub mod outlier;
pub mod quantile;
pub mod summary;
pub mod view;

pub use array::*;
pub use clip::*;
pub use config::*;
pub use element::*;
pub use error::*;
pub use histogram::*;
pub use mode::*;
pub use outlier::*;
pub use quantile::*;
pub use summary::*;
pub use view::*;
