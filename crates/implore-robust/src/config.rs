//! Statistics parameters loaded from TOML
//!
//! Pipelines usually fix their clipping, mode and outlier parameters once
//! per survey or instrument. They can be kept in a file such as:
//!
//! ```toml
//! [clip]
//! multiplier = 3.0
//! param = 0.2
//!
//! [mode]
//! mirror_distance = 1.5
//!
//! [outlier]
//! window_size = 10
//! sigma = 5.0
//! numprev = 10
//! threshold = 5.0
//! numcontig = 3
//! ```
//!
//! Every table and field is optional; anything left out keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::array::Buffer;
use crate::clip::{clip_mad, clip_sigma, validate_clip_params, ClipResult, ExtraStats};
use crate::element::Element;
use crate::error::{ensure_positive, StatsError, StatsResult};
use crate::mode::{mode, ModeResult};
use crate::outlier::{outlier_bydistance, outlier_flat_cfp, Direction, Outlier, MIN_WINDOW};

/// Errors that can occur when loading statistics parameters
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("TOML serialize error: {0}")]
    Serialize(String),

    #[error("Invalid parameter: {0}")]
    Invalid(#[from] StatsError),
}

/// Sigma/MAD clipping parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipParams {
    /// Elements beyond `multiplier` spreads from the center are rejected
    pub multiplier: f32,
    /// Below 1: relative tolerance; from 1 up: number of rounds
    pub param: f32,
}

impl Default for ClipParams {
    fn default() -> Self {
        Self {
            multiplier: 3.0,
            param: 0.2,
        }
    }
}

impl ClipParams {
    pub fn validate(&self) -> StatsResult<()> {
        validate_clip_params(self.multiplier, self.param)
    }

    /// Sigma-clip with these parameters
    pub fn sigma<'a, T: Element, B: Into<Buffer<'a, T>>>(&self, input: B) -> StatsResult<ClipResult> {
        clip_sigma(input, self.multiplier, self.param, ExtraStats::NONE)
    }

    /// MAD-clip with these parameters
    pub fn mad<'a, T: Element, B: Into<Buffer<'a, T>>>(&self, input: B) -> StatsResult<ClipResult> {
        clip_mad(input, self.multiplier, self.param, ExtraStats::NONE)
    }
}

/// Mode estimation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeParams {
    /// Noise allowance, in units of `sqrt(index)`, when mirroring
    pub mirror_distance: f32,
}

impl Default for ModeParams {
    fn default() -> Self {
        Self {
            mirror_distance: 1.5,
        }
    }
}

impl ModeParams {
    pub fn validate(&self) -> StatsResult<()> {
        ensure_positive("mirror_distance", self.mirror_distance as f64)
    }

    /// Estimate the mode with these parameters
    pub fn mode<'a, T: Element, B: Into<Buffer<'a, T>>>(&self, input: B) -> StatsResult<ModeResult> {
        mode(input, self.mirror_distance)
    }
}

/// Outlier detection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierParams {
    /// Elements in the by-distance window
    pub window_size: usize,
    /// By-distance threshold, in baseline stds
    pub sigma: f32,
    /// Differences kept as the flat-CFP baseline
    pub numprev: usize,
    /// Flat-CFP threshold, in baseline stds
    pub threshold: f32,
    /// Consecutive flagged differences that mark the CFP as flat
    pub numcontig: usize,
}

impl Default for OutlierParams {
    fn default() -> Self {
        Self {
            window_size: 10,
            sigma: 5.0,
            numprev: 10,
            threshold: 5.0,
            numcontig: 3,
        }
    }
}

impl OutlierParams {
    pub fn validate(&self) -> StatsResult<()> {
        if self.window_size < MIN_WINDOW {
            return Err(StatsError::WindowTooSmall {
                window: self.window_size,
                minimum: MIN_WINDOW,
            });
        }
        ensure_positive("sigma", self.sigma as f64)?;
        ensure_positive("numprev", self.numprev as f64)?;
        ensure_positive("threshold", self.threshold as f64)?;
        ensure_positive("numcontig", self.numcontig as f64)
    }
}

/// All statistics parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// `[clip]` table, also used for outlier baselines
    pub clip: ClipParams,
    /// `[mode]` table
    pub mode: ModeParams,
    /// `[outlier]` table
    pub outlier: OutlierParams,
}

impl StatsConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StatsConfig = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Check every parameter with the same rules the operations apply
    pub fn validate(&self) -> StatsResult<()> {
        self.clip.validate()?;
        self.mode.validate()?;
        self.outlier.validate()
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// By-distance outlier search, baselines clipped with `self.clip`
    pub fn outlier_bydistance<'a, T: Element, B: Into<Buffer<'a, T>>>(
        &self,
        direction: Direction,
        input: B,
    ) -> StatsResult<Option<Outlier>> {
        outlier_bydistance(
            direction,
            input,
            self.outlier.window_size,
            self.outlier.sigma,
            self.clip.multiplier,
            self.clip.param,
        )
    }

    /// Flat-CFP outlier search, baselines clipped with `self.clip`
    pub fn outlier_flat_cfp<'a, T: Element, B: Into<Buffer<'a, T>>>(&self, input: B) -> StatsResult<Option<Outlier>> {
        outlier_flat_cfp(
            input,
            self.outlier.numprev,
            self.clip.multiplier,
            self.clip.param,
            self.outlier.threshold,
            self.outlier.numcontig,
        )
    }
}
