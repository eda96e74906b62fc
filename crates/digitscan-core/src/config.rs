// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Normalizer configuration: tuning constants, the threshold ladder, and
// per-call options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DigitscanError, Result};

/// Side length of the classifier input (MNIST layout).
pub const TARGET_SIZE: u32 = 28;
/// Foreground fraction below which a binary image counts as empty.
pub const EMPTY_TOLERANCE: f64 = 0.01;
/// Cutoff of the last-resort fixed threshold.
pub const FIXED_THRESHOLD: u8 = 140;
/// Neighbourhood size of the adaptive Gaussian threshold.
pub const ADAPTIVE_BLOCK_SIZE: u32 = 11;
/// Offset subtracted from the adaptive local mean.
pub const ADAPTIVE_OFFSET: i32 = 2;
/// CLAHE per-bin clip limit, relative to a flat histogram.
pub const CLAHE_CLIP_LIMIT: f32 = 2.0;
/// CLAHE tiles per axis.
pub const CLAHE_TILE_GRID: u32 = 8;

/// One rung of the binarization ladder.
///
/// Every strategy produces an inverted binary image: dark strokes become 255,
/// the light background becomes 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdStrategy {
    /// Global cutoff chosen by Otsu's between-class variance criterion.
    Otsu,
    /// Per-pixel cutoff from a Gaussian-weighted local mean.
    AdaptiveGaussian { block_size: u32, offset: i32 },
    /// Hardcoded global cutoff.
    Fixed { cutoff: u8 },
}

impl ThresholdStrategy {
    /// Short machine-friendly name, used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Otsu => "otsu",
            Self::AdaptiveGaussian { .. } => "adaptive_gaussian",
            Self::Fixed { .. } => "fixed",
        }
    }

    /// The canonical three-rung ladder: Otsu, adaptive Gaussian, fixed cutoff.
    pub fn default_ladder() -> Vec<Self> {
        vec![
            Self::Otsu,
            Self::AdaptiveGaussian {
                block_size: ADAPTIVE_BLOCK_SIZE,
                offset: ADAPTIVE_OFFSET,
            },
            Self::Fixed {
                cutoff: FIXED_THRESHOLD,
            },
        ]
    }
}

impl std::fmt::Display for ThresholdStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Otsu => write!(f, "otsu"),
            Self::AdaptiveGaussian { block_size, offset } => {
                write!(f, "adaptive_gaussian(block={block_size}, c={offset})")
            }
            Self::Fixed { cutoff } => write!(f, "fixed({cutoff})"),
        }
    }
}

/// Tuning parameters of the normalization pipeline.
///
/// Missing fields in a JSON file fall back to the defaults, so a config file
/// only has to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Output side length in pixels.
    pub target_size: u32,
    /// CLAHE clip limit.
    pub clahe_clip_limit: f32,
    /// CLAHE tiles per axis.
    pub clahe_tile_grid: u32,
    /// Emptiness threshold on the foreground fraction, in [0, 1].
    pub empty_tolerance: f64,
    /// Strategies tried in order. The last one is accepted unconditionally.
    pub ladder: Vec<ThresholdStrategy>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            target_size: TARGET_SIZE,
            clahe_clip_limit: CLAHE_CLIP_LIMIT,
            clahe_tile_grid: CLAHE_TILE_GRID,
            empty_tolerance: EMPTY_TOLERANCE,
            ladder: ThresholdStrategy::default_ladder(),
        }
    }
}

impl NormalizerConfig {
    /// Load a config from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(DigitscanError::InvalidConfig(
                "target_size must be positive".into(),
            ));
        }
        if self.clahe_tile_grid == 0 {
            return Err(DigitscanError::InvalidConfig(
                "clahe_tile_grid must be positive".into(),
            ));
        }
        if !(self.clahe_clip_limit.is_finite() && self.clahe_clip_limit > 0.0) {
            return Err(DigitscanError::InvalidConfig(format!(
                "clahe_clip_limit must be a positive number, got {}",
                self.clahe_clip_limit
            )));
        }
        if !(0.0..=1.0).contains(&self.empty_tolerance) {
            return Err(DigitscanError::InvalidConfig(format!(
                "empty_tolerance must lie in [0, 1], got {}",
                self.empty_tolerance
            )));
        }
        if self.ladder.is_empty() {
            return Err(DigitscanError::InvalidConfig(
                "threshold ladder must contain at least one strategy".into(),
            ));
        }
        for strategy in &self.ladder {
            if let ThresholdStrategy::AdaptiveGaussian { block_size, .. } = strategy {
                if *block_size < 3 || block_size % 2 == 0 {
                    return Err(DigitscanError::InvalidConfig(format!(
                        "adaptive block_size must be odd and at least 3, got {block_size}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Per-call options. Nothing here is shared between calls.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Keep the 28x28 bitmap alongside the tensor.
    pub want_preview: bool,
    /// Write the resized bitmap as PNG here. Diagnostic only.
    pub debug_output: Option<PathBuf>,
}

impl NormalizeOptions {
    pub fn with_preview() -> Self {
        Self {
            want_preview: true,
            debug_output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = NormalizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_size, 28);
        assert_eq!(config.ladder.len(), 3);
        assert_eq!(config.ladder[0], ThresholdStrategy::Otsu);
        assert_eq!(
            config.ladder[2],
            ThresholdStrategy::Fixed { cutoff: 140 }
        );
    }

    #[test]
    fn even_block_size_is_rejected() {
        let config = NormalizerConfig {
            ladder: vec![ThresholdStrategy::AdaptiveGaussian {
                block_size: 10,
                offset: 2,
            }],
            ..NormalizerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DigitscanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_ladder_is_rejected() {
        let config = NormalizerConfig {
            ladder: Vec::new(),
            ..NormalizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn tolerance_outside_unit_range_is_rejected() {
        let config = NormalizerConfig {
            empty_tolerance: 1.5,
            ..NormalizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"empty_tolerance": 0.05, "ladder": [{{"kind": "fixed", "cutoff": 100}}]}}"#
        )
        .expect("write");

        let config = NormalizerConfig::from_json_file(file.path()).expect("load");
        assert_eq!(config.empty_tolerance, 0.05);
        assert_eq!(config.target_size, TARGET_SIZE);
        assert_eq!(config.ladder, vec![ThresholdStrategy::Fixed { cutoff: 100 }]);
    }

    #[test]
    fn strategy_display_names_parameters() {
        let s = ThresholdStrategy::AdaptiveGaussian {
            block_size: 11,
            offset: 2,
        };
        assert_eq!(s.to_string(), "adaptive_gaussian(block=11, c=2)");
        assert_eq!(s.name(), "adaptive_gaussian");
    }
}
