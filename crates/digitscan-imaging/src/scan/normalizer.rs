// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Digit normalization pipeline: grayscale, CLAHE, the binarization ladder,
// area resize, and unit-range scaling.

use digitscan_core::config::{NormalizeOptions, NormalizerConfig, ThresholdStrategy};
use digitscan_core::error::Result;
use digitscan_core::types::{ImageInput, NormalizedTensor, Prediction};
use image::GrayImage;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::classify::{Classifier, predict};
use crate::image::processor::ImageProcessor;
use crate::image::resize::resize_area;
use crate::scan::clahe::clahe;
use crate::scan::preview::PreviewImage;
use crate::scan::threshold::{Binarizer, foreground_fraction, fraction_is_empty};

/// One rung of the ladder as it was actually run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdAttempt {
    pub strategy: ThresholdStrategy,
    /// Foreground fraction of the full-resolution binary image.
    pub foreground_fraction: f64,
    /// Whether this attempt's bitmap became the pipeline output.
    pub accepted: bool,
}

/// Result of a normalization run.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Classifier input, `(1, size, size, 1)` in `[0, 1]`.
    pub tensor: NormalizedTensor,
    /// The resized bitmap, kept only when the caller asked for it.
    pub preview: Option<PreviewImage>,
    /// Strategy whose bitmap was accepted.
    pub accepted: ThresholdStrategy,
    /// Every attempt in ladder order, the accepted one last.
    pub attempts: Vec<ThresholdAttempt>,
    /// Dimensions of the decoded source image.
    pub source_dimensions: (u32, u32),
}

/// Normalizes handwritten-digit photos into classifier tensors.
///
/// Holds only immutable configuration, so one instance can serve concurrent
/// callers from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct DigitNormalizer {
    config: NormalizerConfig,
}

impl DigitNormalizer {
    /// Create a normalizer, rejecting configurations the pipeline cannot run.
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Run the full pipeline on one image.
    ///
    /// ## Pipeline
    ///
    /// 1. Decode the input and flatten it to RGB
    /// 2. Convert to 8-bit luma
    /// 3. CLAHE (clip limit 2.0, 8x8 tiles by default)
    /// 4. Walk the threshold ladder until a bitmap is non-empty; the last
    ///    rung is accepted unconditionally
    /// 5. Area-resize to `target_size` x `target_size`
    /// 6. Divide by 255 into the `(1, size, size, 1)` tensor
    ///
    /// Only undecodable input fails. Blank and degenerate images run through
    /// the whole ladder and produce a (possibly empty) tensor.
    #[instrument(skip_all, fields(input = %input.describe(), preview = options.want_preview))]
    pub fn normalize(
        &self,
        input: ImageInput,
        options: &NormalizeOptions,
    ) -> Result<NormalizedImage> {
        let processor = ImageProcessor::from_input(input)?.to_rgb();
        let source_dimensions = (processor.width(), processor.height());

        let gray = processor.grayscale();
        let enhanced = clahe(&gray, self.config.clahe_clip_limit, self.config.clahe_tile_grid);

        let (binary, attempts) = self.binarize(&enhanced);
        let accepted = attempts
            .last()
            .map(|attempt| attempt.strategy)
            .unwrap_or(ThresholdStrategy::Otsu);
        info!(
            accepted = %accepted,
            attempts = attempts.len(),
            "Binarization accepted"
        );

        let size = self.config.target_size;
        let resized = resize_area(&binary, size, size);
        let preview = PreviewImage::new(resized);
        let tensor = preview.to_tensor();

        if let Some(path) = &options.debug_output {
            match preview.save_png(path) {
                Ok(()) => debug!(path = %path.display(), "Debug bitmap written"),
                Err(err) => warn!(path = %path.display(), %err, "Could not write debug bitmap"),
            }
        }

        Ok(NormalizedImage {
            tensor,
            preview: options.want_preview.then_some(preview),
            accepted,
            attempts,
            source_dimensions,
        })
    }

    /// Normalize, then hand the tensor to `classifier`.
    pub fn classify<C: Classifier + ?Sized>(
        &self,
        input: ImageInput,
        options: &NormalizeOptions,
        classifier: &C,
    ) -> Result<(Prediction, NormalizedImage)> {
        let normalized = self.normalize(input, options)?;
        let prediction = predict(classifier, &normalized.tensor)?;
        Ok((prediction, normalized))
    }

    /// Try each strategy in order; the first non-empty bitmap wins, and the
    /// last strategy's bitmap is kept whatever it contains.
    fn binarize(&self, enhanced: &GrayImage) -> (GrayImage, Vec<ThresholdAttempt>) {
        let ladder = &self.config.ladder;
        let mut attempts = Vec::with_capacity(ladder.len());
        let mut binary = GrayImage::new(enhanced.width(), enhanced.height());

        for (i, strategy) in ladder.iter().enumerate() {
            binary = strategy.binarize(enhanced);
            let fraction = foreground_fraction(&binary);
            let last = i + 1 == ladder.len();
            let accepted = last || !fraction_is_empty(fraction, self.config.empty_tolerance);
            debug!(strategy = %strategy, fraction, accepted, "Threshold attempt");
            attempts.push(ThresholdAttempt {
                strategy: *strategy,
                foreground_fraction: fraction,
                accepted,
            });
            if accepted {
                break;
            }
        }

        (binary, attempts)
    }
}

/// Normalize with the default configuration: `(tensor, preview if wanted)`.
pub fn normalize(
    input: impl Into<ImageInput>,
    want_preview: bool,
) -> Result<(NormalizedTensor, Option<PreviewImage>)> {
    let options = NormalizeOptions {
        want_preview,
        debug_output: None,
    };
    let result = DigitNormalizer::default().normalize(input.into(), &options)?;
    Ok((result.tensor, result.preview))
}
