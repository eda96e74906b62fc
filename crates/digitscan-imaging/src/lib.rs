// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// digitscan-imaging: turns an arbitrary photo of a handwritten digit into a
// 28x28 classifier tensor.
//
// Provides image decoding and encoding, area-averaging resize, contrast-limited
// adaptive histogram equalization, a three-rung binarization ladder
// (Otsu, adaptive Gaussian, fixed cutoff), preview encoding, and the
// classifier seam.

pub mod classify;
pub mod image;
pub mod scan;

// Re-export the primary items so callers can use `digitscan_imaging::DigitNormalizer` etc.
pub use classify::{Classifier, predict};
pub use crate::image::processor::ImageProcessor;
pub use scan::normalizer::{DigitNormalizer, NormalizedImage, ThresholdAttempt, normalize};
pub use scan::preview::PreviewImage;
