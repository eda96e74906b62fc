// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Digit normalization pipeline: local contrast enhancement, binarization
// ladder, and the preview bitmap.

pub mod clahe;
pub mod normalizer;
pub mod preview;
pub mod threshold;

pub use normalizer::DigitNormalizer;
pub use preview::PreviewImage;
