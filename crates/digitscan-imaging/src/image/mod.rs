// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decoding, grayscale conversion, PNG encoding, and area resize.

pub mod processor;
pub mod resize;

pub use processor::ImageProcessor;
pub use resize::resize_area;
