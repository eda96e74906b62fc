// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview bitmap: the resized 8-bit image the classifier tensor is derived
// from, with PNG/base64 encodings for embedding in an `<img src>`.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use digitscan_core::error::Result;
use digitscan_core::types::{NormalizedTensor, decode_data_url};
use image::GrayImage;
use tracing::debug;

use crate::image::processor::{ImageProcessor, encode_gray_png};

/// The resized binary bitmap before scaling to the unit range.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage(GrayImage);

impl PreviewImage {
    pub fn new(bitmap: GrayImage) -> Self {
        Self(bitmap)
    }

    /// Decode a preview previously produced by [`PreviewImage::to_base64`].
    /// A `data:` URL header and line wrapping are tolerated.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = decode_data_url(encoded)?;
        let image = ImageProcessor::from_bytes(&bytes)?.into_dynamic();
        Ok(Self(image.to_luma8()))
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }

    /// The classifier view of this bitmap: every pixel divided by 255.
    pub fn to_tensor(&self) -> NormalizedTensor {
        NormalizedTensor::from_gray(&self.0)
    }

    /// Fraction of non-zero pixels.
    pub fn foreground_fraction(&self) -> f64 {
        crate::scan::threshold::foreground_fraction(&self.0)
    }

    // -- Encodings -------------------------------------------------------------

    /// Lossless PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_gray_png(&self.0)
    }

    /// Base64 of the PNG bytes.
    pub fn to_base64(&self) -> Result<String> {
        let png = self.to_png_bytes()?;
        debug!(png_bytes = png.len(), "Preview encoded");
        Ok(STANDARD.encode(png))
    }

    /// `data:image/png;base64,...`, ready for an `<img src>` attribute.
    pub fn to_data_url(&self) -> Result<String> {
        Ok(format!("data:image/png;base64,{}", self.to_base64()?))
    }

    /// Write the bitmap as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let png = self.to_png_bytes()?;
        std::fs::write(path.as_ref(), png)?;
        Ok(())
    }
}
