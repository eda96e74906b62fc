// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decodes any accepted input into one in-memory
// representation, converts it to 8-bit luma, and encodes results as PNG.
// Operates on in-memory images using the `image` and `imageproc` crates.

use std::path::Path;

use digitscan_core::error::{DigitscanError, Result};
use digitscan_core::types::ImageInput;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb};
use imageproc::map::map_colors;
use tracing::{debug, info, instrument};

/// Boundary between the callers' input forms and the pipeline.
///
/// Whatever the caller hands in (a path, encoded bytes, or an already-decoded
/// image) ends up as a single `DynamicImage`, so the stages after it only deal
/// with one representation.
///
/// ```ignore
/// let gray = ImageProcessor::open("digit.jpg")?.to_rgb().grayscale();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Resolve any `ImageInput` to a decoded image.
    pub fn from_input(input: ImageInput) -> Result<Self> {
        match input {
            ImageInput::File(path) => Self::open(path),
            ImageInput::Bytes(bytes) => Self::from_bytes(&bytes),
            ImageInput::Decoded(image) => Ok(Self::from_dynamic(image)),
        }
    }

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            DigitscanError::InvalidInput(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (PNG, JPEG, BMP, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(DigitscanError::InvalidInput("empty image buffer".into()));
        }
        let img = image::load_from_memory(data).map_err(|err| {
            DigitscanError::InvalidInput(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Conversions ----------------------------------------------------------

    /// Force 8-bit, 3-channel RGB. Alpha is dropped; single-channel images are
    /// replicated into all three channels.
    pub fn to_rgb(self) -> Self {
        match self.image {
            DynamicImage::ImageRgb8(_) => self,
            other => Self {
                image: DynamicImage::ImageRgb8(other.to_rgb8()),
            },
        }
    }

    /// Convert to single-channel 8-bit intensity with ITU-R 601 luma weights.
    ///
    /// Borrows the pixels when the image is already RGB8 (after [`to_rgb`]);
    /// any other layout is converted first.
    ///
    /// [`to_rgb`]: ImageProcessor::to_rgb
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn grayscale(&self) -> GrayImage {
        let gray = match self.image.as_rgb8() {
            Some(rgb) => map_colors(rgb, rgb_to_luma),
            None => map_colors(&self.image.to_rgb8(), rgb_to_luma),
        };
        debug!("Converted to grayscale");
        gray
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// `(299 R + 587 G + 114 B) / 1000` in 16-bit fixed point, rounded.
#[inline]
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    let weighted = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471;
    ((weighted + 0x8000) >> 16) as u8
}

fn rgb_to_luma(Rgb([r, g, b]): Rgb<u8>) -> Luma<u8> {
    Luma([luma_601(r, g, b)])
}

/// Encode a grayscale bitmap as PNG.
pub fn encode_gray_png(bitmap: &GrayImage) -> Result<Vec<u8>> {
    encode_to_format(&DynamicImage::ImageLuma8(bitmap.clone()), ImageFormat::Png)
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| DigitscanError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
