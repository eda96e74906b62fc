// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inverted binarization strategies and the emptiness predicate shared by the
// threshold ladder. Every strategy maps dark pixels to 255 (foreground) and
// light pixels to 0.

use digitscan_core::config::ThresholdStrategy;
use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::definitions::Image;
use imageproc::filter::separable_filter_equal;
use imageproc::map::map_colors;
use tracing::debug;

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Anything that turns an enhanced grayscale image into an inverted binary one.
pub trait Binarizer {
    fn binarize(&self, gray: &GrayImage) -> GrayImage;
}

impl Binarizer for ThresholdStrategy {
    fn binarize(&self, gray: &GrayImage) -> GrayImage {
        match *self {
            Self::Otsu => {
                let level = otsu_level(gray);
                debug!(level, "Otsu threshold computed");
                threshold_inverted(gray, level)
            }
            Self::AdaptiveGaussian { block_size, offset } => {
                adaptive_gaussian_inverted(gray, block_size, offset)
            }
            Self::Fixed { cutoff } => threshold_inverted(gray, cutoff),
        }
    }
}

/// Global inverted threshold: foreground where `value <= cutoff`.
pub fn threshold_inverted(gray: &GrayImage, cutoff: u8) -> GrayImage {
    threshold(gray, cutoff, ThresholdType::BinaryInverted)
}

/// Adaptive inverted threshold against a Gaussian-weighted local mean.
///
/// The mean is taken over a `block_size` x `block_size` window with
/// σ = 0.3·((block_size − 1)/2 − 1) + 0.8 and replicated borders, then rounded
/// half to even into 8 bits. A pixel is foreground where
/// `value <= mean - offset`.
pub fn adaptive_gaussian_inverted(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let intensities: Image<Luma<f32>> = map_colors(gray, |Luma([value])| Luma([f32::from(value)]));
    let mean = separable_filter_equal(&intensities, &gaussian_kernel(block_size as usize));

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = i32::from(gray.get_pixel(x, y).0[0]);
        let local = mean.get_pixel(x, y).0[0].round_ties_even().clamp(0.0, 255.0) as i32;
        if value <= local - offset {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Normalised 1-D Gaussian taps for an odd window size.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let centre = (size as f64 - 1.0) / 2.0;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - centre;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|v| (v / total) as f32).collect()
}

/// Proportion of non-zero pixels. An image without pixels has none.
pub fn foreground_fraction(binary: &GrayImage) -> f64 {
    let total = u64::from(binary.width()) * u64::from(binary.height());
    if total == 0 {
        return 0.0;
    }
    let lit = binary.pixels().filter(|p| p.0[0] != 0).count();
    lit as f64 / total as f64
}

/// The shared emptiness predicate: fewer than `tolerance` of the pixels are lit.
pub fn fraction_is_empty(fraction: f64, tolerance: f64) -> bool {
    fraction < tolerance
}
