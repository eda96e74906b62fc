// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Area-averaging resize. `image::imageops` has no box-coverage filter, and the
// Lanczos/triangle filters alias badly when a photo is shrunk to 28x28.

use image::{GrayImage, Luma};

/// Source pixels covered by one output cell along one axis, with their
/// fractional overlap normalised so the weights sum to 1.
type AxisWeights = Vec<Vec<(usize, f64)>>;

/// Resize `src` to exactly `width` x `height`, each output pixel being the
/// coverage-weighted mean of the source pixels under it.
///
/// Results are rounded half to even. Resizing to the same dimensions returns
/// an identical bitmap. A source with
/// no pixels yields an all-zero output.
pub fn resize_area(src: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (src_w, src_h) = src.dimensions();
    if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }
    if (src_w, src_h) == (width, height) {
        return src.clone();
    }

    let x_weights = axis_weights(src_w as usize, width as usize);
    let y_weights = axis_weights(src_h as usize, height as usize);

    // Horizontal pass: src_h rows of `width` columns.
    let out_w = width as usize;
    let mut horizontal = vec![0.0f64; out_w * src_h as usize];
    for y in 0..src_h {
        let row = &mut horizontal[y as usize * out_w..(y as usize + 1) * out_w];
        for (ox, taps) in x_weights.iter().enumerate() {
            row[ox] = taps
                .iter()
                .map(|&(sx, w)| f64::from(src.get_pixel(sx as u32, y).0[0]) * w)
                .sum();
        }
    }

    // Vertical pass.
    GrayImage::from_fn(width, height, |x, y| {
        let value: f64 = y_weights[y as usize]
            .iter()
            .map(|&(sy, w)| horizontal[sy * out_w + x as usize] * w)
            .sum();
        Luma([value.round_ties_even().clamp(0.0, 255.0) as u8])
    })
}

/// Coverage of each output cell over the source axis.
fn axis_weights(src_len: usize, dst_len: usize) -> AxisWeights {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|o| {
            let start = o as f64 * scale;
            let end = start + scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 1e-9).then_some((s, overlap / scale))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_size_is_identity() {
        let src = GrayImage::from_fn(28, 28, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        assert_eq!(resize_area(&src, 28, 28), src);
    }

    #[test]
    fn integer_shrink_averages_blocks() {
        // 4x4 -> 2x2: each output is the mean of a 2x2 block.
        let src = GrayImage::from_fn(4, 4, |x, y| {
            if x < 2 && y < 2 { Luma([255]) } else { Luma([0]) }
        });
        let out = resize_area(&src, 2, 2);
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
        assert_eq!(out.get_pixel(1, 0).0[0], 0);
        assert_eq!(out.get_pixel(0, 1).0[0], 0);
    }

    #[test]
    fn fractional_shrink_weights_partial_pixels() {
        // 3 -> 2 along x: output 0 covers src[0] fully and half of src[1].
        let src = GrayImage::from_fn(3, 1, |x, _| Luma([[0u8, 255, 255][x as usize]]));
        let out = resize_area(&src, 2, 1);
        // (0 * 1.0 + 255 * 0.5) / 1.5 = 85
        assert_eq!(out.get_pixel(0, 0).0[0], 85);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn halves_round_to_even() {
        // 4 -> 2 along x: outputs are (0 + 1) / 2 = 0.5 and (1 + 2) / 2 = 1.5.
        let src = GrayImage::from_fn(4, 1, |x, _| Luma([[0u8, 1, 1, 2][x as usize]]));
        let out = resize_area(&src, 2, 1);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 2);
    }

    #[test]
    fn uniform_image_stays_uniform() {
        let src = GrayImage::from_pixel(97, 61, Luma([200]));
        let out = resize_area(&src, 28, 28);
        assert!(out.pixels().all(|p| p.0[0] == 200));
    }

    #[test]
    fn enlarging_a_single_pixel_replicates_it() {
        let src = GrayImage::from_pixel(1, 1, Luma([255]));
        let out = resize_area(&src, 28, 28);
        assert_eq!(out.dimensions(), (28, 28));
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn empty_source_gives_black_output() {
        let out = resize_area(&GrayImage::new(0, 0), 28, 28);
        assert_eq!(out.dimensions(), (28, 28));
        assert!(out.pixels().all(|p| p.0[0] == 0));
    }
}
