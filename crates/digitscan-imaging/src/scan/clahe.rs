// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast-limited adaptive histogram equalization (CLAHE).
//
// The image is split into a grid of tiles, each tile gets its own clipped
// histogram-equalization lookup table, and every pixel is mapped through the
// four nearest tables with bilinear weights so tile borders do not show.

use image::{GrayImage, Luma};
use tracing::{debug, instrument};

const BINS: usize = 256;

/// Equalize `gray` locally on a `grid` x `grid` tile layout.
///
/// `clip_limit` caps each histogram bin at `clip_limit` times the height of a
/// flat histogram; the clipped excess is spread over all bins. When either
/// side is not a multiple of `grid`, both sides are mirror-padded by
/// `grid - side % grid` for the histogram pass only. The output always has the
/// input's dimensions.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || grid == 0 {
        return gray.clone();
    }

    let tiles = grid as usize;
    let (tile_w, tile_h) = tile_size(width, height, grid);
    let tile_area = tile_w * tile_h;

    let clip = ((clip_limit * tile_area as f32 / BINS as f32) as u32).max(1);
    debug!(tile_w, tile_h, clip, "Building tile lookup tables");

    let mut luts = vec![[0u8; BINS]; tiles * tiles];
    for ty in 0..tiles {
        for tx in 0..tiles {
            let mut hist = [0u32; BINS];
            for y in ty * tile_h..(ty + 1) * tile_h {
                let sy = reflect_101(y, height as usize) as u32;
                for x in tx * tile_w..(tx + 1) * tile_w {
                    let sx = reflect_101(x, width as usize) as u32;
                    hist[gray.get_pixel(sx, sy).0[0] as usize] += 1;
                }
            }
            clip_histogram(&mut hist, clip);
            luts[ty * tiles + tx] = equalization_lut(&hist, tile_area);
        }
    }

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;
    let x_taps: Vec<_> = (0..width as usize)
        .map(|x| interpolation_taps(x, inv_tw, tiles))
        .collect();

    let mut out = GrayImage::new(width, height);
    for y in 0..height as usize {
        let (ty1, ty2, ya) = interpolation_taps(y, inv_th, tiles);
        for (x, &(tx1, tx2, xa)) in x_taps.iter().enumerate() {
            let v = gray.get_pixel(x as u32, y as u32).0[0] as usize;
            let top = f32::from(luts[ty1 * tiles + tx1][v]) * (1.0 - xa)
                + f32::from(luts[ty1 * tiles + tx2][v]) * xa;
            let bottom = f32::from(luts[ty2 * tiles + tx1][v]) * (1.0 - xa)
                + f32::from(luts[ty2 * tiles + tx2][v]) * xa;
            let mapped = top * (1.0 - ya) + bottom * ya;
            out.put_pixel(x as u32, y as u32, Luma([saturate_u8(mapped)]));
        }
    }

    out
}

/// Tile dimensions. A padded axis grows by `grid - side % grid`, which is a
/// whole extra `grid` pixels on an axis that was already divisible.
fn tile_size(width: u32, height: u32, grid: u32) -> (usize, usize) {
    if width % grid == 0 && height % grid == 0 {
        ((width / grid) as usize, (height / grid) as usize)
    } else {
        let padded_w = width + grid - width % grid;
        let padded_h = height + grid - height % grid;
        ((padded_w / grid) as usize, (padded_h / grid) as usize)
    }
}

/// Round half to even and clamp into `u8`.
fn saturate_u8(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Cap every bin at `clip` and redistribute the excess: an even share to
/// every bin, then the remainder one count at a time across evenly spaced bins.
fn clip_histogram(hist: &mut [u32; BINS], clip: u32) {
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    let batch = excess / BINS as u32;
    let mut residual = excess - batch * BINS as u32;
    for bin in hist.iter_mut() {
        *bin += batch;
    }

    if residual > 0 {
        let step = (BINS / residual as usize).max(1);
        let mut i = 0;
        while i < BINS && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

/// Cumulative histogram scaled to [0, 255].
fn equalization_lut(hist: &[u32; BINS], tile_area: usize) -> [u8; BINS] {
    let scale = 255.0 / tile_area as f32;
    let mut lut = [0u8; BINS];
    let mut sum = 0u32;
    for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
        sum += count;
        *entry = saturate_u8(sum as f32 * scale);
    }
    lut
}

/// Neighbouring tile indices and the weight of the second one for a pixel
/// coordinate. Tile centres sit at half-tile offsets; outside the outermost
/// centres both indices clamp to the border tile.
fn interpolation_taps(pos: usize, inv_tile: f32, tiles: usize) -> (usize, usize, f32) {
    let f = pos as f32 * inv_tile - 0.5;
    let lower = f.floor();
    let weight = f - lower;
    let first = (lower as i64).max(0) as usize;
    let second = ((lower as i64 + 1).max(0) as usize).min(tiles - 1);
    (first.min(tiles - 1), second, weight)
}

/// Mirror an index into `[0, len)` without repeating the edge pixel
/// (`dcb|abcd|cba`).
fn reflect_101(i: usize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let m = i % period;
    if m < len { m } else { period - m }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_101_mirrors_without_edge_repeat() {
        assert_eq!(reflect_101(3, 4), 3);
        assert_eq!(reflect_101(4, 4), 2);
        assert_eq!(reflect_101(5, 4), 1);
        assert_eq!(reflect_101(6, 4), 0);
        assert_eq!(reflect_101(7, 4), 1);
        assert_eq!(reflect_101(9, 1), 0);
    }

    #[test]
    fn both_axes_pad_when_either_is_ragged() {
        assert_eq!(tile_size(160, 96, 8), (20, 12));
        assert_eq!(tile_size(160, 90, 8), (21, 12));
        assert_eq!(tile_size(100, 90, 8), (13, 12));
        assert_eq!(tile_size(1, 1, 8), (1, 1));
    }

    #[test]
    fn divisible_axis_of_ragged_image_matches_padded_run() {
        // 160 is a multiple of 8 but 90 is not, so the image is processed as
        // if mirror-padded to 168x96.
        let (w, h) = (160u32, 90u32);
        let src = GrayImage::from_fn(w, h, |x, y| Luma([((x * 37 + y * 11 + x * y) % 256) as u8]));
        let padded = GrayImage::from_fn(168, 96, |x, y| {
            *src.get_pixel(
                reflect_101(x as usize, w as usize) as u32,
                reflect_101(y as usize, h as usize) as u32,
            )
        });

        let direct = clahe(&src, 2.0, 8);
        let reference = clahe(&padded, 2.0, 8);
        let differing = direct
            .enumerate_pixels()
            .filter(|&(x, y, p)| p != reference.get_pixel(x, y))
            .count();
        assert_eq!(differing, 0);
    }

    #[test]
    fn lut_rounds_half_to_even() {
        // 255 / 510 is exactly 0.5 for the first bin.
        let mut hist = [0u32; BINS];
        hist[0] = 1;
        hist[255] = 509;
        let lut = equalization_lut(&hist, 510);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        assert_eq!(saturate_u8(2.5), 2);
        assert_eq!(saturate_u8(3.5), 4);
        assert_eq!(saturate_u8(300.0), 255);
    }

    #[test]
    fn clipping_preserves_total_count() {
        let mut hist = [0u32; BINS];
        hist[10] = 1000;
        hist[200] = 24;
        clip_histogram(&mut hist, 8);
        assert_eq!(hist.iter().sum::<u32>(), 1024);
        assert!(hist[10] <= 8 + 1000 / 256 + 1);
    }

    #[test]
    fn lut_is_monotonic_and_ends_at_white() {
        let mut hist = [4u32; BINS];
        clip_histogram(&mut hist, 8);
        let lut = equalization_lut(&hist, 1024);
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(lut[255], 255);
    }

    #[test]
    fn output_keeps_dimensions_for_odd_sizes() {
        for (w, h) in [(1, 1), (3, 5), (17, 9), (64, 64)] {
            let src = GrayImage::from_fn(w, h, |x, y| Luma([((x * 31 + y * 17) % 256) as u8]));
            let out = clahe(&src, 2.0, 8);
            assert_eq!(out.dimensions(), (w, h));
        }
    }

    #[test]
    fn uniform_image_stays_uniform() {
        let src = GrayImage::from_pixel(256, 256, Luma([90]));
        let out = clahe(&src, 2.0, 8);
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
        // Clipping keeps a flat region close to its original level.
        assert!((i32::from(first) - 90).abs() <= 4, "mapped to {first}");
    }

    #[test]
    fn faint_stroke_stays_darker_than_background() {
        // Faint stroke: 120 on 135 background.
        let mut src = GrayImage::from_pixel(64, 64, Luma([135]));
        for y in 20..44 {
            for x in 30..34 {
                src.put_pixel(x, y, Luma([120]));
            }
        }
        let out = clahe(&src, 2.0, 8);
        let stroke = i32::from(out.get_pixel(31, 30).0[0]);
        let background = i32::from(out.get_pixel(5, 5).0[0]);
        assert!(stroke < background, "stroke {stroke}, background {background}");
    }
}
