// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: pipeline input, the classifier tensor, and predictions.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GrayImage};
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use crate::error::{DigitscanError, Result};

/// Source of a digit image. Resolved to a decoded image at the pipeline boundary.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Encoded image on disk (PNG, JPEG, BMP, ...).
    File(PathBuf),
    /// Encoded image already in memory, e.g. an upload body or camera capture.
    Bytes(Vec<u8>),
    /// Image decoded by the caller.
    Decoded(DynamicImage),
}

impl ImageInput {
    /// Build an input from a browser data URL (`data:image/png;base64,...`).
    ///
    /// Everything after the first comma is taken as the base64 payload. A bare
    /// payload without the `data:` header is accepted too.
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        decode_data_url(data_url).map(Self::Bytes)
    }

    /// Human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => format!("file {}", path.display()),
            Self::Bytes(bytes) => format!("{} encoded bytes", bytes.len()),
            Self::Decoded(img) => format!("decoded {}x{} image", img.width(), img.height()),
        }
    }
}

/// Decode the base64 payload of a data URL, or of a bare base64 string.
///
/// ASCII whitespace inside the payload is skipped, so line-wrapped base64
/// decodes the same as a single line.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let payload = data_url.split_once(',').map_or(data_url, |(_, rest)| rest);
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact).map_err(|err| {
        DigitscanError::InvalidInput(format!("data URL is not valid base64: {err}"))
    })
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        Self::Decoded(image)
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Upload formats accepted by the front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadFormat {
    Png,
    Jpeg,
    Bmp,
}

impl UploadFormat {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Bmp => "image/bmp",
        }
    }

    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Infer the format from the extension of an uploaded filename.
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// Classifier input: a `(1, H, W, 1)` array of intensities in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor(Array4<f32>);

impl NormalizedTensor {
    /// Scale an 8-bit bitmap into the unit range, pixel for pixel.
    pub fn from_gray(bitmap: &GrayImage) -> Self {
        let (width, height) = bitmap.dimensions();
        let array = Array4::from_shape_fn(
            (1, height as usize, width as usize, 1),
            |(_, y, x, _)| f32::from(bitmap.get_pixel(x as u32, y as u32).0[0]) / 255.0,
        );
        Self(array)
    }

    pub fn shape(&self) -> [usize; 4] {
        let s = self.0.shape();
        [s[0], s[1], s[2], s[3]]
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    /// Row-major copy of the values.
    pub fn to_vec(&self) -> Vec<f32> {
        self.0.iter().copied().collect()
    }

    /// Fraction of non-zero entries.
    pub fn foreground_fraction(&self) -> f64 {
        let total = self.0.len();
        if total == 0 {
            return 0.0;
        }
        let lit = self.0.iter().filter(|&&v| v > 0.0).count();
        lit as f64 / total as f64
    }
}

/// A classifier verdict in the form the front ends display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Arg-max class index.
    pub label: usize,
    /// Probability of `label`.
    pub confidence: f32,
    /// `confidence` as a percentage with two decimals, e.g. `"97.12%"`.
    pub score: String,
    /// Full probability vector, indexed by class.
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Pick the most likely class. Ties resolve to the lowest index.
    pub fn from_probabilities(probabilities: Vec<f32>) -> Result<Self> {
        if probabilities.is_empty() {
            return Err(DigitscanError::Classifier(
                "empty probability vector".into(),
            ));
        }
        if let Some(bad) = probabilities.iter().find(|p| !p.is_finite()) {
            return Err(DigitscanError::Classifier(format!(
                "non-finite probability {bad}"
            )));
        }

        let mut label = 0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > probabilities[label] {
                label = i;
            }
        }
        let confidence = probabilities[label];

        Ok(Self {
            label,
            confidence,
            score: format!("{:.2}%", confidence * 100.0),
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn tensor_from_gray_scales_each_pixel() {
        let mut bitmap = GrayImage::new(3, 2);
        bitmap.put_pixel(2, 1, Luma([255]));
        bitmap.put_pixel(0, 0, Luma([51]));

        let tensor = NormalizedTensor::from_gray(&bitmap);
        assert_eq!(tensor.shape(), [1, 2, 3, 1]);
        assert_eq!(tensor.as_array()[[0, 1, 2, 0]], 1.0);
        assert!((tensor.as_array()[[0, 0, 0, 0]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor.as_array()[[0, 1, 0, 0]], 0.0);
    }

    #[test]
    fn prediction_picks_argmax_and_formats_score() {
        let mut probs = vec![0.01f32; 10];
        probs[7] = 0.9712;
        let prediction = Prediction::from_probabilities(probs).expect("prediction");
        assert_eq!(prediction.label, 7);
        assert_eq!(prediction.score, "97.12%");
        assert_eq!(prediction.probabilities.len(), 10);
    }

    #[test]
    fn prediction_ties_resolve_to_lowest_index() {
        let prediction = Prediction::from_probabilities(vec![0.2, 0.4, 0.4]).expect("prediction");
        assert_eq!(prediction.label, 1);
    }

    #[test]
    fn prediction_rejects_empty_and_nan() {
        assert!(Prediction::from_probabilities(Vec::new()).is_err());
        assert!(Prediction::from_probabilities(vec![0.5, f32::NAN]).is_err());
    }

    #[test]
    fn data_url_header_is_stripped() {
        let input = ImageInput::from_data_url("data:image/png;base64,AAEC").expect("decode");
        match input {
            ImageInput::Bytes(bytes) => assert_eq!(bytes, vec![0u8, 1, 2]),
            other => panic!("unexpected input {other:?}"),
        }
    }

    #[test]
    fn wrapped_data_url_payload_decodes() {
        let wrapped = "data:image/png;base64,AAEC\r\nAwQF\n BgcI\n";
        assert_eq!(
            decode_data_url(wrapped).expect("decode"),
            vec![0u8, 1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert!(matches!(
            ImageInput::from_data_url(wrapped),
            Ok(ImageInput::Bytes(bytes)) if bytes.len() == 9
        ));
    }

    #[test]
    fn data_url_with_bad_base64_is_invalid_input() {
        let err = ImageInput::from_data_url("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(err, DigitscanError::InvalidInput(_)));
    }

    #[test]
    fn upload_whitelist_matches_case_insensitively() {
        assert_eq!(UploadFormat::from_filename("seven.PNG"), Some(UploadFormat::Png));
        assert_eq!(UploadFormat::from_filename("a.b.jpeg"), Some(UploadFormat::Jpeg));
        assert_eq!(UploadFormat::from_filename("scan.bmp"), Some(UploadFormat::Bmp));
        assert_eq!(UploadFormat::from_filename("notes.txt"), None);
        assert_eq!(UploadFormat::from_filename("noext"), None);
    }
}
