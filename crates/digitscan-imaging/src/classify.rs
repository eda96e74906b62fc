// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Classifier seam. The trained model is an opaque collaborator: tensor in,
// probability vector out.

use digitscan_core::error::Result;
use digitscan_core::types::{NormalizedTensor, Prediction};
use tracing::{debug, instrument};

/// A digit classifier.
///
/// Implementations may wrap an inference session that is not thread-safe;
/// nothing here requires `Send` or `Sync`.
pub trait Classifier {
    /// One probability per class, indexed by class label.
    fn predict(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>>;
}

impl<F> Classifier for F
where
    F: Fn(&NormalizedTensor) -> Result<Vec<f32>>,
{
    fn predict(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>> {
        self(tensor)
    }
}

/// Run `classifier` on `tensor` and pick the most likely label.
#[instrument(skip_all, fields(shape = ?tensor.shape()))]
pub fn predict<C: Classifier + ?Sized>(
    classifier: &C,
    tensor: &NormalizedTensor,
) -> Result<Prediction> {
    let prediction = Prediction::from_probabilities(classifier.predict(tensor)?)?;
    debug!(label = prediction.label, score = %prediction.score, "Prediction made");
    Ok(prediction)
}
