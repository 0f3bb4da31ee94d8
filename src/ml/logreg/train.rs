use serde::{Deserialize, Serialize};

use super::LinearModel;
use crate::dataset::{Label, LabeledPoint};

/// Added inside both logarithms of the cross-entropy loss.
pub const LOSS_EPSILON: f64 = 1e-8;

/// Loss and accuracy of a model over the full dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub epoch: u64,
    pub loss: f64,
    pub accuracy: f64,
}

/// One batch gradient descent update over the whole dataset.
///
/// The returned metrics describe the model the gradient was computed from,
/// with `epoch` left at zero for the caller to fill in. An empty dataset
/// returns the model unchanged with zero loss and accuracy.
pub fn step(
    dataset: &[LabeledPoint],
    model: &LinearModel,
    learning_rate: f64,
) -> (LinearModel, TrainingMetrics) {
    if dataset.is_empty() {
        return (*model, TrainingMetrics::default());
    }
    let mut loss = 0.0;
    let mut correct = 0usize;
    let (mut grad_w1, mut grad_w2, mut grad_b) = (0.0, 0.0, 0.0);
    for point in dataset {
        let p = model.probability(point.x, point.y);
        let target = point.label.target();
        loss -= target * (p + LOSS_EPSILON).ln() + (1.0 - target) * (1.0 - p + LOSS_EPSILON).ln();
        if Label::from_probability(p) == point.label {
            correct += 1;
        }
        let diff = p - target;
        grad_w1 += diff * point.x;
        grad_w2 += diff * point.y;
        grad_b += diff;
    }
    let n = dataset.len() as f64;
    let updated = LinearModel {
        w1: model.w1 - learning_rate * grad_w1 / n,
        w2: model.w2 - learning_rate * grad_w2 / n,
        bias: model.bias - learning_rate * grad_b / n,
    };
    let metrics = TrainingMetrics {
        epoch: 0,
        loss: (loss / n).max(0.0),
        accuracy: correct as f64 / n,
    };
    if updated.is_finite() {
        (updated, metrics)
    } else {
        tracing::warn!("Gradient step produced a non-finite model; keeping previous weights");
        (*model, metrics)
    }
}

/// Loss and accuracy of `model` without updating it.
pub fn evaluate(dataset: &[LabeledPoint], model: &LinearModel) -> TrainingMetrics {
    let (_, metrics) = step(dataset, model, 0.0);
    metrics
}
