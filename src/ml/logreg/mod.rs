//! Two-feature logistic regression trained by batch gradient descent.

use rand::Rng;
use serde::{Deserialize, Serialize};

mod train;
pub use train::{LOSS_EPSILON, TrainingMetrics, evaluate, step};

/// Half-width of the symmetric range used for fresh weights.
pub const INIT_WEIGHT_RANGE: f64 = 0.1;

/// Linear decision function `w1*x + w2*y + bias` squashed through a sigmoid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearModel {
    pub w1: f64,
    pub w2: f64,
    pub bias: f64,
}

impl LinearModel {
    pub fn new(w1: f64, w2: f64, bias: f64) -> Self {
        Self { w1, w2, bias }
    }

    /// Small random weights in `±INIT_WEIGHT_RANGE` with a zero bias.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            w1: rng.random_range(-INIT_WEIGHT_RANGE..INIT_WEIGHT_RANGE),
            w2: rng.random_range(-INIT_WEIGHT_RANGE..INIT_WEIGHT_RANGE),
            bias: 0.0,
        }
    }

    pub fn logit(&self, x: f64, y: f64) -> f64 {
        self.w1 * x + self.w2 * y + self.bias
    }

    /// Class-1 probability for a point.
    pub fn probability(&self, x: f64, y: f64) -> f64 {
        sigmoid(self.logit(x, y))
    }

    pub fn is_finite(&self) -> bool {
        self.w1.is_finite() && self.w2.is_finite() && self.bias.is_finite()
    }
}

/// `1 / (1 + e^-z)`, evaluated without overflowing for large `|z|`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
