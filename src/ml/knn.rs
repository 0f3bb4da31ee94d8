//! Distance-weighted k-nearest-neighbor voting over feature vectors.

use serde::{Deserialize, Serialize};

pub use crate::config::KnnSettings;
use crate::dataset::Label;

/// A labeled vector borrowed from the image collection.
#[derive(Debug, Clone, Copy)]
pub struct LabeledExample<'a> {
    pub vector: &'a [f32],
    pub label: Label,
}

/// Outcome of a k-NN vote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    /// Winning class share of the total vote weight, in `[0, 1]`.
    pub confidence: f32,
}

impl Verdict {
    /// Returned when there is nothing to vote with.
    pub const UNDECIDED: Verdict = Verdict {
        label: Label::Negative,
        confidence: 0.0,
    };
}

/// Neighborhood size for `labeled` examples: `round(sqrt(n))` forced odd,
/// clamped to `[min_k, max_k]`, never more than `labeled`.
pub fn choose_k(labeled: usize, settings: &KnnSettings) -> usize {
    if labeled == 0 {
        return 0;
    }
    let mut k = (labeled as f64).sqrt().round() as usize;
    if k % 2 == 0 {
        k += 1;
    }
    let min_k = settings.min_k.max(1);
    let max_k = settings.max_k.max(min_k);
    let mut k = k.clamp(min_k, max_k);
    if k % 2 == 0 {
        k = if k < max_k { k + 1 } else { k - 1 };
    }
    k.min(labeled)
}

/// Classify `target` by an inverse-distance weighted vote of its nearest labeled examples.
///
/// Equal class weights resolve to [`Label::Negative`]. Examples whose length
/// differs from `target` are ignored.
pub fn classify(target: &[f32], labeled: &[LabeledExample<'_>], settings: &KnnSettings) -> Verdict {
    let mut neighbors: Vec<(f32, Label)> = labeled
        .iter()
        .filter(|example| example.vector.len() == target.len())
        .map(|example| (euclidean_distance(target, example.vector), example.label))
        .filter(|(distance, _)| distance.is_finite())
        .collect();
    if neighbors.is_empty() {
        return Verdict::UNDECIDED;
    }
    neighbors.sort_by(|a, b| a.0.total_cmp(&b.0));
    let k = choose_k(neighbors.len(), settings);
    let epsilon = settings.distance_epsilon.max(f32::MIN_POSITIVE);

    let mut weights = [0.0_f64; 2];
    for &(distance, label) in neighbors.iter().take(k) {
        weights[label.index()] += 1.0 / (epsilon as f64 + distance as f64);
    }
    let total = weights[0] + weights[1];
    if !total.is_finite() || total <= 0.0 {
        return Verdict::UNDECIDED;
    }
    let label = if weights[1] > weights[0] {
        Label::Positive
    } else {
        Label::Negative
    };
    Verdict {
        label,
        confidence: (weights[label.index()] / total).clamp(0.0, 1.0) as f32,
    }
}

/// Euclidean distance between equally sized vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
