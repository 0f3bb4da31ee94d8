//! Evaluation metrics for the binary classifiers.

use serde::{Deserialize, Serialize};

use crate::dataset::Label;

/// Row-major `2x2` counts indexed by `truth * 2 + predicted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [u32; 4],
}

/// Precision/recall statistics for a single class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f32,
    /// `TP / (TP + FN)`.
    pub recall: f32,
    /// Total number of true examples for the class.
    pub support: u32,
}

impl ConfusionMatrix {
    pub fn add(&mut self, truth: Label, predicted: Label) {
        let idx = truth.index() * 2 + predicted.index();
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: Label, predicted: Label) -> u32 {
        self.counts[truth.index() * 2 + predicted.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn correct(&self) -> u32 {
        self.get(Label::Negative, Label::Negative) + self.get(Label::Positive, Label::Positive)
    }

    /// Fraction of correct predictions, zero when empty.
    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.correct() as f32 / total as f32
        }
    }

    /// Accuracy as a whole percentage.
    pub fn accuracy_percent(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        (100.0 * self.correct() as f64 / total as f64).round() as u8
    }

    pub fn class_stats(&self, class: Label) -> ClassStats {
        let other = match class {
            Label::Negative => Label::Positive,
            Label::Positive => Label::Negative,
        };
        let tp = self.get(class, class) as f32;
        let fn_ = self.get(class, other) as f32;
        let fp = self.get(other, class) as f32;
        ClassStats {
            precision: if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) },
            recall: if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) },
            support: self.get(class, class) + self.get(class, other),
        }
    }
}
