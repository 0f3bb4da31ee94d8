use rand::{SeedableRng, rngs::StdRng};

use crate::config::{TrainingSettings, sanitize_learning_rate};
use crate::dataset::{self, DatasetKind, Label, LabeledPoint};
use crate::ml::logreg::{self, LinearModel, TrainingMetrics};

/// Logistic regression state for the 2D workbench.
///
/// Every dataset replacement resets the model so weights learned on one
/// dataset never carry over to another.
pub struct NumericEngine {
    kind: DatasetKind,
    dataset: Vec<LabeledPoint>,
    model: LinearModel,
    metrics: TrainingMetrics,
    learning_rate: f64,
    draw_label: Label,
    rng: StdRng,
}

impl NumericEngine {
    /// Engine on the ocean dataset, seeded from settings or OS entropy.
    pub fn new(settings: &TrainingSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(rng, settings.learning_rate)
    }

    pub fn with_rng(mut rng: StdRng, learning_rate: f64) -> Self {
        let dataset = dataset::ocean(&mut rng);
        let model = LinearModel::random(&mut rng);
        let mut engine = Self {
            kind: DatasetKind::Ocean,
            dataset,
            model,
            metrics: TrainingMetrics::default(),
            learning_rate: sanitize_learning_rate(learning_rate),
            draw_label: Label::Positive,
            rng,
        };
        engine.refresh_metrics();
        engine
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn dataset(&self) -> &[LabeledPoint] {
        &self.dataset
    }

    pub fn model(&self) -> LinearModel {
        self.model
    }

    pub fn metrics(&self) -> TrainingMetrics {
        self.metrics
    }

    pub fn epoch(&self) -> u64 {
        self.metrics.epoch
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Change the learning rate; takes effect on the next step.
    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = sanitize_learning_rate(learning_rate);
    }

    pub fn draw_label(&self) -> Label {
        self.draw_label
    }

    pub fn set_draw_label(&mut self, label: Label) {
        self.draw_label = label;
    }

    /// Fresh random weights, zero bias and epoch 0.
    pub fn reset_model(&mut self) -> LinearModel {
        self.model = LinearModel::random(&mut self.rng);
        self.metrics.epoch = 0;
        self.refresh_metrics();
        tracing::debug!(
            "Model reset to w1={:.4} w2={:.4} bias={:.4}",
            self.model.w1,
            self.model.w2,
            self.model.bias
        );
        self.model
    }

    /// Replace the dataset with a fresh one of `kind` and reset the model.
    ///
    /// `Csv` and `Draw` start empty until rows are imported or points drawn.
    pub fn switch_dataset(&mut self, kind: DatasetKind) {
        self.dataset = match kind {
            DatasetKind::Ocean => dataset::ocean(&mut self.rng),
            DatasetKind::FruitVeg => dataset::fruit_veg(&mut self.rng),
            DatasetKind::Csv | DatasetKind::Draw => Vec::new(),
        };
        self.kind = kind;
        self.reset_model();
        tracing::info!(
            "Switched to {} dataset ({} points)",
            kind.as_str(),
            self.dataset.len()
        );
    }

    /// Replace the dataset wholesale and reset the model.
    pub fn load_points(&mut self, kind: DatasetKind, points: Vec<LabeledPoint>) {
        self.dataset = points;
        self.kind = kind;
        self.reset_model();
    }

    /// Append a point with the active draw label at unit coordinates.
    ///
    /// Only the draw canvas accepts points; other datasets return `None`.
    pub fn add_point(&mut self, x: f64, y: f64) -> Option<LabeledPoint> {
        if self.kind != DatasetKind::Draw {
            return None;
        }
        let point = LabeledPoint::new(x, y, self.draw_label);
        self.dataset.push(point);
        self.refresh_metrics();
        Some(point)
    }

    /// Append a point from a canvas click at pixel `(px, py)`.
    pub fn add_point_at_pixel(
        &mut self,
        px: f32,
        py: f32,
        width: u32,
        height: u32,
    ) -> Option<LabeledPoint> {
        let (x, y) = dataset::canvas_to_unit(px, py, width, height)?;
        self.add_point(x, y)
    }

    /// Run `steps` gradient descent epochs and advance the epoch counter.
    pub fn train_steps(&mut self, steps: u32) -> TrainingMetrics {
        if self.dataset.is_empty() {
            return self.metrics;
        }
        for _ in 0..steps {
            let (next, _) = logreg::step(&self.dataset, &self.model, self.learning_rate);
            self.model = next;
        }
        self.metrics.epoch += steps as u64;
        self.refresh_metrics();
        self.metrics
    }

    /// Restore a saved model and epoch without touching the dataset.
    pub fn restore(&mut self, model: LinearModel, epoch: u64) -> bool {
        if !model.is_finite() {
            return false;
        }
        self.model = model;
        self.metrics.epoch = epoch;
        self.refresh_metrics();
        true
    }

    /// Live training accuracy as a whole percentage.
    pub fn accuracy_percent(&self) -> u8 {
        (self.metrics.accuracy * 100.0).round().clamp(0.0, 100.0) as u8
    }

    fn refresh_metrics(&mut self) {
        let epoch = self.metrics.epoch;
        self.metrics = TrainingMetrics {
            epoch,
            ..logreg::evaluate(&self.dataset, &self.model)
        };
    }
}
