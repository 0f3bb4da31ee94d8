//! Workbench controller tying both engines, the training loop and the
//! boundary view together.
//!
//! The controller is the only place that starts, pauses or resets training.
//! Dataset and mode switches pause first so no frame from the previous run
//! applies to the new state.

mod snapshot;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use egui::ColorImage;
use rand::{SeedableRng, rngs::StdRng};

use crate::config::{Cadence, LabSettings, sanitize_overlay_opacity};
use crate::dataset::{self, DatasetKind, ImportOutcome, Label, LabeledPoint};
use crate::engine::{ClassifySummary, HoldoutReport, ImageEngine, NumericEngine};
use crate::render::{BoundaryRenderer, ExportError, save_png};
use crate::training::{FrameScheduler, TrainingLoop, TrainingState, lock_engine};
use crate::vision::{FeatureLayout, ImageSource, RoutedSource, SampleManifest, UploadStore};

pub use snapshot::{
    ModelSnapshot, SNAPSHOT_FILE_NAME, SnapshotError, default_snapshot_path, read_snapshot,
    write_snapshot,
};

/// Which engine the learner is working with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Numeric,
    Image,
}

/// Receives the completion score once per session.
pub type CompletionCallback = Box<dyn FnOnce(u8) + Send + 'static>;

pub struct Workbench {
    settings: LabSettings,
    mode: Mode,
    training: TrainingLoop,
    images: ImageEngine,
    uploads: Arc<UploadStore>,
    renderer: BoundaryRenderer,
    overlay_opacity: f32,
    rng: StdRng,
    on_complete: Option<CompletionCallback>,
    completion: Option<u8>,
}

impl Workbench {
    /// Build a workbench in numeric mode on the ocean dataset.
    ///
    /// `samples` resolves bundled sample references; uploads are kept in
    /// memory and routed by their `upload://` scheme.
    pub fn new(
        settings: LabSettings,
        scheduler: Arc<dyn FrameScheduler>,
        samples: impl ImageSource + 'static,
    ) -> Self {
        let settings = settings.normalized();
        let mut rng = match settings.training.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let engine = NumericEngine::with_rng(
            StdRng::from_rng(&mut rng),
            settings.training.learning_rate,
        );
        let cadence = Cadence::resolve(&settings.training, &settings.accessibility);
        let training = TrainingLoop::new(Arc::new(Mutex::new(engine)), scheduler, cadence);
        let uploads = Arc::new(UploadStore::new());
        let source = Arc::new(RoutedSource::new(uploads.clone(), samples));
        let images = ImageEngine::new(
            source,
            FeatureLayout::from_settings(&settings.features),
            settings.knn.clone(),
        );
        let renderer = BoundaryRenderer::new(&settings.render);
        let overlay_opacity = settings.render.overlay_opacity;
        Self {
            settings,
            mode: Mode::Numeric,
            training,
            images,
            uploads,
            renderer,
            overlay_opacity,
            rng,
            on_complete: None,
            completion: None,
        }
    }

    pub fn settings(&self) -> &LabSettings {
        &self.settings
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch engines; training stops on any actual switch.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.training.pause();
        tracing::info!("Workbench mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    /// Lock the numeric engine for reading or direct edits.
    pub fn engine(&self) -> MutexGuard<'_, NumericEngine> {
        lock_engine(self.training.engine())
    }

    pub fn images(&self) -> &ImageEngine {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageEngine {
        &mut self.images
    }

    pub fn renderer(&self) -> &BoundaryRenderer {
        &self.renderer
    }

    pub fn learning_rate(&self) -> f64 {
        self.engine().learning_rate()
    }

    /// Takes effect on the next training step, even mid-run.
    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.engine().set_learning_rate(learning_rate);
    }

    pub fn overlay_opacity(&self) -> f32 {
        self.overlay_opacity
    }

    pub fn set_overlay_opacity(&mut self, opacity: f32) {
        self.overlay_opacity = sanitize_overlay_opacity(opacity);
    }

    pub fn reduced_motion(&self) -> bool {
        self.settings.accessibility.reduced_motion
    }

    /// Slow the training animation down; a running loop picks up the new pacing at once.
    pub fn set_reduced_motion(&mut self, enabled: bool) {
        self.settings.accessibility.reduced_motion = enabled;
        let cadence = Cadence::resolve(&self.settings.training, &self.settings.accessibility);
        self.training.set_cadence(cadence);
    }

    pub fn set_draw_label(&mut self, label: Label) {
        self.engine().set_draw_label(label);
    }

    /// Swap in a fresh dataset of `kind`; stops training and resets the model.
    pub fn set_dataset_kind(&mut self, kind: DatasetKind) {
        self.training.pause();
        self.engine().switch_dataset(kind);
    }

    /// Replace the dataset from CSV text. Training stops only when rows were accepted.
    pub fn import_csv(&mut self, text: &str) -> ImportOutcome {
        let outcome = dataset::import_csv(text);
        match &outcome {
            ImportOutcome::Imported { points, skipped } => {
                self.training.pause();
                tracing::info!(
                    "Imported {} CSV points ({} rows skipped)",
                    points.len(),
                    skipped
                );
                self.engine().load_points(DatasetKind::Csv, points.clone());
            }
            ImportOutcome::Empty { skipped } => {
                tracing::warn!("CSV import produced no points ({skipped} rows skipped)");
            }
        }
        outcome
    }

    /// Add a draw-mode point from a click on the rendered canvas.
    pub fn click_canvas(&mut self, px: f32, py: f32) -> Option<LabeledPoint> {
        let (width, height) = self.renderer.dimensions();
        self.engine().add_point_at_pixel(px, py, width, height)
    }

    pub fn training_state(&self) -> TrainingState {
        self.training.state()
    }

    pub fn start_training(&mut self) -> bool {
        if self.mode != Mode::Numeric {
            return false;
        }
        let started = self.training.start();
        if started {
            tracing::info!("Training started at epoch {}", self.engine().epoch());
        }
        started
    }

    pub fn pause_training(&mut self) -> bool {
        let paused = self.training.pause();
        if paused {
            tracing::info!("Training paused at epoch {}", self.engine().epoch());
        }
        paused
    }

    pub fn toggle_training(&mut self) -> TrainingState {
        if self.training.is_running() {
            self.pause_training();
        } else {
            self.start_training();
        }
        self.training.state()
    }

    /// Stop training and draw fresh weights.
    pub fn reset_model(&mut self) {
        self.training.pause();
        self.engine().reset_model();
        tracing::info!("Model reset");
    }

    /// Paint the boundary view for the current model and dataset.
    pub fn render(&self) -> ColorImage {
        let engine = self.engine();
        self.renderer
            .render(&engine.model(), engine.dataset(), self.overlay_opacity)
    }

    pub fn export_png(&self, path: &Path) -> Result<(), ExportError> {
        save_png(&self.render(), path)
    }

    /// Store an uploaded file in memory and add it to the collection.
    pub fn add_upload(&mut self, bytes: Vec<u8>) -> String {
        let url = self.uploads.insert(bytes);
        self.images.add_image(url)
    }

    /// Remove an image, releasing its upload handle when nothing else uses it.
    pub fn remove_image(&mut self, id: &str) -> bool {
        let Some(removed) = self.images.remove_image(id) else {
            return false;
        };
        let shared = self.images.images().iter().any(|image| image.url == removed.url);
        if !shared {
            self.uploads.release(&removed.url);
        }
        true
    }

    pub fn load_samples(&mut self, manifest: &SampleManifest) -> Vec<String> {
        let ids = self.images.add_samples(manifest);
        tracing::info!("Loaded {} sample images", ids.len());
        ids
    }

    pub fn set_image_label(&mut self, id: &str, label: Option<Label>) -> bool {
        self.images.set_label(id, label)
    }

    pub fn classify_images(&mut self) -> ClassifySummary {
        self.images.classify_all()
    }

    pub fn estimate_accuracy_report(&mut self) -> HoldoutReport {
        self.images.estimate_accuracy_report(&mut self.rng)
    }

    /// Score for the active mode: live training accuracy in numeric mode,
    /// held-out k-NN accuracy in image mode.
    pub fn current_score(&mut self) -> u8 {
        match self.mode {
            Mode::Numeric => self.engine().accuracy_percent(),
            Mode::Image => self.images.estimate_accuracy(&mut self.rng),
        }
    }

    /// Register the completion callback; it fires at most once.
    pub fn on_complete(&mut self, callback: impl FnOnce(u8) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Finish the session and report the score.
    ///
    /// Returns the score on the first call and `None` afterwards.
    pub fn complete(&mut self) -> Option<u8> {
        if self.completion.is_some() {
            return None;
        }
        self.training.pause();
        let score = self.current_score();
        self.completion = Some(score);
        tracing::info!("Session complete in {:?} mode with score {score}", self.mode);
        if let Some(callback) = self.on_complete.take() {
            callback(score);
        }
        Some(score)
    }

    pub fn completion(&self) -> Option<u8> {
        self.completion
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        let engine = self.engine();
        ModelSnapshot {
            model: engine.model(),
            epoch: engine.epoch(),
            dataset_kind: engine.kind(),
        }
    }

    /// Persist the current model; training keeps running.
    pub fn save_model(&self, path: &Path) -> Result<ModelSnapshot, SnapshotError> {
        let snapshot = self.snapshot();
        write_snapshot(&snapshot, path)?;
        tracing::info!(
            "Saved model at epoch {} to {}",
            snapshot.epoch,
            path.display()
        );
        Ok(snapshot)
    }

    /// Pause training and replace the model with a saved one.
    ///
    /// The current dataset is kept; a snapshot from another dataset kind is
    /// loaded as-is and logged.
    pub fn load_model(&mut self, path: &Path) -> Result<ModelSnapshot, SnapshotError> {
        let snapshot = read_snapshot(path)?;
        self.training.pause();
        let mut engine = self.engine();
        if snapshot.dataset_kind != engine.kind() {
            tracing::info!(
                "Loaded model was trained on {} while {} is active",
                snapshot.dataset_kind.as_str(),
                engine.kind().as_str()
            );
        }
        if !engine.restore(snapshot.model, snapshot.epoch) {
            return Err(SnapshotError::NonFinite {
                path: path.to_path_buf(),
            });
        }
        Ok(snapshot)
    }
}
