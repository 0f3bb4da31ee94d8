//! Lab settings persisted as TOML under the app root directory.
//!
//! Every section falls back to documented defaults so a missing or partial
//! `config.toml` still yields a usable workbench.

mod defaults;
mod errors;
mod io;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use defaults::*;

pub use errors::ConfigError;
pub use io::{config_path, load_or_default, load_settings_from, save_settings, save_settings_to_path};

/// Default filename used to store the lab settings.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Aggregate settings for the workbench.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabSettings {
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub accessibility: AccessibilitySettings,
    #[serde(default)]
    pub knn: KnnSettings,
    #[serde(default)]
    pub features: FeatureSettings,
    #[serde(default)]
    pub render: RenderSettings,
}

impl LabSettings {
    /// Clamp every section into its valid range.
    pub fn normalized(mut self) -> Self {
        self.training = self.training.normalized();
        self.knn = self.knn.normalized();
        self.features = self.features.normalized();
        self.render = self.render.normalized();
        self
    }
}

/// Gradient descent and frame pacing for the numeric engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    /// Initial learning rate; the UI may change it at any time.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_min_steps_per_frame")]
    pub min_steps_per_frame: u32,
    #[serde(default = "default_max_steps_per_frame")]
    pub max_steps_per_frame: u32,
    /// Point evaluations a single frame may spend before the step count is reduced.
    #[serde(default = "default_frame_point_budget")]
    pub frame_point_budget: u32,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Fixed RNG seed for resets and built-in datasets (entropy when absent).
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            min_steps_per_frame: default_min_steps_per_frame(),
            max_steps_per_frame: default_max_steps_per_frame(),
            frame_point_budget: default_frame_point_budget(),
            frame_interval_ms: default_frame_interval_ms(),
            seed: None,
        }
    }
}

impl TrainingSettings {
    fn normalized(mut self) -> Self {
        self.learning_rate = clamp_learning_rate(self.learning_rate);
        self.min_steps_per_frame = self
            .min_steps_per_frame
            .clamp(MIN_STEPS_PER_FRAME_FLOOR, MAX_STEPS_PER_FRAME_CEILING);
        self.max_steps_per_frame = self
            .max_steps_per_frame
            .clamp(self.min_steps_per_frame, MAX_STEPS_PER_FRAME_CEILING);
        self.frame_point_budget = self.frame_point_budget.max(1);
        self.frame_interval_ms = self.frame_interval_ms.max(1);
        self
    }
}

/// Accessibility flags that change training cadence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessibilitySettings {
    /// Slow the animation and keep per-frame work minimal.
    #[serde(default = "default_false")]
    pub reduced_motion: bool,
}

/// Frame pacing derived from training and accessibility settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub frame_interval: Duration,
    pub min_steps: u32,
    pub max_steps: u32,
    pub point_budget: u32,
}

impl Cadence {
    /// Resolve pacing; reduced motion quadruples the interval and pins steps to the minimum.
    pub fn resolve(training: &TrainingSettings, accessibility: &AccessibilitySettings) -> Self {
        let interval_ms = training.frame_interval_ms.max(1);
        if accessibility.reduced_motion {
            Self {
                frame_interval: Duration::from_millis(interval_ms * 4),
                min_steps: training.min_steps_per_frame,
                max_steps: training.min_steps_per_frame,
                point_budget: training.frame_point_budget,
            }
        } else {
            Self {
                frame_interval: Duration::from_millis(interval_ms),
                min_steps: training.min_steps_per_frame,
                max_steps: training.max_steps_per_frame,
                point_budget: training.frame_point_budget,
            }
        }
    }

    /// Steps to run in one frame, scaled inversely with dataset size.
    pub fn steps_per_frame(&self, dataset_len: usize) -> u32 {
        let min = self.min_steps.max(1);
        let max = self.max_steps.max(min);
        if dataset_len == 0 {
            return min;
        }
        let affordable = (self.point_budget as usize / dataset_len).min(u32::MAX as usize) as u32;
        affordable.clamp(min, max)
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::resolve(&TrainingSettings::default(), &AccessibilitySettings::default())
    }
}

/// Neighborhood sizing and weighting for the image classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnSettings {
    #[serde(default = "default_min_k")]
    pub min_k: usize,
    #[serde(default = "default_max_k")]
    pub max_k: usize,
    /// Added to every distance before inverting it into a vote weight.
    #[serde(default = "default_distance_epsilon")]
    pub distance_epsilon: f32,
    /// Labeled images required before a held-out estimate is attempted.
    #[serde(default = "default_min_labeled_for_accuracy")]
    pub min_labeled_for_accuracy: usize,
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f32,
}

impl Default for KnnSettings {
    fn default() -> Self {
        Self {
            min_k: default_min_k(),
            max_k: default_max_k(),
            distance_epsilon: default_distance_epsilon(),
            min_labeled_for_accuracy: default_min_labeled_for_accuracy(),
            holdout_fraction: default_holdout_fraction(),
        }
    }
}

impl KnnSettings {
    fn normalized(mut self) -> Self {
        self.min_k = round_up_odd(self.min_k.max(1));
        self.max_k = round_up_odd(self.max_k.max(self.min_k));
        if !self.distance_epsilon.is_finite() || self.distance_epsilon <= 0.0 {
            self.distance_epsilon = default_distance_epsilon();
        }
        self.min_labeled_for_accuracy = self.min_labeled_for_accuracy.max(2);
        if !self.holdout_fraction.is_finite() {
            self.holdout_fraction = default_holdout_fraction();
        }
        self.holdout_fraction = self.holdout_fraction.clamp(0.05, 0.5);
        self
    }
}

fn round_up_odd(value: usize) -> usize {
    if value % 2 == 0 {
        value + 1
    } else {
        value
    }
}

/// Rasterization parameters for image feature extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSettings {
    /// Images are downsampled to a `raster_size` square before extraction.
    #[serde(default = "default_raster_size")]
    pub raster_size: u32,
    /// Bins per color channel histogram.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: u32,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            raster_size: default_raster_size(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

impl FeatureSettings {
    fn normalized(mut self) -> Self {
        self.raster_size = self.raster_size.clamp(MIN_RASTER_SIZE, MAX_RASTER_SIZE);
        self.histogram_bins = self.histogram_bins.clamp(1, 64);
        self
    }
}

/// Canvas parameters for the decision boundary view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "default_canvas_size")]
    pub width: u32,
    #[serde(default = "default_canvas_size")]
    pub height: u32,
    /// Heatmap cells per axis.
    #[serde(default = "default_grid_resolution")]
    pub grid_resolution: u32,
    #[serde(default = "default_overlay_opacity")]
    pub overlay_opacity: f32,
    #[serde(default = "default_point_radius")]
    pub point_radius: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: default_canvas_size(),
            height: default_canvas_size(),
            grid_resolution: default_grid_resolution(),
            overlay_opacity: default_overlay_opacity(),
            point_radius: default_point_radius(),
        }
    }
}

impl RenderSettings {
    fn normalized(mut self) -> Self {
        self.width = self.width.max(1);
        self.height = self.height.max(1);
        self.grid_resolution = self.grid_resolution.clamp(1, 256);
        self.overlay_opacity = clamp_overlay_opacity(self.overlay_opacity);
        if !self.point_radius.is_finite() || self.point_radius < 0.0 {
            self.point_radius = default_point_radius();
        }
        self
    }
}

/// Clamp a user-supplied learning rate into the supported range.
pub fn sanitize_learning_rate(value: f64) -> f64 {
    clamp_learning_rate(value)
}

/// Clamp a user-supplied overlay opacity into `[0, 0.6]`.
pub fn sanitize_overlay_opacity(value: f32) -> f32 {
    clamp_overlay_opacity(value)
}
