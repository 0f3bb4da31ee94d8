//! Library exports for the classifier workbench, reused by the driver,
//! benchmarks and integration tests.
/// Application directory resolution.
pub mod app_dirs;
/// TOML settings with documented defaults.
pub mod config;
/// Labeled 2D datasets: built-ins, CSV import and draw-mode points.
pub mod dataset;
/// Numeric and image engine state.
pub mod engine;
/// Tracing subscriber and log file setup.
pub mod logging;
/// Logistic regression, k-NN and evaluation metrics.
pub mod ml;
/// Heatmap, point and decision boundary rendering.
pub mod render;
/// Frame scheduling and the cancellable training loop.
pub mod training;
/// Image loading, feature extraction and the feature cache.
pub mod vision;
/// Workbench controller.
pub mod workbench;
