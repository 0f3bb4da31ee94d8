//! Two-dimensional labeled datasets for the numeric engine.
//!
//! Points always live in the unit square. Datasets come from the built-in
//! generators, a CSV import, or clicks on the drawing canvas.

mod builtin;
mod csv_import;

use serde::{Deserialize, Serialize};

pub use builtin::{BUILTIN_POINTS_PER_CLASS, fruit_veg, ocean};
pub use csv_import::{ImportOutcome, import_csv, is_positive_label, normalize_min_max};

/// Binary class label shared by both engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Class 0 ("class A" in the image workbench).
    Negative,
    /// Class 1 ("class B" in the image workbench).
    Positive,
}

impl Label {
    /// Numeric class index (0 or 1).
    pub fn index(self) -> usize {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }

    /// Class index as the regression target.
    pub fn target(self) -> f64 {
        self.index() as f64
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Negative),
            1 => Some(Self::Positive),
            _ => None,
        }
    }

    /// Label predicted for a class-1 probability at the 0.5 threshold.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.5 {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}

/// One training example in the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub x: f64,
    pub y: f64,
    pub label: Label,
}

impl LabeledPoint {
    /// Build a point, clamping both coordinates into `[0, 1]`.
    pub fn new(x: f64, y: f64, label: Label) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
            label,
        }
    }
}

/// Source of the active numeric dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Fish versus boats on the ocean map.
    Ocean,
    /// Fruit versus vegetables on the sweetness/crunch plane.
    FruitVeg,
    /// Points imported from a CSV file.
    Csv,
    /// Empty canvas filled by clicks.
    Draw,
}

impl DatasetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ocean => "ocean",
            Self::FruitVeg => "fruit_veg",
            Self::Csv => "csv",
            Self::Draw => "draw",
        }
    }

    /// Parse a dataset kind from user input.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ocean" => Some(Self::Ocean),
            "fruit_veg" | "fruit" | "fruitveg" => Some(Self::FruitVeg),
            "csv" => Some(Self::Csv),
            "draw" => Some(Self::Draw),
            _ => None,
        }
    }
}

/// Map a canvas pixel to data coordinates; screen-down is data-down.
///
/// Pixel `width - 1` is `x = 1`, matching the renderer. Returns `None` for a
/// degenerate canvas or a non-finite position.
pub fn canvas_to_unit(px: f32, py: f32, width: u32, height: u32) -> Option<(f64, f64)> {
    if width == 0 || height == 0 || !px.is_finite() || !py.is_finite() {
        return None;
    }
    let x = px as f64 / (width - 1).max(1) as f64;
    let y = 1.0 - py as f64 / (height - 1).max(1) as f64;
    Some((clamp_unit(x), clamp_unit(y)))
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
