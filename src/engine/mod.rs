//! Stateful engines behind the two workbench modes.
//!
//! [`NumericEngine`] owns the 2D dataset and the logistic regression model;
//! [`ImageEngine`] owns the image collection and its feature cache.

mod images;
mod numeric;

pub use images::{ClassifySummary, HoldoutReport, ImageEngine, ImageStatus, UserImage};
pub use numeric::NumericEngine;
