//! Image loading and feature extraction for the image engine.
//!
//! Images are referenced by a string (`upload://<uuid>` for user files, a
//! relative path for bundled samples), decoded with `image`, downsampled to a
//! small square and summarized into an L2-normalized [`FeatureVector`].

mod cache;
mod error;
mod features;
mod manifest;
mod source;

pub use cache::FeatureCache;
pub use error::ImageError;
pub use features::{
    FeatureLayout, FeatureVector, extract_features, features_from_image, normalize_l2_in_place,
};
pub use manifest::{DEFAULT_SAMPLE_FILE, MANIFEST_FILE, SAMPLE_DIR, SampleEntry, SampleManifest};
pub use source::{DirectorySource, ImageSource, RoutedSource, UPLOAD_SCHEME, UploadStore};
