use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::Label;

/// Directory, relative to the asset root, holding bundled sample images.
pub const SAMPLE_DIR: &str = "samples";
/// Manifest file inside [`SAMPLE_DIR`].
pub const MANIFEST_FILE: &str = "manifest.json";
/// Sample used when the manifest is missing or unreadable.
pub const DEFAULT_SAMPLE_FILE: &str = "default.png";

/// List of bundled sample images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleManifest {
    pub samples: Vec<SampleEntry>,
}

/// One sample image, optionally pre-labeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleEntry {
    /// Path relative to the sample directory.
    pub file: String,
    #[serde(default)]
    pub label: Option<Label>,
}

impl SampleManifest {
    /// Single-entry manifest pointing at the default sample.
    pub fn fallback() -> Self {
        Self {
            samples: vec![SampleEntry {
                file: DEFAULT_SAMPLE_FILE.to_string(),
                label: None,
            }],
        }
    }

    /// Load `manifest.json` from `sample_dir`, falling back to the default sample.
    pub fn load_or_fallback(sample_dir: &Path) -> Self {
        let path = sample_dir.join(MANIFEST_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(
                    "Sample manifest {} unavailable ({err}); using default sample",
                    path.display()
                );
                return Self::fallback();
            }
        };
        match serde_json::from_str::<SampleManifest>(&text) {
            Ok(manifest) if !manifest.samples.is_empty() => manifest,
            Ok(_) => {
                tracing::warn!("Sample manifest {} is empty; using default sample", path.display());
                Self::fallback()
            }
            Err(err) => {
                tracing::warn!(
                    "Sample manifest {} is invalid ({err}); using default sample",
                    path.display()
                );
                Self::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_manifest_falls_back_to_default_sample() {
        let dir = tempdir().unwrap();
        let manifest = SampleManifest::load_or_fallback(dir.path());
        assert_eq!(manifest, SampleManifest::fallback());
        assert_eq!(manifest.samples[0].file, DEFAULT_SAMPLE_FILE);
    }

    #[test]
    fn manifest_entries_keep_order_and_labels() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"samples":[{"file":"cat.png","label":"positive"},{"file":"dog.png"}]}"#,
        )
        .unwrap();
        let manifest = SampleManifest::load_or_fallback(dir.path());
        assert_eq!(manifest.samples.len(), 2);
        assert_eq!(manifest.samples[0].file, "cat.png");
        assert_eq!(manifest.samples[0].label, Some(Label::Positive));
        assert_eq!(manifest.samples[1].label, None);
    }

    #[test]
    fn invalid_or_empty_manifest_falls_back() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "{not json").unwrap();
        assert_eq!(
            SampleManifest::load_or_fallback(dir.path()),
            SampleManifest::fallback()
        );
        std::fs::write(dir.path().join(MANIFEST_FILE), r#"{"samples":[]}"#).unwrap();
        assert_eq!(
            SampleManifest::load_or_fallback(dir.path()),
            SampleManifest::fallback()
        );
    }
}
