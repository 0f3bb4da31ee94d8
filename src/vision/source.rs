use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::{Arc, Mutex},
};

use super::ImageError;

/// Scheme prefix for in-memory uploads.
pub const UPLOAD_SCHEME: &str = "upload://";

/// Resolves an image reference to encoded bytes.
pub trait ImageSource: Send + Sync {
    fn load(&self, url: &str) -> Result<Vec<u8>, ImageError>;
}

/// Reads relative references from a directory (bundled samples).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference inside the root; absolute paths and `..` are rejected.
    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let relative = Path::new(url);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        safe.then(|| self.root.join(relative))
    }
}

impl ImageSource for DirectorySource {
    fn load(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let not_found = || ImageError::NotFound {
            url: url.to_string(),
        };
        let path = self.resolve(url).ok_or_else(not_found)?;
        std::fs::read(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => not_found(),
            _ => ImageError::Read {
                url: url.to_string(),
                message: err.to_string(),
            },
        })
    }
}

/// Transient in-memory handles for user-selected files.
#[derive(Debug, Default)]
pub struct UploadStore {
    files: Mutex<HashMap<String, Arc<[u8]>>>,
}

impl UploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes and return a fresh `upload://` reference.
    pub fn insert(&self, bytes: Vec<u8>) -> String {
        let url = format!("{UPLOAD_SCHEME}{}", uuid::Uuid::new_v4());
        let mut files = self.files.lock().unwrap_or_else(|err| err.into_inner());
        files.insert(url.clone(), bytes.into());
        url
    }

    /// Release a handle; returns whether it existed.
    pub fn release(&self, url: &str) -> bool {
        let mut files = self.files.lock().unwrap_or_else(|err| err.into_inner());
        files.remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageSource for UploadStore {
    fn load(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let files = self.files.lock().unwrap_or_else(|err| err.into_inner());
        files
            .get(url)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| ImageError::NotFound {
                url: url.to_string(),
            })
    }
}

/// Sends `upload://` references to the upload store and everything else to the samples.
pub struct RoutedSource {
    uploads: Arc<UploadStore>,
    samples: Box<dyn ImageSource>,
}

impl RoutedSource {
    pub fn new(uploads: Arc<UploadStore>, samples: impl ImageSource + 'static) -> Self {
        Self {
            uploads,
            samples: Box::new(samples),
        }
    }

    pub fn uploads(&self) -> &Arc<UploadStore> {
        &self.uploads
    }
}

impl ImageSource for RoutedSource {
    fn load(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        if url.starts_with(UPLOAD_SCHEME) {
            self.uploads.load(url)
        } else {
            self.samples.load(url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directory_source_reads_relative_files_only() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"bytes").unwrap();
        let source = DirectorySource::new(dir.path());
        assert_eq!(source.load("a.png").unwrap(), b"bytes");
        assert!(matches!(
            source.load("missing.png"),
            Err(ImageError::NotFound { .. })
        ));
        assert!(matches!(
            source.load("../a.png"),
            Err(ImageError::NotFound { .. })
        ));
    }

    #[test]
    fn uploads_route_by_scheme_and_release() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("s.png"), b"sample").unwrap();
        let uploads = Arc::new(UploadStore::new());
        let url = uploads.insert(b"upload".to_vec());
        assert!(url.starts_with(UPLOAD_SCHEME));
        let routed = RoutedSource::new(uploads.clone(), DirectorySource::new(dir.path()));
        assert_eq!(routed.load(&url).unwrap(), b"upload");
        assert_eq!(routed.load("s.png").unwrap(), b"sample");
        assert!(uploads.release(&url));
        assert!(routed.load(&url).is_err());
        assert!(uploads.is_empty());
    }
}
