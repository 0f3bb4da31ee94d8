use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use super::{FeatureLayout, FeatureVector, ImageError, ImageSource, extract_features};

type Slot = Arc<OnceLock<Result<FeatureVector, ImageError>>>;

/// Write-once feature vectors keyed by image reference.
///
/// The slot is created before extraction starts, so concurrent requests for
/// the same reference wait on one extraction instead of starting their own.
/// Failures are memoized too; evicting the reference allows a retry.
pub struct FeatureCache {
    layout: FeatureLayout,
    slots: Mutex<HashMap<String, Slot>>,
    extractions: AtomicUsize,
}

impl FeatureCache {
    pub fn new(layout: FeatureLayout) -> Self {
        Self {
            layout,
            slots: Mutex::new(HashMap::new()),
            extractions: AtomicUsize::new(0),
        }
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Return the cached vector for `url`, extracting it through `source` on first use.
    pub fn get_or_extract(
        &self,
        url: &str,
        source: &dyn ImageSource,
    ) -> Result<FeatureVector, ImageError> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|err| err.into_inner());
            slots.entry(url.to_string()).or_default().clone()
        };
        slot.get_or_init(|| {
            self.extractions.fetch_add(1, Ordering::Relaxed);
            let result = source
                .load(url)
                .and_then(|bytes| extract_features(&bytes, url, &self.layout));
            match &result {
                Ok(_) => tracing::debug!("Extracted features for {url}"),
                Err(err) => tracing::warn!("Feature extraction failed: {err}"),
            }
            result
        })
        .clone()
    }

    /// Completed vector for `url`, if extraction already succeeded.
    pub fn get(&self, url: &str) -> Option<FeatureVector> {
        let slots = self.slots.lock().unwrap_or_else(|err| err.into_inner());
        slots
            .get(url)
            .and_then(|slot| slot.get())
            .and_then(|result| result.as_ref().ok())
            .cloned()
    }

    /// Forget `url` so the next request extracts it again.
    pub fn evict(&self, url: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(|err| err.into_inner());
        slots.remove(url);
    }

    /// Number of extractions started since creation.
    pub fn extraction_count(&self) -> usize {
        self.extractions.load(Ordering::Relaxed)
    }
}
