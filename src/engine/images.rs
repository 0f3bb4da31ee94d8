use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::config::KnnSettings;
use crate::dataset::Label;
use crate::ml::knn::{self, LabeledExample, Verdict};
use crate::ml::metrics::ConfusionMatrix;
use crate::vision::{FeatureCache, FeatureLayout, FeatureVector, ImageError, ImageSource, SampleManifest};

/// Where an image stands in the label/classify workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageStatus {
    /// No label and no prediction yet.
    Unlabeled,
    /// User-assigned label; labeled images are never classified.
    Labeled { label: Label },
    /// Prediction from the last classification pass.
    Classified { verdict: Verdict },
    /// Features could not be extracted during the last classification pass.
    Unclassifiable { reason: String },
}

/// One image in the working collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserImage {
    pub id: String,
    pub url: String,
    pub status: ImageStatus,
}

impl UserImage {
    pub fn label(&self) -> Option<Label> {
        match self.status {
            ImageStatus::Labeled { label } => Some(label),
            _ => None,
        }
    }

    pub fn prediction(&self) -> Option<Verdict> {
        match self.status {
            ImageStatus::Classified { verdict } => Some(verdict),
            _ => None,
        }
    }
}

/// Tally of one classification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifySummary {
    pub classified: usize,
    pub unclassifiable: usize,
    /// Labeled images that contributed a vector to the vote.
    pub examples: usize,
}

/// Held-out accuracy estimate with its split sizes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldoutReport {
    pub score: u8,
    pub train_size: usize,
    pub test_size: usize,
    pub confusion: ConfusionMatrix,
}

/// Image collection plus the k-NN classifier over cached feature vectors.
pub struct ImageEngine {
    images: Vec<UserImage>,
    cache: FeatureCache,
    source: Arc<dyn ImageSource>,
    knn: KnnSettings,
}

impl ImageEngine {
    pub fn new(source: Arc<dyn ImageSource>, layout: FeatureLayout, knn: KnnSettings) -> Self {
        Self {
            images: Vec::new(),
            cache: FeatureCache::new(layout),
            source,
            knn,
        }
    }

    pub fn images(&self) -> &[UserImage] {
        &self.images
    }

    pub fn image(&self, id: &str) -> Option<&UserImage> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn cache(&self) -> &FeatureCache {
        &self.cache
    }

    pub fn labeled_count(&self) -> usize {
        self.images.iter().filter(|image| image.label().is_some()).count()
    }

    /// Append an image reference and return its new id.
    pub fn add_image(&mut self, url: impl Into<String>) -> String {
        self.push(url.into(), ImageStatus::Unlabeled)
    }

    /// Append every manifest entry in order, keeping pre-assigned labels.
    pub fn add_samples(&mut self, manifest: &SampleManifest) -> Vec<String> {
        manifest
            .samples
            .iter()
            .map(|entry| {
                let status = match entry.label {
                    Some(label) => ImageStatus::Labeled { label },
                    None => ImageStatus::Unlabeled,
                };
                self.push(entry.file.clone(), status)
            })
            .collect()
    }

    /// Assign or clear the label of `id`. Any previous prediction is dropped.
    pub fn set_label(&mut self, id: &str, label: Option<Label>) -> bool {
        let Some(image) = self.images.iter_mut().find(|image| image.id == id) else {
            return false;
        };
        image.status = match label {
            Some(label) => ImageStatus::Labeled { label },
            None => ImageStatus::Unlabeled,
        };
        true
    }

    /// Remove `id`; the cached vector goes too unless another image shares its url.
    pub fn remove_image(&mut self, id: &str) -> Option<UserImage> {
        let index = self.images.iter().position(|image| image.id == id)?;
        let removed = self.images.remove(index);
        if !self.images.iter().any(|image| image.url == removed.url) {
            self.cache.evict(&removed.url);
        }
        Some(removed)
    }

    /// Feature vector for `id`, extracting it on first use.
    pub fn features_for(&self, id: &str) -> Option<Result<FeatureVector, ImageError>> {
        let image = self.image(id)?;
        Some(self.features(&image.url))
    }

    /// Classify every unlabeled image in collection order.
    ///
    /// Labeled images whose features fail to extract are left out of the vote.
    /// An image that fails to extract is marked unclassifiable and the pass
    /// continues with the next one.
    pub fn classify_all(&mut self) -> ClassifySummary {
        let training = self.labeled_vectors();
        let examples: Vec<LabeledExample<'_>> = training
            .iter()
            .map(|(vector, label)| LabeledExample {
                vector: vector.as_slice(),
                label: *label,
            })
            .collect();

        let mut summary = ClassifySummary {
            examples: examples.len(),
            ..ClassifySummary::default()
        };
        let mut updates = Vec::new();
        for (index, image) in self.images.iter().enumerate() {
            if image.label().is_some() {
                continue;
            }
            let status = match self.cache.get_or_extract(&image.url, self.source.as_ref()) {
                Ok(vector) => {
                    summary.classified += 1;
                    ImageStatus::Classified {
                        verdict: knn::classify(vector.as_slice(), &examples, &self.knn),
                    }
                }
                Err(err) => {
                    summary.unclassifiable += 1;
                    ImageStatus::Unclassifiable {
                        reason: err.to_string(),
                    }
                }
            };
            updates.push((index, status));
        }
        for (index, status) in updates {
            self.images[index].status = status;
        }
        tracing::info!(
            "Classified {} images ({} unclassifiable) against {} examples",
            summary.classified,
            summary.unclassifiable,
            summary.examples
        );
        summary
    }

    /// Held-out accuracy as a whole percentage; 0 with too few labeled images.
    pub fn estimate_accuracy<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        self.estimate_accuracy_report(rng).score
    }

    /// Shuffle the labeled images, hold out a fraction and score k-NN on it.
    ///
    /// The split and the votes never touch the collection's own predictions.
    pub fn estimate_accuracy_report<R: Rng + ?Sized>(&self, rng: &mut R) -> HoldoutReport {
        if self.labeled_count() < self.knn.min_labeled_for_accuracy {
            return HoldoutReport::default();
        }
        let mut labeled = self.labeled_vectors();
        if labeled.len() < self.knn.min_labeled_for_accuracy.max(2) {
            return HoldoutReport::default();
        }
        labeled.shuffle(rng);
        let total = labeled.len();
        let test_size =
            ((total as f32 * self.knn.holdout_fraction).round() as usize).clamp(1, total - 1);
        let (test, train) = labeled.split_at(test_size);
        let examples: Vec<LabeledExample<'_>> = train
            .iter()
            .map(|(vector, label)| LabeledExample {
                vector: vector.as_slice(),
                label: *label,
            })
            .collect();

        let mut confusion = ConfusionMatrix::default();
        for (vector, truth) in test {
            let verdict = knn::classify(vector.as_slice(), &examples, &self.knn);
            confusion.add(*truth, verdict.label);
        }
        let report = HoldoutReport {
            score: confusion.accuracy_percent(),
            train_size: train.len(),
            test_size: test.len(),
            confusion,
        };
        tracing::debug!(
            "Held-out accuracy {}% ({} train / {} test)",
            report.score,
            report.train_size,
            report.test_size
        );
        report
    }

    /// Extract features for every distinct url on `workers` threads.
    ///
    /// Returns the number of urls that failed to extract.
    pub fn prefetch_features(&self, workers: usize) -> usize {
        let mut urls: Vec<&str> = self.images.iter().map(|image| image.url.as_str()).collect();
        urls.sort_unstable();
        urls.dedup();
        if urls.is_empty() {
            return 0;
        }
        let next = AtomicUsize::new(0);
        let failures = AtomicUsize::new(0);
        let workers = workers.clamp(1, urls.len());
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(url) = urls.get(index) else {
                            break;
                        };
                        if self.features(url).is_err() {
                            failures.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });
        failures.into_inner()
    }

    fn push(&mut self, url: String, status: ImageStatus) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.images.push(UserImage {
            id: id.clone(),
            url,
            status,
        });
        id
    }

    fn features(&self, url: &str) -> Result<FeatureVector, ImageError> {
        self.cache.get_or_extract(url, self.source.as_ref())
    }

    fn labeled_vectors(&self) -> Vec<(FeatureVector, Label)> {
        self.images
            .iter()
            .filter_map(|image| {
                let label = image.label()?;
                match self.features(&image.url) {
                    Ok(vector) => Some((vector, label)),
                    Err(err) => {
                        tracing::warn!("Skipping labeled image {}: {err}", image.id);
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::UploadStore;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use rand::{SeedableRng, rngs::StdRng};
    use std::io::Cursor;

    fn png(color: [u8; 3]) -> Vec<u8> {
        let mut bytes = Vec::new();
        let image = RgbImage::from_fn(16, 16, |x, y| {
            let shade = ((x + y) % 4) as u8 * 6;
            Rgb([
                color[0].saturating_add(shade),
                color[1].saturating_add(shade),
                color[2].saturating_add(shade),
            ])
        });
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn engine() -> (ImageEngine, Arc<UploadStore>) {
        let uploads = Arc::new(UploadStore::new());
        let engine = ImageEngine::new(
            uploads.clone(),
            FeatureLayout::default(),
            KnnSettings::default(),
        );
        (engine, uploads)
    }

    #[test]
    fn labeled_images_drive_predictions_for_unlabeled_ones() {
        let (mut engine, uploads) = engine();
        for _ in 0..3 {
            let id = engine.add_image(uploads.insert(png([220, 30, 30])));
            engine.set_label(&id, Some(Label::Negative));
            let id = engine.add_image(uploads.insert(png([30, 30, 220])));
            engine.set_label(&id, Some(Label::Positive));
        }
        let red = engine.add_image(uploads.insert(png([210, 40, 35])));
        let blue = engine.add_image(uploads.insert(png([35, 40, 210])));
        let summary = engine.classify_all();
        assert_eq!(summary.classified, 2);
        assert_eq!(summary.examples, 6);
        assert_eq!(engine.image(&red).unwrap().prediction().unwrap().label, Label::Negative);
        assert_eq!(engine.image(&blue).unwrap().prediction().unwrap().label, Label::Positive);
        assert!(engine.image(&red).unwrap().prediction().unwrap().confidence > 0.5);
    }

    #[test]
    fn unreadable_image_is_marked_and_the_pass_continues() {
        let (mut engine, uploads) = engine();
        let id = engine.add_image(uploads.insert(png([200, 200, 10])));
        engine.set_label(&id, Some(Label::Positive));
        let broken = engine.add_image(uploads.insert(b"not an image".to_vec()));
        let fine = engine.add_image(uploads.insert(png([190, 190, 20])));
        let summary = engine.classify_all();
        assert_eq!(summary.unclassifiable, 1);
        assert_eq!(summary.classified, 1);
        assert!(matches!(
            engine.image(&broken).unwrap().status,
            ImageStatus::Unclassifiable { .. }
        ));
        assert_eq!(engine.image(&fine).unwrap().prediction().unwrap().label, Label::Positive);
    }

    #[test]
    fn without_labels_every_prediction_is_undecided() {
        let (mut engine, uploads) = engine();
        let id = engine.add_image(uploads.insert(png([10, 120, 10])));
        engine.classify_all();
        assert_eq!(engine.image(&id).unwrap().prediction(), Some(Verdict::UNDECIDED));
    }

    #[test]
    fn relabeling_clears_the_prediction() {
        let (mut engine, uploads) = engine();
        let id = engine.add_image(uploads.insert(png([10, 120, 10])));
        engine.classify_all();
        assert!(engine.image(&id).unwrap().prediction().is_some());
        engine.set_label(&id, Some(Label::Positive));
        assert_eq!(engine.image(&id).unwrap().prediction(), None);
        engine.set_label(&id, None);
        assert_eq!(engine.image(&id).unwrap().status, ImageStatus::Unlabeled);
        assert!(!engine.set_label("missing", Some(Label::Negative)));
    }

    #[test]
    fn removal_evicts_only_unshared_vectors() {
        let (mut engine, uploads) = engine();
        let url = uploads.insert(png([90, 90, 90]));
        let first = engine.add_image(url.clone());
        let second = engine.add_image(url.clone());
        engine.features_for(&first).unwrap().unwrap();
        engine.remove_image(&first).unwrap();
        assert!(engine.cache().get(&url).is_some());
        engine.remove_image(&second).unwrap();
        assert!(engine.cache().get(&url).is_none());
        assert!(engine.remove_image(&second).is_none());
    }

    #[test]
    fn accuracy_needs_enough_labeled_images() {
        let (mut engine, uploads) = engine();
        for color in [[220, 30, 30], [30, 30, 220], [210, 40, 40]] {
            let id = engine.add_image(uploads.insert(png(color)));
            engine.set_label(&id, Some(Label::Negative));
        }
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(engine.estimate_accuracy(&mut rng), 0);
    }

    #[test]
    fn separable_collection_scores_perfectly_held_out() {
        let (mut engine, uploads) = engine();
        for _ in 0..5 {
            let id = engine.add_image(uploads.insert(png([230, 20, 20])));
            engine.set_label(&id, Some(Label::Negative));
            let id = engine.add_image(uploads.insert(png([20, 20, 230])));
            engine.set_label(&id, Some(Label::Positive));
        }
        let mut rng = StdRng::seed_from_u64(9);
        let report = engine.estimate_accuracy_report(&mut rng);
        assert_eq!(report.test_size, 2);
        assert_eq!(report.train_size, 8);
        assert_eq!(report.score, 100);
        assert_eq!(report.confusion.total(), 2);
    }

    #[test]
    fn prefetch_counts_failures_once_per_url() {
        let (mut engine, uploads) = engine();
        let good = uploads.insert(png([1, 2, 3]));
        engine.add_image(good.clone());
        engine.add_image(good);
        engine.add_image("upload://missing");
        assert_eq!(engine.prefetch_features(4), 1);
        assert_eq!(engine.cache().extraction_count(), 2);
    }
}
