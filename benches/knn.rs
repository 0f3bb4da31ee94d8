use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use learnonauts_lab::config::KnnSettings;
use learnonauts_lab::dataset::Label;
use learnonauts_lab::ml::knn::{LabeledExample, classify};
use learnonauts_lab::vision::{FeatureLayout, extract_features};
use rand::{Rng, SeedableRng, rngs::StdRng};

const EXAMPLE_COUNT: usize = 200;

fn random_vectors(len: usize) -> Vec<(Vec<f32>, Label)> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..EXAMPLE_COUNT)
        .map(|i| {
            let vector = (0..len).map(|_| rng.random::<f32>()).collect();
            let label = if i % 2 == 0 {
                Label::Negative
            } else {
                Label::Positive
            };
            (vector, label)
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let layout = FeatureLayout::default();
    let vectors = random_vectors(layout.len());
    let examples: Vec<LabeledExample<'_>> = vectors
        .iter()
        .map(|(vector, label)| LabeledExample {
            vector: vector.as_slice(),
            label: *label,
        })
        .collect();
    let target = vectors[0].0.clone();
    let settings = KnnSettings::default();
    c.bench_with_input(
        BenchmarkId::new("knn_classify", EXAMPLE_COUNT),
        &examples,
        |b, examples| {
            b.iter(|| classify(black_box(&target), black_box(examples), &settings));
        },
    );
}

fn bench_extract(c: &mut Criterion) {
    let image = RgbImage::from_fn(256, 256, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode bench png");
    let layout = FeatureLayout::default();
    c.bench_function("extract_features_256px", |b| {
        b.iter(|| extract_features(black_box(&bytes), "bench.png", &layout).expect("extract"));
    });
}

criterion_group!(benches, bench_classify, bench_extract);
criterion_main!(benches);
