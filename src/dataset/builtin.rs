use rand::Rng;
use rand_distr::StandardNormal;

use super::{Label, LabeledPoint};

/// Points generated per class by the built-in datasets.
pub const BUILTIN_POINTS_PER_CLASS: usize = 20;

struct Cluster {
    center: (f64, f64),
    spread: f64,
    label: Label,
}

/// Fish (class 1) near the sea floor versus boats (class 0) near the surface.
pub fn ocean<R: Rng + ?Sized>(rng: &mut R) -> Vec<LabeledPoint> {
    generate(
        rng,
        &[
            Cluster {
                center: (0.28, 0.30),
                spread: 0.08,
                label: Label::Positive,
            },
            Cluster {
                center: (0.72, 0.74),
                spread: 0.08,
                label: Label::Negative,
            },
        ],
    )
}

/// Fruit (class 1, sweet and soft) versus vegetables (class 0, crunchy).
///
/// The clusters are wider than the ocean pair so a few points sit close to
/// the boundary.
pub fn fruit_veg<R: Rng + ?Sized>(rng: &mut R) -> Vec<LabeledPoint> {
    generate(
        rng,
        &[
            Cluster {
                center: (0.70, 0.35),
                spread: 0.11,
                label: Label::Positive,
            },
            Cluster {
                center: (0.32, 0.66),
                spread: 0.11,
                label: Label::Negative,
            },
        ],
    )
}

fn generate<R: Rng + ?Sized>(rng: &mut R, clusters: &[Cluster]) -> Vec<LabeledPoint> {
    let mut points = Vec::with_capacity(clusters.len() * BUILTIN_POINTS_PER_CLASS);
    for cluster in clusters {
        for _ in 0..BUILTIN_POINTS_PER_CLASS {
            let dx: f64 = rng.sample(StandardNormal);
            let dy: f64 = rng.sample(StandardNormal);
            points.push(LabeledPoint::new(
                cluster.center.0 + dx * cluster.spread,
                cluster.center.1 + dy * cluster.spread,
                cluster.label,
            ));
        }
    }
    points
}
