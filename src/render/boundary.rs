use crate::ml::logreg::LinearModel;

/// Weights below this magnitude are treated as zero.
const WEIGHT_EPSILON: f64 = 1e-9;
const POINT_EPSILON: f64 = 1e-9;

/// Segment of the `p = 0.5` line clipped to the unit square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundarySegment {
    pub start: (f64, f64),
    pub end: (f64, f64),
}

impl BoundarySegment {
    pub fn length(&self) -> f64 {
        (self.end.0 - self.start.0).hypot(self.end.1 - self.start.1)
    }
}

/// Clip `w1*x + w2*y + bias = 0` to the unit square.
///
/// Returns `None` when both weights vanish, the line misses the square or
/// only grazes a corner. A near-zero `w2` yields a vertical segment.
pub fn decision_boundary(model: &LinearModel) -> Option<BoundarySegment> {
    if !model.is_finite() {
        return None;
    }
    let LinearModel { w1, w2, bias } = *model;
    let mut hits: Vec<(f64, f64)> = Vec::with_capacity(4);
    if w2.abs() > WEIGHT_EPSILON {
        for x in [0.0, 1.0] {
            push_hit(&mut hits, x, -(bias + w1 * x) / w2);
        }
    }
    if w1.abs() > WEIGHT_EPSILON {
        for y in [0.0, 1.0] {
            push_hit(&mut hits, -(bias + w2 * y) / w1, y);
        }
    }
    let mut best: Option<BoundarySegment> = None;
    for (i, &start) in hits.iter().enumerate() {
        for &end in &hits[i + 1..] {
            let segment = BoundarySegment { start, end };
            if best.is_none_or(|current| segment.length() > current.length()) {
                best = Some(segment);
            }
        }
    }
    best.filter(|segment| segment.length() > POINT_EPSILON)
}

fn push_hit(hits: &mut Vec<(f64, f64)>, x: f64, y: f64) {
    let inside = |v: f64| (-POINT_EPSILON..=1.0 + POINT_EPSILON).contains(&v);
    if !inside(x) || !inside(y) {
        return;
    }
    let point = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
    let duplicate = hits
        .iter()
        .any(|hit| (hit.0 - point.0).abs() < POINT_EPSILON && (hit.1 - point.1).abs() < POINT_EPSILON);
    if !duplicate {
        hits.push(point);
    }
}
