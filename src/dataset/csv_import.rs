use csv::{ReaderBuilder, StringRecord, Trim};

use super::{Label, LabeledPoint, clamp_unit};

/// Guards the min-max denominator when every value on an axis is equal.
const NORMALIZE_EPSILON: f64 = 1e-9;

const POSITIVE_KEYWORDS: &[&str] = &["1", "true", "yes", "positive", "fish", "fruit"];

/// Result of importing `x,y,label` rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// At least one row parsed; points are min-max normalized per axis.
    Imported {
        points: Vec<LabeledPoint>,
        skipped: usize,
    },
    /// Nothing usable; the caller keeps its previous dataset.
    Empty { skipped: usize },
}

impl ImportOutcome {
    pub fn skipped(&self) -> usize {
        match self {
            Self::Imported { skipped, .. } | Self::Empty { skipped } => *skipped,
        }
    }
}

/// Parse CSV text with a header row followed by `x,y,label` rows.
///
/// Rows whose first two fields are not finite numbers are skipped. The header
/// is the first such row before any data and is not counted as skipped.
/// Coordinates are clamped into `[0, 1]` before each axis is min-max
/// normalized.
pub fn import_csv(text: &str) -> ImportOutcome {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());
    let mut raw = Vec::new();
    let mut skipped = 0usize;
    let mut header_seen = false;
    for record in reader.records() {
        let parsed = match record {
            Ok(record) if is_blank(&record) => continue,
            Ok(record) => parse_record(&record),
            Err(err) => {
                tracing::debug!("Unreadable CSV row: {err}");
                None
            }
        };
        match parsed {
            Some(point) => raw.push(point),
            None if !header_seen && raw.is_empty() => header_seen = true,
            None => skipped += 1,
        }
    }
    if raw.is_empty() {
        return ImportOutcome::Empty { skipped };
    }
    ImportOutcome::Imported {
        points: normalize_min_max(&raw),
        skipped,
    }
}

/// Whether a CSV label field denotes class 1.
pub fn is_positive_label(field: &str) -> bool {
    let field = field.trim().trim_matches('"');
    POSITIVE_KEYWORDS
        .iter()
        .any(|keyword| field.eq_ignore_ascii_case(keyword))
}

/// Rescale each axis to `[0, 1]` using its observed min and max.
pub fn normalize_min_max(points: &[(f64, f64, Label)]) -> Vec<LabeledPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.0, first.0, first.1, first.1);
    for &(x, y, _) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let span_x = (max_x - min_x).max(NORMALIZE_EPSILON);
    let span_y = (max_y - min_y).max(NORMALIZE_EPSILON);
    points
        .iter()
        .map(|&(x, y, label)| LabeledPoint {
            x: clamp_unit((x - min_x) / span_x),
            y: clamp_unit((y - min_y) / span_y),
            label,
        })
        .collect()
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(str::is_empty)
}

fn parse_record(record: &StringRecord) -> Option<(f64, f64, Label)> {
    let x = parse_number(record.get(0)?)?;
    let y = parse_number(record.get(1)?)?;
    let label = if record.get(2).is_some_and(is_positive_label) {
        Label::Positive
    } else {
        Label::Negative
    };
    Some((clamp_unit(x), clamp_unit(y), label))
}

fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|value| value.is_finite())
}
