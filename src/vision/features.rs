use std::sync::Arc;

use image::{DynamicImage, RgbImage, imageops::FilterType};

use super::ImageError;
use crate::config::FeatureSettings;

/// Shape of the feature vector produced for one engine instance.
///
/// Layout, in order:
/// 1. grayscale intensity per raster pixel (`size * size`)
/// 2. 3x3 Sobel gradient magnitude per raster pixel (`size * size`)
/// 3. R, G, B means followed by R, G, B standard deviations (6)
/// 4. R, G, B histograms, `bins` fractions each (`3 * bins`)
/// 5. saturation mean, saturation std, value mean, value std (4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    pub raster_size: u32,
    pub histogram_bins: u32,
}

impl FeatureLayout {
    pub fn from_settings(settings: &FeatureSettings) -> Self {
        Self {
            raster_size: settings.raster_size.max(1),
            histogram_bins: settings.histogram_bins.max(1),
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.raster_size as usize) * (self.raster_size as usize)
    }

    /// Number of `f32` values in every vector of this layout.
    pub fn len(&self) -> usize {
        2 * self.pixel_count() + 6 + 3 * self.histogram_bins as usize + 4
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::from_settings(&FeatureSettings::default())
    }
}

/// Immutable, L2-normalized image embedding. Cloning shares the values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Arc<[f32]>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

/// Decode image bytes and extract their feature vector.
pub fn extract_features(
    bytes: &[u8],
    url: &str,
    layout: &FeatureLayout,
) -> Result<FeatureVector, ImageError> {
    let image = image::load_from_memory(bytes).map_err(|err| ImageError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ImageError::Empty {
            url: url.to_string(),
        });
    }
    Ok(features_from_image(&image, layout))
}

/// Extract the feature vector of an already decoded image.
pub fn features_from_image(image: &DynamicImage, layout: &FeatureLayout) -> FeatureVector {
    let size = layout.raster_size;
    let raster: RgbImage = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let pixels: Vec<[f32; 3]> = raster
        .pixels()
        .map(|p| {
            [
                p[0] as f32 / 255.0,
                p[1] as f32 / 255.0,
                p[2] as f32 / 255.0,
            ]
        })
        .collect();

    let mut out = Vec::with_capacity(layout.len());
    let gray: Vec<f32> = pixels
        .iter()
        .map(|[r, g, b]| 0.299 * r + 0.587 * g + 0.114 * b)
        .collect();
    out.extend_from_slice(&gray);
    push_gradients(&mut out, &gray, size as usize);
    push_channel_stats(&mut out, &pixels);
    push_histograms(&mut out, &pixels, layout.histogram_bins as usize);
    push_saturation_value(&mut out, &pixels);
    debug_assert_eq!(out.len(), layout.len());

    normalize_l2_in_place(&mut out);
    FeatureVector(out.into())
}

/// Normalize a vector in-place and return whether the norm was non-zero.
pub fn normalize_l2_in_place(values: &mut [f32]) -> bool {
    let sum: f32 = values.iter().map(|v| v * v).sum();
    if !sum.is_finite() || sum <= 0.0 {
        return false;
    }
    let norm = sum.sqrt();
    for value in values {
        *value /= norm;
    }
    true
}

fn push_gradients(out: &mut Vec<f32>, gray: &[f32], size: usize) {
    let at = |x: isize, y: isize| -> f32 {
        let cx = x.clamp(0, size as isize - 1) as usize;
        let cy = y.clamp(0, size as isize - 1) as usize;
        gray[cy * size + cx]
    };
    // Largest Sobel magnitude for inputs in [0, 1].
    let scale = 1.0 / (4.0 * std::f32::consts::SQRT_2);
    for y in 0..size as isize {
        for x in 0..size as isize {
            let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
            out.push((gx * gx + gy * gy).sqrt() * scale);
        }
    }
}

fn push_channel_stats(out: &mut Vec<f32>, pixels: &[[f32; 3]]) {
    let n = pixels.len().max(1) as f32;
    let mut mean = [0.0_f32; 3];
    for pixel in pixels {
        for c in 0..3 {
            mean[c] += pixel[c];
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);
    let mut var = [0.0_f32; 3];
    for pixel in pixels {
        for c in 0..3 {
            let d = pixel[c] - mean[c];
            var[c] += d * d;
        }
    }
    out.extend_from_slice(&mean);
    out.extend(var.iter().map(|v| (v / n).sqrt()));
}

fn push_histograms(out: &mut Vec<f32>, pixels: &[[f32; 3]], bins: usize) {
    let bins = bins.max(1);
    let n = pixels.len().max(1) as f32;
    for c in 0..3 {
        let mut counts = vec![0u32; bins];
        for pixel in pixels {
            let bin = ((pixel[c] * bins as f32) as usize).min(bins - 1);
            counts[bin] += 1;
        }
        out.extend(counts.iter().map(|&count| count as f32 / n));
    }
}

fn push_saturation_value(out: &mut Vec<f32>, pixels: &[[f32; 3]]) {
    let n = pixels.len().max(1) as f32;
    let (saturation, value): (Vec<f32>, Vec<f32>) = pixels
        .iter()
        .map(|&[r, g, b]| {
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let s = if max > 0.0 { (max - min) / max } else { 0.0 };
            (s, max)
        })
        .unzip();
    for series in [&saturation, &value] {
        let mean = series.iter().sum::<f32>() / n;
        let var = series.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
        out.push(mean);
        out.push(var.sqrt());
    }
}
