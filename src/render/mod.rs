//! Raster view of the numeric workbench: probability heatmap, data points
//! and the decision boundary, painted into an egui [`ColorImage`].
//!
//! Every call repaints the whole canvas from the model and points it is
//! given, so nothing from a previous frame survives into the next.

mod boundary;
mod export;
mod paint;

use egui::{Color32, ColorImage};

use crate::config::{RenderSettings, sanitize_overlay_opacity};
use crate::dataset::{Label, LabeledPoint};
use crate::ml::logreg::LinearModel;

pub use boundary::{BoundarySegment, decision_boundary};
pub use export::{ExportError, save_png, to_rgba_image};

/// Colors used by the boundary view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color32,
    /// Heatmap color where class 1 is certain to be absent.
    pub class_zero: Color32,
    /// Heatmap color where class 1 is certain.
    pub class_one: Color32,
    pub point_zero: Color32,
    pub point_one: Color32,
    pub point_outline: Color32,
    pub boundary: Color32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(18, 16, 14),
            class_zero: Color32::from_rgb(231, 111, 81),
            class_one: Color32::from_rgb(42, 157, 143),
            point_zero: Color32::from_rgb(244, 162, 97),
            point_one: Color32::from_rgb(38, 198, 218),
            point_outline: Color32::from_rgb(250, 246, 240),
            boundary: Color32::from_rgb(250, 246, 240),
        }
    }
}

/// Renders the decision boundary view at a fixed size.
#[derive(Debug, Clone)]
pub struct BoundaryRenderer {
    pub(crate) width: u32,
    pub(crate) height: u32,
    grid_resolution: u32,
    point_radius: f32,
    palette: Palette,
}

impl BoundaryRenderer {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            width: settings.width.max(1),
            height: settings.height.max(1),
            grid_resolution: settings.grid_resolution.max(1),
            point_radius: settings.point_radius.max(0.0),
            palette: Palette::default(),
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Paint heatmap, points and boundary for `model` over `points`.
    ///
    /// `opacity` is clamped to `[0, 0.6]`; zero leaves the plain background
    /// behind the points.
    pub fn render(&self, model: &LinearModel, points: &[LabeledPoint], opacity: f32) -> ColorImage {
        let (width, height) = (self.width as usize, self.height as usize);
        let mut image = ColorImage::new(
            [width, height],
            vec![self.palette.background; width * height],
        );
        self.paint_heatmap(&mut image, model, sanitize_overlay_opacity(opacity));
        for point in points {
            let (cx, cy) = self.to_pixel((point.x, point.y));
            let fill = match point.label {
                Label::Negative => self.palette.point_zero,
                Label::Positive => self.palette.point_one,
            };
            Self::paint_disc(&mut image, cx, cy, self.point_radius + 1.0, self.palette.point_outline);
            Self::paint_disc(&mut image, cx, cy, self.point_radius, fill);
        }
        if let Some(segment) = decision_boundary(model) {
            let (x0, y0) = self.to_pixel(segment.start);
            let (x1, y1) = self.to_pixel(segment.end);
            Self::draw_line_aa(&mut image, x0, y0, x1, y1, self.palette.boundary);
        }
        image
    }

    /// Unit-square coordinates to pixel space; `y = 1` is the top row.
    pub fn to_pixel(&self, (x, y): (f64, f64)) -> (f32, f32) {
        let px = x * (self.width.saturating_sub(1)) as f64;
        let py = (1.0 - y) * (self.height.saturating_sub(1)) as f64;
        (px as f32, py as f32)
    }

    fn paint_heatmap(&self, image: &mut ColorImage, model: &LinearModel, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        let cells = self.grid_resolution as usize;
        let (width, height) = (self.width as usize, self.height as usize);
        for row in 0..cells {
            let y0 = row * height / cells;
            let y1 = (row + 1) * height / cells;
            let unit_y = 1.0 - (row as f64 + 0.5) / cells as f64;
            for col in 0..cells {
                let x0 = col * width / cells;
                let x1 = (col + 1) * width / cells;
                let unit_x = (col as f64 + 0.5) / cells as f64;
                let probability = model.probability(unit_x, unit_y) as f32;
                let heat = paint::lerp_color(self.palette.class_zero, self.palette.class_one, probability);
                let color = paint::lerp_color(self.palette.background, heat, opacity);
                Self::fill_rect(image, x0, y0, x1, y1, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> BoundaryRenderer {
        BoundaryRenderer::new(&RenderSettings {
            width: 60,
            height: 60,
            grid_resolution: 6,
            overlay_opacity: 0.35,
            point_radius: 3.0,
        })
    }

    #[test]
    fn repeated_renders_are_identical() {
        let renderer = renderer();
        let model = LinearModel::new(3.0, -2.0, 0.1);
        let points = [LabeledPoint::new(0.2, 0.8, Label::Positive)];
        let first = renderer.render(&model, &points, 0.35);
        let _other = renderer.render(&LinearModel::new(-5.0, 5.0, 0.0), &[], 0.6);
        let second = renderer.render(&model, &points, 0.35);
        assert_eq!(first.pixels, second.pixels);
        assert_eq!(first.size, [60, 60]);
    }

    #[test]
    fn zero_opacity_leaves_background_behind_points() {
        let renderer = renderer();
        let image = renderer.render(&LinearModel::new(0.0, 0.0, 4.0), &[], 0.0);
        assert!(image.pixels.iter().all(|p| *p == renderer.palette().background));
    }

    #[test]
    fn heatmap_leans_toward_the_likelier_class() {
        let renderer = renderer();
        let image = renderer.render(&LinearModel::new(0.0, 0.0, 8.0), &[], 0.6);
        let expected = paint::lerp_color(
            renderer.palette().background,
            paint::lerp_color(
                renderer.palette().class_zero,
                renderer.palette().class_one,
                crate::ml::logreg::sigmoid(8.0) as f32,
            ),
            0.6,
        );
        assert_eq!(image.pixels[0], expected);
        assert_ne!(expected, renderer.palette().background);
    }

    #[test]
    fn points_are_drawn_in_label_colors() {
        let renderer = renderer();
        let points = [
            LabeledPoint::new(0.0, 1.0, Label::Negative),
            LabeledPoint::new(1.0, 0.0, Label::Positive),
        ];
        let image = renderer.render(&LinearModel::new(0.0, 0.0, 0.0), &points, 0.0);
        let at = |x: usize, y: usize| image.pixels[y * 60 + x];
        assert_eq!(at(0, 0), renderer.palette().point_zero);
        assert_eq!(at(59, 59), renderer.palette().point_one);
    }

    #[test]
    fn boundary_line_is_painted_over_the_heatmap() {
        let renderer = renderer();
        let image = renderer.render(&LinearModel::new(1.0, 0.0, -0.5), &[], 0.0);
        let column = renderer.to_pixel((0.5, 0.5)).0.round() as usize;
        let touched = (0..60).filter(|y| image.pixels[y * 60 + column] != renderer.palette().background);
        assert!(touched.count() >= 55);
    }

    #[test]
    fn boundary_line_stays_visible_over_points() {
        let renderer = renderer();
        let points = [LabeledPoint::new(0.5, 0.5, Label::Positive)];
        let image = renderer.render(&LinearModel::new(1.0, 0.0, -0.5), &points, 0.0);
        let expected = paint::lerp_color(renderer.palette().point_one, renderer.palette().boundary, 0.5);
        assert_eq!(image.pixels[29 * 60 + 29], expected);
    }

    #[test]
    fn canvas_clicks_map_back_to_painted_points() {
        let renderer = renderer();
        let (px, py) = renderer.to_pixel((0.3, 0.7));
        let (width, height) = renderer.dimensions();
        let (x, y) = crate::dataset::canvas_to_unit(px, py, width, height).unwrap();
        assert!((x - 0.3).abs() < 1e-5);
        assert!((y - 0.7).abs() < 1e-5);
    }
}
