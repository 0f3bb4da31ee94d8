use egui::{Color32, ColorImage};

use super::BoundaryRenderer;

/// Linear mix of two opaque colors; `t = 0` is `from`.
pub(super) fn lerp_color(from: Color32, to: Color32, t: f32) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color32::from_rgb(mix(from.r(), to.r()), mix(from.g(), to.g()), mix(from.b(), to.b()))
}

impl BoundaryRenderer {
    pub(super) fn fill_rect(
        image: &mut ColorImage,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        color: Color32,
    ) {
        let [width, height] = image.size;
        for y in y0.min(height)..y1.min(height) {
            let row = y * width;
            if let Some(span) = image.pixels.get_mut(row + x0.min(width)..row + x1.min(width)) {
                span.fill(color);
            }
        }
    }

    pub(super) fn blend_pixel(
        image: &mut ColorImage,
        x: isize,
        y: isize,
        color: Color32,
        coverage: f32,
    ) {
        if coverage <= 0.0 || x < 0 || y < 0 {
            return;
        }
        let [width, height] = image.size;
        let (x, y) = (x as usize, y as usize);
        if x >= width || y >= height {
            return;
        }
        if let Some(pixel) = image.pixels.get_mut(y * width + x) {
            *pixel = lerp_color(*pixel, color, coverage);
        }
    }

    /// Filled disc with a one pixel soft edge.
    pub(super) fn paint_disc(image: &mut ColorImage, cx: f32, cy: f32, radius: f32, color: Color32) {
        if radius <= 0.0 {
            return;
        }
        let reach = radius + 1.0;
        let x_start = (cx - reach).floor() as isize;
        let x_end = (cx + reach).ceil() as isize;
        let y_start = (cy - reach).floor() as isize;
        let y_end = (cy + reach).ceil() as isize;
        for y in y_start..=y_end {
            for x in x_start..=x_end {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let coverage = radius + 0.5 - dx.hypot(dy);
                Self::blend_pixel(image, x, y, color, coverage.min(1.0));
            }
        }
    }

    /// Xiaolin Wu anti-aliased line between pixel-space endpoints.
    pub(super) fn draw_line_aa(
        image: &mut ColorImage,
        mut x0: f32,
        mut y0: f32,
        mut x1: f32,
        mut y1: f32,
        color: Color32,
    ) {
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }
        let mut plot = |x: isize, y: isize, coverage: f32| {
            if steep {
                Self::blend_pixel(image, y, x, color, coverage);
            } else {
                Self::blend_pixel(image, x, y, color, coverage);
            }
        };
        let dx = x1 - x0;
        if dx.abs() < f32::EPSILON {
            plot(x0.round() as isize, y0.round() as isize, 1.0);
            return;
        }
        let gradient = (y1 - y0) / dx;

        let xend = x0.round();
        let yend = y0 + gradient * (xend - x0);
        let xgap = 1.0 - (x0 + 0.5).fract();
        let xpxl1 = xend as isize;
        let ypxl1 = yend.floor() as isize;
        plot(xpxl1, ypxl1, (1.0 - yend.fract()) * xgap);
        plot(xpxl1, ypxl1 + 1, yend.fract() * xgap);
        let mut intery = yend + gradient;

        let xend = x1.round();
        let yend = y1 + gradient * (xend - x1);
        let xgap = (x1 + 0.5).fract();
        let xpxl2 = xend as isize;
        let ypxl2 = yend.floor() as isize;
        plot(xpxl2, ypxl2, (1.0 - yend.fract()) * xgap);
        plot(xpxl2, ypxl2 + 1, yend.fract() * xgap);

        for x in (xpxl1 + 1)..xpxl2 {
            let y = intery.floor() as isize;
            let frac = intery.fract();
            plot(x, y, 1.0 - frac);
            plot(x, y + 1, frac);
            intery += gradient;
        }
    }
}
