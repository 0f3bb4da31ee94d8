use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Encode a small textured square of `color` as PNG bytes.
pub fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_fn(16, 16, |x, y| {
        let shade = ((x * 3 + y) % 5) as u8 * 4;
        Rgb([
            color[0].saturating_add(shade),
            color[1].saturating_add(shade),
            color[2].saturating_add(shade),
        ])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode test png");
    bytes
}

pub fn write_test_png(path: &Path, color: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create png parent dirs");
    }
    std::fs::write(path, png_bytes(color)).expect("write test png");
}
