//! Bitmap rendering of a symbol into an RGBA canvas, plus PNG and JPEG encoding.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::Result;
use crate::options::{Color, GenerationOptions, ModuleDrawer};
use crate::qrcode::QrMatrix;

/// JPEG quality used for every JPEG output.
pub const JPEG_QUALITY: u8 = 90;

/// Draws the symbol at `opts.size` pixels per module with `opts.border` quiet-zone modules
/// on every edge.
///
/// The canvas is filled with the background color, then every dark module is stamped with
/// the shape chosen by `drawer` in the foreground color. The rendered side must fit in a
/// `u32`; [`render`](super::render) checks it against `max_image_side` before drawing.
pub(crate) fn draw(qr: &QrMatrix, opts: &GenerationOptions, drawer: ModuleDrawer) -> RgbaImage {
    let scale = opts.size;
    let border = opts.border;
    let side = (qr.size() as u32 + 2 * border) * scale;
    let foreground = Rgba(opts.foreground_color.to_rgba());
    let mut img = RgbaImage::from_pixel(side, side, Rgba(opts.background_color.to_rgba()));

    let stamp = module_stamp(drawer, scale);
    for y in 0..qr.size() {
        for x in 0..qr.size() {
            if !qr.get_module(x, y) {
                continue;
            }
            let left = (x as u32 + border) * scale;
            let top = (y as u32 + border) * scale;
            for (i, &on) in stamp.iter().enumerate() {
                if on {
                    let i = i as u32;
                    img.put_pixel(left + i % scale, top + i / scale, foreground);
                }
            }
        }
    }
    img
}

/// Coverage mask for one module, `scale * scale` entries in row-major order.
fn module_stamp(drawer: ModuleDrawer, scale: u32) -> Vec<bool> {
    let side = f64::from(scale);
    let inside = |px: u32, py: u32| -> bool {
        let cx = f64::from(px) + 0.5;
        let cy = f64::from(py) + 0.5;
        match drawer {
            ModuleDrawer::Square => true,
            ModuleDrawer::Rounded => {
                // Same corner radius as the SVG output: a quarter of the module
                let r = f64::from(scale / 4);
                let dx = if cx < r { r - cx } else if cx > side - r { cx - (side - r) } else { 0.0 };
                let dy = if cy < r { r - cy } else if cy > side - r { cy - (side - r) } else { 0.0 };
                dx * dx + dy * dy <= r * r
            }
            ModuleDrawer::Circle => {
                let r = side / 2.0;
                (cx - r).powi(2) + (cy - r).powi(2) <= r * r
            }
        }
    };
    (0..scale * scale).map(|i| inside(i % scale, i / scale)).collect()
}

/// Encodes as PNG. Fully opaque canvases are written as RGB, anything else keeps alpha.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if img.pixels().all(|p| p[3] == 255) {
        let rgb = RgbImage::from_fn(img.width(), img.height(), |x, y| {
            let p = img.get_pixel(x, y);
            Rgb([p[0], p[1], p[2]])
        });
        rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    } else {
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    }
    Ok(bytes)
}

/// Encodes as JPEG at [`JPEG_QUALITY`]. JPEG has no alpha channel, so any transparency is
/// flattened onto white first.
pub fn encode_jpeg(img: &RgbaImage) -> Result<Vec<u8>> {
    let rgb = flatten(img, Color::WHITE);
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(bytes)
}

/// Composites the canvas over an opaque backdrop color.
pub fn flatten(img: &RgbaImage, backdrop: Color) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        let c = Color::new(p[0], p[1], p[2], p[3]).flatten_onto(backdrop);
        Rgb([c.r, c.g, c.b])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::QrCodeEcc;

    fn matrix() -> QrMatrix {
        QrMatrix::encode_text("Hello, world!", QrCodeEcc::Low).unwrap()
    }

    #[test]
    fn test_dimensions_follow_size_and_border() {
        let opts = GenerationOptions { size: 3, border: 2, ..GenerationOptions::default() };
        let img = draw(&matrix(), &opts, ModuleDrawer::Square);
        assert_eq!(img.dimensions(), ((21 + 4) * 3, (21 + 4) * 3));
    }

    #[test]
    fn test_colors_applied() {
        let opts = GenerationOptions {
            size: 4,
            border: 1,
            foreground_color: Color::rgb(10, 20, 30),
            background_color: Color::rgb(200, 210, 220),
            ..GenerationOptions::default()
        };
        let img = draw(&matrix(), &opts, ModuleDrawer::Square);
        // Quiet zone
        assert_eq!(img.get_pixel(0, 0), &Rgba([200, 210, 220, 255]));
        // Top-left finder corner module
        assert_eq!(img.get_pixel(4, 4), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_styled_stamps() {
        let square = module_stamp(ModuleDrawer::Square, 8);
        let rounded = module_stamp(ModuleDrawer::Rounded, 8);
        let circle = module_stamp(ModuleDrawer::Circle, 8);
        assert!(square.iter().all(|&on| on));
        // Corners are cut away, centres stay filled
        assert!(!rounded[0] && rounded[3 * 8 + 3]);
        assert!(!circle[0] && circle[4 * 8 + 4]);
        assert!(circle.iter().filter(|&&on| on).count() < rounded.iter().filter(|&&on| on).count());
    }

    #[test]
    fn test_styled_modules_keep_colors() {
        let opts = GenerationOptions {
            size: 8,
            foreground_color: Color::rgb(0, 0, 128),
            background_color: Color::rgb(255, 255, 0),
            ..GenerationOptions::default()
        };
        let img = draw(&matrix(), &opts, ModuleDrawer::Circle);
        assert_eq!(img.get_pixel(5, 5), &Rgba([255, 255, 0, 255]));
        let centre = (opts.border * 8 + 4, opts.border * 8 + 4);
        assert_eq!(img.get_pixel(centre.0, centre.1), &Rgba([0, 0, 128, 255]));
    }

    #[test]
    fn test_png_and_jpeg_signatures() {
        let img = draw(&matrix(), &GenerationOptions::default(), ModuleDrawer::Square);
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let jpeg = encode_jpeg(&img).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_jpeg_flattens_transparency_onto_white() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let flat = flatten(&img, Color::WHITE);
        assert_eq!(flat.get_pixel(1, 1), &Rgb([255, 255, 255]));
    }
}
