//! SVG output, one shape per dark module.

use std::fmt::Write;

use crate::options::{Color, GenerationOptions, ModuleDrawer};
use crate::qrcode::QrMatrix;

/// Returns a string of SVG code for an image depicting the given QR Code.
///
/// The document is sized to the full rendered pixel dimensions, starts with a background
/// rectangle and then emits one shape per dark module: a `rect` for square and rounded
/// modules (rounded ones get `rx`/`ry` of a quarter module), a `circle` for circle modules.
/// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(qr: &QrMatrix, opts: &GenerationOptions) -> String {
    let size = i64::from(opts.size);
    let border = i64::from(opts.border);
    let total = (i64::from(qr.size()) + 2 * border).saturating_mul(size);
    let fill = paint(opts.foreground_color);

    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    let _ = writeln!(
        result,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{0}\" viewBox=\"0 0 {0} {0}\">",
        total
    );
    let _ = writeln!(
        result,
        "<rect width=\"{0}\" height=\"{0}\" {1}/>",
        total,
        paint(opts.background_color)
    );

    for y in 0..qr.size() {
        for x in 0..qr.size() {
            if !qr.get_module(x, y) {
                continue;
            }
            let px = (i64::from(x) + border) * size;
            let py = (i64::from(y) + border) * size;
            let _ = match opts.module_drawer {
                ModuleDrawer::Circle => {
                    let radius = f64::from(opts.size) / 2.0;
                    writeln!(
                        result,
                        "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {}/>",
                        px as f64 + radius,
                        py as f64 + radius,
                        radius,
                        fill
                    )
                }
                ModuleDrawer::Rounded => {
                    let corner = size / 4;
                    writeln!(
                        result,
                        "<rect x=\"{}\" y=\"{}\" width=\"{3}\" height=\"{3}\" rx=\"{2}\" ry=\"{2}\" {4}/>",
                        px, py, corner, size, fill
                    )
                }
                ModuleDrawer::Square => {
                    writeln!(
                        result,
                        "<rect x=\"{}\" y=\"{}\" width=\"{2}\" height=\"{2}\" {3}/>",
                        px, py, size, fill
                    )
                }
            };
        }
    }
    result += "</svg>\n";
    result
}

fn paint(color: Color) -> String {
    let hex = format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b);
    if color.is_opaque() {
        format!("fill=\"{}\"", hex)
    } else {
        format!("fill=\"{}\" fill-opacity=\"{:.3}\"", hex, f64::from(color.a) / 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::QrCodeEcc;

    fn matrix() -> QrMatrix {
        QrMatrix::encode_text("HELLO WORLD", QrCodeEcc::Low).unwrap()
    }

    #[test]
    fn test_to_svg_string() {
        let svg = to_svg_string(&matrix(), &GenerationOptions::default());
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("width=\"290\" height=\"290\" viewBox=\"0 0 290 290\""));
        assert!(svg.contains("<rect width=\"290\" height=\"290\" fill=\"#FFFFFF\"/>"));
        // Top-left finder module at the quiet-zone offset
        assert!(svg.contains("<rect x=\"40\" y=\"40\" width=\"10\" height=\"10\" fill=\"#000000\"/>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_one_shape_per_dark_module() {
        let qr = matrix();
        let svg = to_svg_string(&qr, &GenerationOptions::default());
        // Every rect except the background carries an x attribute
        assert_eq!(svg.matches("<rect x=").count(), qr.dark_count());
    }

    #[test]
    fn test_rounded_and_circle_shapes() {
        let opts = GenerationOptions {
            size: 8,
            border: 0,
            module_drawer: ModuleDrawer::Rounded,
            ..GenerationOptions::default()
        };
        let svg = to_svg_string(&matrix(), &opts);
        assert!(svg.contains("<rect x=\"0\" y=\"0\" width=\"8\" height=\"8\" rx=\"2\" ry=\"2\" fill=\"#000000\"/>"));

        let opts = GenerationOptions { module_drawer: ModuleDrawer::Circle, ..opts };
        let svg = to_svg_string(&matrix(), &opts);
        assert!(svg.contains("<circle cx=\"4\" cy=\"4\" r=\"4\" fill=\"#000000\"/>"));
        assert!(!svg.contains("<rect x="));
    }

    #[test]
    fn test_circle_radius_at_small_and_odd_sizes() {
        let opts = GenerationOptions {
            size: 1,
            border: 0,
            module_drawer: ModuleDrawer::Circle,
            ..GenerationOptions::default()
        };
        let svg = to_svg_string(&matrix(), &opts);
        assert!(svg.contains("<circle cx=\"0.5\" cy=\"0.5\" r=\"0.5\" fill=\"#000000\"/>"));
        assert!(!svg.contains("r=\"0\""));

        let opts = GenerationOptions { size: 5, border: 1, ..opts };
        let svg = to_svg_string(&matrix(), &opts);
        assert!(svg.contains("<circle cx=\"7.5\" cy=\"7.5\" r=\"2.5\" fill=\"#000000\"/>"));
    }

    #[test]
    fn test_translucent_fill() {
        let opts = GenerationOptions {
            background_color: Color::TRANSPARENT,
            ..GenerationOptions::default()
        };
        let svg = to_svg_string(&matrix(), &opts);
        assert!(svg.contains("fill=\"#000000\" fill-opacity=\"0.000\"/>"));
    }
}
