//! Single-page PDF output.
//!
//! The raster symbol is embedded as an RGB image XObject on a US-Letter page. The whole
//! document is assembled in memory.

use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::config::DocumentConfig;
use crate::error::{QrError, Result};
use crate::options::Color;
use crate::render::raster;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
/// Side of the placed symbol in points, whatever its pixel size.
const IMAGE_SIDE: i64 = 200;
const TITLE_FONT_SIZE: i64 = 18;
const CAPTION_FONT_SIZE: i64 = 10;

/// Builds the PDF bytes for a rendered symbol.
pub fn to_pdf(img: &RgbaImage, content: &str, document: &DocumentConfig) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let rgb = raster::flatten(img, Color::WHITE).into_raw();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb,
    ));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
        "XObject" => dictionary! {
            "Im1" => image_id,
        },
    });

    let x = (PAGE_WIDTH - IMAGE_SIDE) / 2;
    let y = (PAGE_HEIGHT - IMAGE_SIDE) / 2;
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                IMAGE_SIDE.into(),
                0i64.into(),
                0i64.into(),
                IMAGE_SIDE.into(),
                x.into(),
                y.into(),
            ],
        ),
        Operation::new("Do", vec!["Im1".into()]),
        Operation::new("Q", vec![]),
    ];
    if let Some(title) = &document.title {
        operations.extend(centred_text(title, TITLE_FONT_SIZE, y + IMAGE_SIDE + 30));
    }
    if document.caption {
        let caption = caption_text(content, document.caption_max_chars);
        operations.extend(centred_text(&caption, CAPTION_FONT_SIZE, y - 24));
    }

    let content_id = doc.add_object(Stream::new(dictionary! {}, Content { operations }.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| QrError::Document(e.to_string()))?;
    Ok(bytes)
}

/// Helvetica glyphs average roughly half the font size in width, close enough to centre.
fn centred_text(text: &str, font_size: i64, baseline: i64) -> Vec<Operation> {
    let approx_width = text.chars().count() as i64 * font_size / 2;
    let x = ((PAGE_WIDTH - approx_width) / 2).max(36);
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), font_size.into()]),
        Operation::new("Td", vec![x.into(), baseline.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Flattens line breaks and cuts the content to `max_chars`, ending in `...` when cut.
fn caption_text(content: &str, max_chars: usize) -> String {
    let single_line: String = content
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let keep = max_chars.saturating_sub(3);
    let mut cut: String = single_line.chars().take(keep).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_pdf_header_and_trailer() {
        let img = RgbaImage::from_pixel(29, 29, Rgba([0, 0, 0, 255]));
        let bytes = to_pdf(&img, "https://example.com", &DocumentConfig::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let tail = String::from_utf8_lossy(&bytes[bytes.len().saturating_sub(32)..]).to_string();
        assert!(tail.contains("%%EOF"));
    }

    #[test]
    fn test_pdf_is_deterministic() {
        let img = RgbaImage::from_pixel(21, 21, Rgba([255, 255, 255, 255]));
        let document = DocumentConfig {
            title: Some("QR Code".into()),
            caption: true,
            ..DocumentConfig::default()
        };
        let a = to_pdf(&img, "same", &document).unwrap();
        let b = to_pdf(&img, "same", &document).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_caption_truncation() {
        assert_eq!(caption_text("short", 48), "short");
        assert_eq!(caption_text("BEGIN:VCARD\nEND:VCARD", 48), "BEGIN:VCARD END:VCARD");
        assert_eq!(caption_text("abcdefghij", 8), "abcde...");
    }
}
