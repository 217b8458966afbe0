//! Centre logo overlay for raster output.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::warn;

use crate::error::{QrError, Result};

/// Light margin kept around the logo, in pixels.
pub const LOGO_PAD: u32 = 10;

/// Overlays the logo at `path` on the centre of `img`, sized to `ratio` of the shorter side
/// and sitting on a white pad.
///
/// Never fails: if the logo cannot be read, decoded or placed, the warning is logged and the
/// symbol is returned exactly as it came in.
pub fn apply_logo(mut img: RgbaImage, path: &str, ratio: f64) -> RgbaImage {
    if let Err(err) = overlay_logo(&mut img, path, ratio) {
        warn!("Failed to add logo: {}", err);
    }
    img
}

/// All fallible work happens before `img` is touched, so an error leaves it unchanged.
fn overlay_logo(img: &mut RgbaImage, path: &str, ratio: f64) -> Result<()> {
    let logo = image::open(path).map_err(|e| QrError::Logo(format!("{}: {}", path, e)))?;

    let (width, height) = img.dimensions();
    let shorter = width.min(height);
    let logo_size = (f64::from(shorter) * ratio) as u32;
    let padded = logo_size + 2 * LOGO_PAD;
    if logo_size == 0 || padded > shorter {
        return Err(QrError::Logo(format!(
            "a {}px logo does not fit a {}px symbol",
            logo_size, shorter
        )));
    }

    let resized = imageops::resize(&logo.to_rgba8(), logo_size, logo_size, FilterType::Lanczos3);
    let mut pad = RgbaImage::from_pixel(padded, padded, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut pad, &resized, i64::from(LOGO_PAD), i64::from(LOGO_PAD));

    let x = (width - padded) / 2;
    let y = (height - padded) / 2;
    imageops::replace(img, &pad, i64::from(x), i64::from(y));
    Ok(())
}
