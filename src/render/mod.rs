//! Rendering of a [`QrMatrix`] into output bytes.
//!
//! - [`raster`]: RGBA canvas with square, rounded or circular modules, PNG and JPEG.
//! - [`svg`]: vector markup, one shape per dark module.
//! - [`pdf`]: the raster symbol placed on a single PDF page.
//! - [`logo`]: centre logo overlay for raster output.
//!
//! Every output is handed back as a [`RenderedCode`] and turned into a base64 data URI.

pub mod logo;
pub mod pdf;
pub mod raster;
pub mod svg;

use base64::{engine::general_purpose, Engine as _};
use image::RgbaImage;
use log::warn;

use crate::config::GeneratorConfig;
use crate::error::{QrError, Result};
use crate::options::{GenerationOptions, ModuleDrawer, OutputFormat};
use crate::qrcode::QrMatrix;

/// Encoded output together with the format it ended up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCode {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

impl RenderedCode {
    /// `data:<mime>;base64,<bytes>`
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Renders `qr` in `opts.format`.
///
/// `content` is only used for the PDF caption. A PDF that cannot be assembled degrades to a
/// PNG of the same symbol, so the returned format may differ from the requested one.
///
/// # Errors
///
/// Fails with [`QrError::ImageTooLarge`] when the rendered side would exceed
/// `config.max_image_side`, or with [`QrError::Image`] if a raster encoder fails.
pub fn render(
    qr: &QrMatrix,
    opts: &GenerationOptions,
    content: &str,
    config: &GeneratorConfig,
) -> Result<RenderedCode> {
    let side = opts.pixel_side(qr.size() as u32);
    if side > u64::from(config.max_image_side) {
        return Err(QrError::ImageTooLarge {
            side,
            max: config.max_image_side,
        });
    }

    match opts.format {
        OutputFormat::Svg => Ok(RenderedCode {
            format: OutputFormat::Svg,
            bytes: svg::to_svg_string(qr, opts).into_bytes(),
        }),
        OutputFormat::Png => Ok(RenderedCode {
            format: OutputFormat::Png,
            bytes: raster::encode_png(&raster_image(qr, opts, config))?,
        }),
        OutputFormat::Jpeg => Ok(RenderedCode {
            format: OutputFormat::Jpeg,
            bytes: raster::encode_jpeg(&raster_image(qr, opts, config))?,
        }),
        OutputFormat::Pdf => {
            let img = raster_image(qr, opts, config);
            match pdf::to_pdf(&img, content, &config.document) {
                Ok(bytes) => Ok(RenderedCode {
                    format: OutputFormat::Pdf,
                    bytes,
                }),
                Err(err) => {
                    warn!("PDF assembly failed, returning PNG instead: {}", err);
                    Ok(RenderedCode {
                        format: OutputFormat::Png,
                        bytes: raster::encode_png(&img)?,
                    })
                }
            }
        }
    }
}

/// Draws the raster symbol and applies the logo, if one is configured. Callers check the
/// rendered side against `max_image_side` first.
pub(crate) fn raster_image(
    qr: &QrMatrix,
    opts: &GenerationOptions,
    config: &GeneratorConfig,
) -> RgbaImage {
    let drawer = effective_drawer(opts.module_drawer, config);
    let img = raster::draw(qr, opts, drawer);
    match opts.logo_path.as_deref() {
        Some(path) => logo::apply_logo(img, path, opts.logo_size_ratio),
        None => img,
    }
}

/// Styled drawers need backend support. Without it the symbol is drawn with square modules
/// and the requested colors are kept as they are.
fn effective_drawer(requested: ModuleDrawer, config: &GeneratorConfig) -> ModuleDrawer {
    if requested != ModuleDrawer::Square && !config.styled_modules {
        warn!("Styled modules unsupported, drawing {:?} as square", requested);
        return ModuleDrawer::Square;
    }
    requested
}
