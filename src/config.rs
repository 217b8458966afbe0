//! Generator configuration, read once from `QR_*` environment variables.

use std::env;

use log::warn;

use crate::options::{Color, GenerationOptions, ModuleDrawer, OutputFormat};
use crate::qrcode::QrCodeEcc;

/// Settings for the PDF page that wraps a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentConfig {
    /// Heading drawn above the symbol.
    pub title: Option<String>,
    /// Whether to print the encoded content under the symbol.
    pub caption: bool,
    /// Captions longer than this are cut and end in `...`.
    pub caption_max_chars: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            title: None,
            caption: false,
            caption_max_chars: 48,
        }
    }
}

/// Largest side a JPEG can carry. A version 40 symbol at 300 pixels per module with the
/// default border still fits.
pub const DEFAULT_MAX_IMAGE_SIDE: u32 = 65_535;

/// Immutable generator configuration, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Options used for every key a request leaves out.
    pub defaults: GenerationOptions,
    /// Whether the raster backend can draw rounded and circular modules. When false,
    /// every raster is drawn with square modules in the requested colors.
    pub styled_modules: bool,
    /// Upper bound on the rendered side in pixels. Defaults to [`DEFAULT_MAX_IMAGE_SIDE`].
    pub max_image_side: u32,
    pub document: DocumentConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            defaults: GenerationOptions::default(),
            styled_modules: true,
            max_image_side: DEFAULT_MAX_IMAGE_SIDE,
            document: DocumentConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `QR_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Values that fail to parse are logged and
    /// the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let defaults = &mut config.defaults;

        if let Some(size) = parse_var(&lookup, "QR_DEFAULT_SIZE") {
            defaults.size = size;
        }
        if let Some(border) = parse_var(&lookup, "QR_DEFAULT_BORDER") {
            defaults.border = border;
        }
        if let Some(level) = lookup("QR_DEFAULT_ERROR_CORRECTION") {
            defaults.error_correction = QrCodeEcc::from_code(&level);
        }
        if let Some(format) = lookup("QR_DEFAULT_FORMAT") {
            defaults.format = OutputFormat::from_name(&format);
        }
        if let Some(color) = parse_var::<Color, _>(&lookup, "QR_DEFAULT_FOREGROUND") {
            defaults.foreground_color = color;
        }
        if let Some(color) = parse_var::<Color, _>(&lookup, "QR_DEFAULT_BACKGROUND") {
            defaults.background_color = color;
        }
        if let Some(drawer) = lookup("QR_DEFAULT_MODULE_DRAWER") {
            defaults.module_drawer = ModuleDrawer::from_name(&drawer);
        }
        if let Some(path) = lookup("QR_LOGO_PATH").filter(|p| !p.trim().is_empty()) {
            defaults.logo_path = Some(path);
        }
        if let Some(ratio) = parse_var::<f64, _>(&lookup, "QR_LOGO_SIZE_RATIO") {
            if ratio > 0.0 && ratio < 1.0 {
                defaults.logo_size_ratio = ratio;
            } else {
                warn!("Ignoring QR_LOGO_SIZE_RATIO={}, must be between 0 and 1", ratio);
            }
        }
        if defaults.size == 0 {
            warn!("Ignoring QR_DEFAULT_SIZE=0");
            defaults.size = GenerationOptions::default().size;
        }

        if let Some(flag) = lookup("QR_STYLED_MODULES") {
            config.styled_modules = parse_flag(&flag);
        }
        if let Some(max) = parse_var(&lookup, "QR_MAX_IMAGE_SIDE") {
            config.max_image_side = max;
        }
        if let Some(title) = lookup("QR_PDF_TITLE").filter(|t| !t.trim().is_empty()) {
            config.document.title = Some(title);
        }
        if let Some(flag) = lookup("QR_PDF_CAPTION") {
            config.document.caption = parse_flag(&flag);
        }
        config
    }

    pub fn with_defaults(mut self, defaults: GenerationOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Configures the logo asset applied to every raster symbol.
    pub fn with_logo(mut self, path: impl Into<String>) -> Self {
        self.defaults.logo_path = Some(path.into());
        self
    }

    pub fn with_styled_modules(mut self, supported: bool) -> Self {
        self.styled_modules = supported;
        self
    }

    pub fn with_document(mut self, document: DocumentConfig) -> Self {
        self.document = document;
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
