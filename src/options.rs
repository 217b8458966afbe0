//! Generation options: sizes, colors, output format and module style.
//!
//! [`GenerationOptions`] is the fully resolved set used by a single generation.
//! [`OptionsOverride`] is what a caller sends; every key is optional and is laid
//! over the configured defaults with [`GenerationOptions::merged_with`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{QrError, Result};
use crate::qrcode::QrCodeEcc;

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color with explicit RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color (alpha = 255).
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn is_opaque(self) -> bool {
        self.a == 255
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Alpha-blend this color over an opaque backdrop.
    pub fn flatten_onto(self, backdrop: Color) -> Color {
        let alpha = u16::from(self.a);
        let mix = |fg: u8, bg: u8| -> u8 {
            ((u16::from(fg) * alpha + u16::from(bg) * (255 - alpha) + 127) / 255) as u8
        };
        Color::rgb(mix(self.r, backdrop.r), mix(self.g, backdrop.g), mix(self.b, backdrop.b))
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
}

impl FromStr for Color {
    type Err = QrError;

    /// Accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA` and a handful of names.
    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        let named = match value.to_ascii_lowercase().as_str() {
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::rgb(255, 0, 0)),
            "green" => Some(Color::rgb(0, 128, 0)),
            "blue" => Some(Color::rgb(0, 0, 255)),
            "transparent" => Some(Color::TRANSPARENT),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let invalid = || QrError::InvalidOption {
            field: "color",
            reason: format!("unrecognised color {:?}", s),
        };
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let short = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| invalid())
                };
                Ok(Color::rgb(short(0)?, short(1)?, short(2)?))
            }
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Output encoding of the rendered symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Svg,
    Pdf,
}

impl OutputFormat {
    /// Case-insensitive; unknown names fall back to PNG. `JPG` is accepted as JPEG.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "JPEG" | "JPG" => OutputFormat::Jpeg,
            "SVG" => OutputFormat::Svg,
            "PDF" => OutputFormat::Pdf,
            _ => OutputFormat::Png,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Pdf => "application/pdf",
        }
    }

    pub fn is_raster(self) -> bool {
        matches!(self, OutputFormat::Png | OutputFormat::Jpeg)
    }
}

/// Shape used to draw one dark module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleDrawer {
    Square,
    Rounded,
    Circle,
}

impl ModuleDrawer {
    /// Case-insensitive; unknown names fall back to square.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "rounded" => ModuleDrawer::Rounded,
            "circle" => ModuleDrawer::Circle,
            _ => ModuleDrawer::Square,
        }
    }
}

/// Fully resolved options for one generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    /// Pixels per module.
    pub size: u32,
    /// Quiet-zone width in modules.
    pub border: u32,
    pub error_correction: QrCodeEcc,
    pub format: OutputFormat,
    pub foreground_color: Color,
    pub background_color: Color,
    pub module_drawer: ModuleDrawer,
    pub logo_path: Option<String>,
    pub logo_size_ratio: f64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            size: 10,
            border: 4,
            error_correction: QrCodeEcc::Medium,
            format: OutputFormat::Png,
            foreground_color: Color::BLACK,
            background_color: Color::WHITE,
            module_drawer: ModuleDrawer::Square,
            logo_path: None,
            logo_size_ratio: 0.3,
        }
    }
}

impl GenerationOptions {
    /// Lays `overrides` over `self`. Keys present in `overrides` win, the rest keep their
    /// current value.
    ///
    /// # Errors
    ///
    /// Fails with [`QrError::InvalidOption`] for a zero size, a ratio outside (0, 1) or a
    /// color that cannot be parsed. Unknown enum names never fail, they fall back instead.
    pub fn merged_with(&self, overrides: &OptionsOverride) -> Result<Self> {
        let mut merged = self.clone();
        if let Some(size) = overrides.size {
            merged.size = size;
        }
        if let Some(border) = overrides.border {
            merged.border = border;
        }
        if let Some(ref level) = overrides.error_correction {
            merged.error_correction = QrCodeEcc::from_code(level);
        }
        if let Some(ref format) = overrides.format {
            merged.format = OutputFormat::from_name(format);
        }
        if let Some(ref color) = overrides.foreground_color {
            merged.foreground_color = parse_color("foreground_color", color)?;
        }
        if let Some(ref color) = overrides.background_color {
            merged.background_color = parse_color("background_color", color)?;
        }
        if let Some(ref drawer) = overrides.module_drawer {
            merged.module_drawer = ModuleDrawer::from_name(drawer);
        }
        if let Some(ref path) = overrides.logo_path {
            merged.logo_path = Some(path.clone()).filter(|p| !p.trim().is_empty());
        }
        if let Some(ratio) = overrides.logo_size_ratio {
            merged.logo_size_ratio = ratio;
        }
        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(QrError::InvalidOption {
                field: "size",
                reason: "must be a positive integer".into(),
            });
        }
        if !(self.logo_size_ratio > 0.0 && self.logo_size_ratio < 1.0) {
            return Err(QrError::InvalidOption {
                field: "logo_size_ratio",
                reason: format!("{} is not between 0 and 1", self.logo_size_ratio),
            });
        }
        Ok(())
    }

    /// Side of the rendered image in pixels: `(modules + 2 * border) * size`.
    pub fn pixel_side(&self, modules: u32) -> u64 {
        (u64::from(modules) + 2 * u64::from(self.border)).saturating_mul(u64::from(self.size))
    }
}

fn parse_color(field: &'static str, value: &str) -> Result<Color> {
    value.parse::<Color>().map_err(|err| match err {
        QrError::InvalidOption { reason, .. } => QrError::InvalidOption { field, reason },
        other => other,
    })
}

/// Caller-supplied options. Absent keys keep the configured defaults; unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptionsOverride {
    pub size: Option<u32>,
    pub border: Option<u32>,
    pub error_correction: Option<String>,
    pub format: Option<String>,
    pub foreground_color: Option<String>,
    pub background_color: Option<String>,
    pub module_drawer: Option<String>,
    pub logo_path: Option<String>,
    pub logo_size_ratio: Option<f64>,
}

impl OptionsOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_error_correction(mut self, level: impl Into<String>) -> Self {
        self.error_correction = Some(level.into());
        self
    }

    pub fn with_colors(
        mut self,
        foreground: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        self.foreground_color = Some(foreground.into());
        self.background_color = Some(background.into());
        self
    }

    pub fn with_module_drawer(mut self, drawer: impl Into<String>) -> Self {
        self.module_drawer = Some(drawer.into());
        self
    }

    pub fn with_geometry(mut self, size: u32, border: u32) -> Self {
        self.size = Some(size);
        self.border = Some(border);
        self
    }

    pub fn with_logo(mut self, path: impl Into<String>, ratio: f64) -> Self {
        self.logo_path = Some(path.into());
        self.logo_size_ratio = Some(ratio);
        self
    }
}
