//! Response assembly: options merge, then formatter, encoder and renderer in turn.

use log::{debug, error};
use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::options::{GenerationOptions, OptionsOverride, OutputFormat};
use crate::payload::{Email, Location, Payload, Sms, VCard, Wifi};
use crate::qrcode::QrMatrix;
use crate::render::{self, RenderedCode};

/// Outcome of one generation.
///
/// On success `qr_code`, `format` and `options` are set. On failure `error` carries the
/// message and `qr_code` is `None`; `content` is always the canonical payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub success: bool,
    /// The output as a base64 data URI.
    pub qr_code: Option<String>,
    pub content: String,
    /// Format actually produced. A PDF request that had to degrade reports PNG here.
    pub format: Option<OutputFormat>,
    pub options: Option<GenerationOptions>,
    pub error: Option<String>,
}

impl GenerationResult {
    fn success(content: String, options: GenerationOptions, rendered: RenderedCode) -> Self {
        GenerationResult {
            success: true,
            qr_code: Some(rendered.to_data_uri()),
            content,
            format: Some(rendered.format),
            options: Some(options),
            error: None,
        }
    }

    fn failure(content: String, options: Option<GenerationOptions>, message: String) -> Self {
        GenerationResult {
            success: false,
            qr_code: None,
            content,
            format: None,
            options,
            error: Some(message),
        }
    }
}

/// Stateless QR generator. Holds only its immutable configuration, so one instance can be
/// shared between threads and every call is independent of every other.
#[derive(Debug, Clone, Default)]
pub struct QrGenerator {
    config: GeneratorConfig,
}

impl QrGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        QrGenerator { config }
    }

    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Formats the payload, encodes it and renders it with the merged options.
    ///
    /// Never panics on bad input and never returns `Err`: every failure is folded into a
    /// result with `success == false`.
    pub fn generate(&self, payload: &Payload, overrides: &OptionsOverride) -> GenerationResult {
        let content = payload.to_content();
        debug!("Generating {} QR code ({} bytes)", payload.kind(), content.len());
        self.generate_content(content, overrides)
    }

    /// Same as [`generate`](Self::generate) for an already formatted payload string.
    pub fn generate_content(
        &self,
        content: impl Into<String>,
        overrides: &OptionsOverride,
    ) -> GenerationResult {
        let content = content.into();
        let options = match self.config.defaults.merged_with(overrides) {
            Ok(options) => options,
            Err(err) => {
                error!("Rejected QR options: {}", err);
                return GenerationResult::failure(content, None, err.to_string());
            }
        };
        match self.encode_and_render(&content, &options) {
            Ok(rendered) => GenerationResult::success(content, options, rendered),
            Err(err) => {
                error!("Error generating QR code: {}", err);
                GenerationResult::failure(content, Some(options), err.to_string())
            }
        }
    }

    fn encode_and_render(&self, content: &str, options: &GenerationOptions) -> Result<RenderedCode> {
        let qr = QrMatrix::encode_text(content, options.error_correction)?;
        debug!(
            "Encoded version {} at level {} with mask {}",
            qr.version().value(),
            options.error_correction.code(),
            qr.mask().value()
        );
        render::render(&qr, options, content, &self.config)
    }

    pub fn generate_url(&self, url: &str, overrides: &OptionsOverride) -> GenerationResult {
        self.generate(&Payload::Url(url.to_string()), overrides)
    }

    pub fn generate_text(&self, text: &str, overrides: &OptionsOverride) -> GenerationResult {
        self.generate(&Payload::Text(text.to_string()), overrides)
    }

    pub fn generate_email(&self, email: Email, overrides: &OptionsOverride) -> GenerationResult {
        self.generate(&Payload::Email(email), overrides)
    }

    pub fn generate_phone(&self, phone: &str, overrides: &OptionsOverride) -> GenerationResult {
        self.generate(&Payload::Phone(phone.to_string()), overrides)
    }

    pub fn generate_sms(&self, sms: Sms, overrides: &OptionsOverride) -> GenerationResult {
        self.generate(&Payload::Sms(sms), overrides)
    }

    pub fn generate_vcard(&self, card: VCard, overrides: &OptionsOverride) -> GenerationResult {
        self.generate(&Payload::VCard(card), overrides)
    }

    pub fn generate_wifi(&self, wifi: Wifi, overrides: &OptionsOverride) -> GenerationResult {
        self.generate(&Payload::Wifi(wifi), overrides)
    }

    pub fn generate_location(
        &self,
        location: Location,
        overrides: &OptionsOverride,
    ) -> GenerationResult {
        self.generate(&Payload::Location(location), overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::{max_byte_capacity, QrCodeEcc};

    #[test]
    fn test_wifi_scenario() {
        let generator = QrGenerator::default();
        let result = generator.generate_wifi(Wifi::new("Cafe", "secret1"), &OptionsOverride::new());
        assert!(result.success);
        assert_eq!(result.content, "WIFI:T:WPA;S:Cafe;P:secret1;;");
        assert_eq!(result.format, Some(OutputFormat::Png));
        assert!(result.qr_code.unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_location_scenario() {
        let generator = QrGenerator::default();
        let result = generator.generate_location(
            Location::from_degrees(40.7128, -74.0060),
            &OptionsOverride::new().with_format("svg"),
        );
        assert!(result.success);
        assert_eq!(result.content, "geo:40.7128,-74.006");
        assert_eq!(result.format, Some(OutputFormat::Svg));
    }

    #[test]
    fn test_options_echoed() {
        let generator = QrGenerator::default();
        let overrides = OptionsOverride::new().with_error_correction("q").with_geometry(4, 2);
        let result = generator.generate_text("echo", &overrides);
        let options = result.options.unwrap();
        assert_eq!(options.error_correction, QrCodeEcc::Quartile);
        assert_eq!(options.size, 4);
        assert_eq!(options.border, 2);
        assert_eq!(options.format, OutputFormat::Png);
    }

    #[test]
    fn test_capacity_failure_is_reported() {
        let generator = QrGenerator::default();
        let text = "x".repeat(max_byte_capacity(QrCodeEcc::High) + 1);
        let result = generator.generate_text(&text, &OptionsOverride::new().with_error_correction("H"));
        assert!(!result.success);
        assert!(result.qr_code.is_none());
        assert!(result.error.unwrap().contains("too large"));
        assert_eq!(result.content, text);
    }

    #[test]
    fn test_invalid_option_is_reported() {
        let generator = QrGenerator::default();
        let result = generator.generate_text("x", &OptionsOverride::new().with_colors("nope", "#fff"));
        assert!(!result.success);
        assert!(result.options.is_none());
        assert!(result.error.unwrap().contains("foreground_color"));
    }

    #[test]
    fn test_identical_calls_are_byte_identical() {
        let generator = QrGenerator::default();
        for format in ["png", "jpeg", "svg", "pdf"] {
            let overrides = OptionsOverride::new().with_format(format).with_module_drawer("rounded");
            let a = generator.generate_url("example.com", &overrides);
            let b = generator.generate_url("example.com", &overrides);
            assert!(a.success);
            assert_eq!(a.qr_code, b.qr_code);
        }
    }

    #[test]
    fn test_configured_defaults_apply() {
        let config = GeneratorConfig::default().with_defaults(GenerationOptions {
            format: OutputFormat::Svg,
            ..GenerationOptions::default()
        });
        let generator = QrGenerator::new(config);
        let result = generator.generate_phone("+1555", &OptionsOverride::new());
        assert_eq!(result.content, "tel:+1555");
        assert_eq!(result.format, Some(OutputFormat::Svg));
    }
}
