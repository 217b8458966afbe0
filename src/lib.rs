//! # qrkit
//!
//! A Rust library for turning structured data into styled QR codes.
//!
//! `qrkit` formats semantic payloads (URLs, contact cards, WiFi credentials, locations and
//! more) into the strings scanners expect, encodes them as QR Code Model 2 symbols and renders
//! them as PNG, JPEG, SVG or PDF. Every result comes back as a base64 data URI inside a
//! serializable envelope, ready to hand to a web client.
//!
//! ## Features
//!
//! - Eight payload kinds: URL, text, email, phone, SMS, vCard 3.0, WiFi and geo location.
//! - Versions 1 to 40 and four error correction levels (Low, Medium, Quartile, High).
//! - PNG, JPEG, SVG and single-page PDF output.
//! - Custom colors, square, rounded or circular modules and a centred logo.
//! - Stateless generation: identical requests give byte-identical output.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrkit = "0.2"
//! ```
//!
//! ## Example
//!
//! Generate a WiFi code as SVG:
//!
//! ```rust
//! use qrkit::{OptionsOverride, QrGenerator, Wifi};
//!
//! let generator = QrGenerator::default();
//! let result = generator.generate_wifi(
//!     Wifi::new("Cafe", "secret1"),
//!     &OptionsOverride::new().with_format("svg"),
//! );
//! assert!(result.success);
//! assert_eq!(result.content, "WIFI:T:WPA;S:Cafe;P:secret1;;");
//! assert!(result.qr_code.unwrap().starts_with("data:image/svg+xml;base64,"));
//! ```
//!
//! Serve a JSON request:
//!
//! ```rust
//! use qrkit::api::{handle_json, Endpoint};
//! use qrkit::QrGenerator;
//!
//! let generator = QrGenerator::from_env();
//! let endpoint = Endpoint::from_path("/api/v1/qr/url").unwrap();
//! let (status, response) = handle_json(&generator, endpoint, r#"{"url": "example.com"}"#);
//! assert_eq!(status, 200);
//! assert!(response.success);
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: Core QR code encoding functionality.
//! - [`payload`]: Canonical payload strings.
//! - [`options`]: Rendering options, their defaults and how overrides merge.
//! - [`render`]: Raster, SVG and PDF output.
//! - [`generator`]: The end-to-end generation call and its result.
//! - [`api`]: JSON request and response contract.
//! - [`config`]: Process-wide configuration read from the environment.

pub mod api;
pub mod config;
pub mod error;
pub mod generator;
pub mod options;
pub mod payload;
pub mod qrcode;
pub mod render;

pub use config::{DocumentConfig, GeneratorConfig};
pub use error::{QrError, Result};
pub use generator::{GenerationResult, QrGenerator};
pub use options::{Color, GenerationOptions, ModuleDrawer, OptionsOverride, OutputFormat};
pub use payload::{Email, Location, Payload, Sms, VCard, Wifi};
pub use qrcode::{QrCodeEcc, QrMatrix};
