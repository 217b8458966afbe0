//! Error types for QR generation.

use thiserror::Error;

use crate::qrcode::DataTooLong;

/// Errors produced by the generation pipeline.
///
/// Logo and document errors never reach a caller: the renderer logs them and degrades to
/// a simpler output instead.
#[derive(Debug, Error)]
pub enum QrError {
    /// The payload does not fit any QR version at the requested error correction level.
    #[error("payload too large for a QR code: {0}")]
    DataTooLong(#[from] DataTooLong),

    #[error("invalid option `{field}`: {reason}")]
    InvalidOption { field: &'static str, reason: String },

    #[error("rendered image would be {side}px wide, limit is {max}px")]
    ImageTooLarge { side: u64, max: u32 },

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF assembly failed: {0}")]
    Document(String),

    #[error("logo could not be applied: {0}")]
    Logo(String),
}

impl QrError {
    /// True for capacity errors: the payload itself is too large.
    pub fn is_capacity(&self) -> bool {
        matches!(self, QrError::DataTooLong(_))
    }
}

impl From<lopdf::Error> for QrError {
    fn from(err: lopdf::Error) -> Self {
        QrError::Document(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QrError>;
