//! Drawing payload decoding.
//!
//! The panel submits its canvas as a `data:` URL. Anything else is kept as
//! the raw JSON value.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::GenericImageView;
use serde_json::Value;
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// PNG file signature.
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

// ============================================================================
// Drawing
// ============================================================================

/// A decoded drawing image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawing {
    /// MIME type from the data URL, e.g. `image/png`.
    pub mime: String,
    /// Decoded image bytes.
    pub bytes: Vec<u8>,
}

impl Drawing {
    /// Decodes a base64 `data:` URL.
    ///
    /// Returns `None` for anything that is not a base64 data URL.
    #[must_use]
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.trim().strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime = meta.strip_suffix(";base64")?;
        let bytes = STANDARD.decode(payload).ok()?;

        Some(Self {
            mime: if mime.is_empty() {
                "text/plain".to_string()
            } else {
                mime.to_string()
            },
            bytes,
        })
    }

    /// Returns `true` if the bytes carry a PNG signature.
    #[inline]
    #[must_use]
    pub fn is_png(&self) -> bool {
        self.bytes.starts_with(PNG_SIGNATURE)
    }

    /// Decodes the image header and returns `(width, height)`.
    ///
    /// Returns `None` if the bytes are not a PNG or JPEG image.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match image::load_from_memory(&self.bytes) {
            Ok(img) => Some(img.dimensions()),
            Err(e) => {
                debug!(mime = %self.mime, error = %e, "Drawing is not a decodable image");
                None
            }
        }
    }
}

// ============================================================================
// DrawingCapture
// ============================================================================

/// What came back from a drawing request.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingCapture {
    /// A decodable image.
    Image(Drawing),
    /// Any other payload, untouched.
    Raw(Value),
}

impl DrawingCapture {
    /// Interprets a `drawing_complete` payload.
    ///
    /// Accepts a bare data URL string or an object with an `image` field.
    #[must_use]
    pub fn from_value(data: Value) -> Self {
        let url = data
            .as_str()
            .or_else(|| data.get("image").and_then(Value::as_str));

        match url.and_then(Drawing::from_data_url) {
            Some(drawing) => Self::Image(drawing),
            None => Self::Raw(data),
        }
    }

    /// Returns the decoded image, if any.
    #[inline]
    #[must_use]
    pub fn image(&self) -> Option<&Drawing> {
        match self {
            Self::Image(drawing) => Some(drawing),
            Self::Raw(_) => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
