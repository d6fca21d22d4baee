//! Workshop logo decoding.
//!
//! The browser uploads the logo as a `data:image/<type>;base64,<payload>` URI.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use tracing::warn;

use crate::error::{Error, Result};

/// A decoded logo image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    /// Image subtype from the data URI, e.g. `png` or `jpeg`.
    pub kind: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl Logo {
    /// Read a logo from an image file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let kind = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("png")
            .to_ascii_lowercase();
        Ok(Self {
            kind,
            bytes: std::fs::read(path)?,
        })
    }
}

/// Decode an image data URI.
///
/// # Errors
///
/// Returns [`Error::InvalidLogo`] when the input is not an image data URI or
/// its payload is not valid base64.
pub fn decode_data_uri(uri: &str) -> Result<Logo> {
    let rest = uri
        .strip_prefix("data:image/")
        .ok_or_else(|| Error::invalid_logo("not an image data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::invalid_logo("data URI has no payload"))?;

    let mut params = header.split(';');
    let kind = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(Error::invalid_logo("data URI has no image type"));
    }
    if !params.any(|p| p.trim() == "base64") {
        return Err(Error::invalid_logo("data URI is not base64 encoded"));
    }

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| Error::invalid_logo(e.to_string()))?;
    if bytes.is_empty() {
        return Err(Error::invalid_logo("data URI payload is empty"));
    }

    Ok(Logo { kind, bytes })
}

/// The logo carried by an order, if there is a usable one.
///
/// Blank input, the placeholder and malformed URIs all yield `None`; the
/// latter two are logged.
#[must_use]
pub fn order_logo(data: &str) -> Option<Logo> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    match decode_data_uri(data) {
        Ok(logo) => Some(logo),
        Err(e) => {
            warn!(error = %e, "Ignoring unusable logo");
            None
        }
    }
}
