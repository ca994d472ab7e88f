//! Input acquisition: turn an upload or a clipboard paste into an
//! [`InputDocument`].
//!
//! Two checks gate every input. The extension must name a supported format,
//! and the leading bytes must match that format's signature. Checking the
//! content as well as the name means a renamed `.gif` or a truncated download
//! is refused here with a clear message instead of surfacing later as an
//! opaque engine failure.

use crate::error::WebUiError;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Input formats the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Png,
    Jpg,
    Jpeg,
    Pdf,
    Tiff,
    Bmp,
}

/// Every supported format, in display order.
pub const SUPPORTED_FORMATS: [InputFormat; 6] = [
    InputFormat::Png,
    InputFormat::Jpg,
    InputFormat::Jpeg,
    InputFormat::Pdf,
    InputFormat::Tiff,
    InputFormat::Bmp,
];

impl InputFormat {
    /// Match a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(InputFormat::Png),
            "jpg" => Some(InputFormat::Jpg),
            "jpeg" => Some(InputFormat::Jpeg),
            "pdf" => Some(InputFormat::Pdf),
            "tiff" | "tif" => Some(InputFormat::Tiff),
            "bmp" => Some(InputFormat::Bmp),
            _ => None,
        }
    }

    /// Identify a format from its leading bytes.
    ///
    /// JPEG content always sniffs as [`InputFormat::Jpg`].
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(InputFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(InputFormat::Jpg)
        } else if bytes.starts_with(b"%PDF") {
            Some(InputFormat::Pdf)
        } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            Some(InputFormat::Tiff)
        } else if bytes.starts_with(b"BM") {
            Some(InputFormat::Bmp)
        } else {
            None
        }
    }

    /// Whether `bytes` carry this format's signature.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        match (self, Self::sniff(bytes)) {
            (InputFormat::Jpg | InputFormat::Jpeg, Some(InputFormat::Jpg)) => true,
            (expected, Some(found)) => *expected == found,
            (_, None) => false,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            InputFormat::Png => "png",
            InputFormat::Jpg => "jpg",
            InputFormat::Jpeg => "jpeg",
            InputFormat::Pdf => "pdf",
            InputFormat::Tiff => "tiff",
            InputFormat::Bmp => "bmp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            InputFormat::Png => "image/png",
            InputFormat::Jpg | InputFormat::Jpeg => "image/jpeg",
            InputFormat::Pdf => "application/pdf",
            InputFormat::Tiff => "image/tiff",
            InputFormat::Bmp => "image/bmp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InputFormat::Png => "PNG",
            InputFormat::Jpg => "JPG",
            InputFormat::Jpeg => "JPEG",
            InputFormat::Pdf => "PDF",
            InputFormat::Tiff => "TIFF",
            InputFormat::Bmp => "BMP",
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, InputFormat::Pdf)
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Comma-separated list of supported extensions for messages and the
/// `accept` attribute.
pub fn supported_list() -> String {
    SUPPORTED_FORMATS
        .iter()
        .map(|f| f.extension())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Name given to clipboard images.
pub const PASTED_STEM: &str = "pasted_image";

/// A validated input file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDocument {
    name: String,
    format: InputFormat,
    bytes: Vec<u8>,
}

impl InputDocument {
    /// Accept a user-selected file.
    ///
    /// `file_name` may carry a client-side path (`C:\fakepath\scan.png`);
    /// only the final component is kept.
    pub fn from_upload(
        file_name: &str,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, WebUiError> {
        let name = base_name(file_name);
        check_size(&name, bytes.len(), max_bytes)?;

        let format = extension_of(&name)
            .and_then(InputFormat::from_extension)
            .ok_or_else(|| {
                warn!("Rejected upload '{}': unsupported extension", name);
                WebUiError::UnsupportedFormat {
                    name: name.clone(),
                    supported: supported_list(),
                }
            })?;

        if !format.matches(&bytes) {
            warn!("Rejected upload '{}': content is not {}", name, format);
            return Err(WebUiError::ContentMismatch {
                name,
                declared: format.label(),
            });
        }

        debug!("Accepted upload '{}' ({}, {} bytes)", name, format, bytes.len());
        Ok(Self {
            name,
            format,
            bytes,
        })
    }

    /// Accept image data pasted from the clipboard.
    ///
    /// Clipboard payloads carry no file name, so the format comes from the
    /// content alone. Only image formats are accepted.
    pub fn from_paste(bytes: Vec<u8>, max_bytes: usize) -> Result<Self, WebUiError> {
        let placeholder = format!("{PASTED_STEM}.png");
        check_size(&placeholder, bytes.len(), max_bytes)?;

        let format = InputFormat::sniff(&bytes)
            .filter(InputFormat::is_image)
            .ok_or_else(|| {
                warn!("Rejected paste: clipboard data is not a supported image");
                WebUiError::UnsupportedFormat {
                    name: "clipboard data".to_string(),
                    supported: supported_list(),
                }
            })?;

        let name = format!("{PASTED_STEM}.{}", format.extension());
        debug!("Accepted paste as '{}' ({} bytes)", name, bytes.len());
        Ok(Self {
            name,
            format,
            bytes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => &self.name,
        }
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn check_size(name: &str, size: usize, max_bytes: usize) -> Result<(), WebUiError> {
    if size == 0 {
        return Err(WebUiError::EmptyInput {
            name: name.to_string(),
        });
    }
    if size > max_bytes {
        return Err(WebUiError::InputTooLarge {
            name: name.to_string(),
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

fn base_name(file_name: &str) -> String {
    let trimmed = file_name.trim();
    let last = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    if last.is_empty() {
        "upload".to_string()
    } else {
        last.to_string()
    }
}

fn extension_of(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1024 * 1024;

    fn sample(format: InputFormat) -> Vec<u8> {
        let mut bytes = match format {
            InputFormat::Png => b"\x89PNG\r\n\x1a\n".to_vec(),
            InputFormat::Jpg | InputFormat::Jpeg => vec![0xFF, 0xD8, 0xFF, 0xE0],
            InputFormat::Pdf => b"%PDF-1.7\n".to_vec(),
            InputFormat::Tiff => b"II*\0".to_vec(),
            InputFormat::Bmp => b"BM".to_vec(),
        };
        bytes.extend_from_slice(&[0u8; 16]);
        bytes
    }

    #[test]
    fn every_supported_extension_accepted() {
        for format in SUPPORTED_FORMATS {
            let name = format!("scan.{}", format.extension());
            let doc = InputDocument::from_upload(&name, sample(format), LIMIT)
                .unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(doc.format(), format);
        }
    }

    #[test]
    fn extension_is_case_insensitive() {
        let doc = InputDocument::from_upload("SCAN.PNG", sample(InputFormat::Png), LIMIT).unwrap();
        assert_eq!(doc.format(), InputFormat::Png);
        let doc = InputDocument::from_upload("page.TIF", sample(InputFormat::Tiff), LIMIT).unwrap();
        assert_eq!(doc.format(), InputFormat::Tiff);
    }

    #[test]
    fn unsupported_extensions_rejected() {
        for name in ["anim.gif", "notes.txt", "noextension", "trailingdot."] {
            let err = InputDocument::from_upload(name, b"GIF89a....".to_vec(), LIMIT).unwrap_err();
            assert!(
                matches!(err, WebUiError::UnsupportedFormat { .. }),
                "{name}: {err:?}"
            );
        }
    }

    #[test]
    fn renamed_file_rejected() {
        let err = InputDocument::from_upload("fake.png", b"GIF89a....".to_vec(), LIMIT).unwrap_err();
        assert!(matches!(err, WebUiError::ContentMismatch { declared: "PNG", .. }));
    }

    #[test]
    fn jpg_and_jpeg_share_signature() {
        assert!(InputFormat::Jpeg.matches(&sample(InputFormat::Jpg)));
        assert!(InputFormat::Jpg.matches(&sample(InputFormat::Jpeg)));
    }

    #[test]
    fn empty_and_oversize_rejected() {
        let err = InputDocument::from_upload("a.png", Vec::new(), LIMIT).unwrap_err();
        assert!(matches!(err, WebUiError::EmptyInput { .. }));
        let err = InputDocument::from_upload("a.png", sample(InputFormat::Png), 4).unwrap_err();
        assert!(matches!(err, WebUiError::InputTooLarge { limit: 4, .. }));
    }

    #[test]
    fn client_path_stripped() {
        let doc =
            InputDocument::from_upload(r"C:\fakepath\receipt.jpeg", sample(InputFormat::Jpeg), LIMIT)
                .unwrap();
        assert_eq!(doc.name(), "receipt.jpeg");
        assert_eq!(doc.stem(), "receipt");
    }

    #[test]
    fn paste_sniffs_image_format() {
        let doc = InputDocument::from_paste(sample(InputFormat::Png), LIMIT).unwrap();
        assert_eq!(doc.name(), "pasted_image.png");
        let doc = InputDocument::from_paste(sample(InputFormat::Bmp), LIMIT).unwrap();
        assert_eq!(doc.name(), "pasted_image.bmp");
    }

    #[test]
    fn paste_rejects_pdf_and_garbage() {
        assert!(InputDocument::from_paste(sample(InputFormat::Pdf), LIMIT).is_err());
        assert!(InputDocument::from_paste(b"hello world".to_vec(), LIMIT).is_err());
    }

    #[test]
    fn supported_list_text() {
        assert_eq!(supported_list(), "png, jpg, jpeg, pdf, tiff, bmp");
    }
}
