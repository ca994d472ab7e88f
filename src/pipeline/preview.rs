//! Preview encoding: input image → downscaled base64 PNG `data:` URI.
//!
//! Browsers cannot show TIFF and render huge scans slowly, so every image is
//! decoded, shrunk to fit [`PREVIEW_MAX_SIDE`], and re-encoded as PNG. PNG
//! keeps text edges crisp, which is what the user checks before running OCR.
//! PDFs are not rasterised; they get a textual placeholder.

use crate::error::WebUiError;
use crate::pipeline::input::{InputDocument, InputFormat};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

/// Longest side of a preview image, in pixels.
pub const PREVIEW_MAX_SIDE: u32 = 1280;

/// What the page shows under "Preview".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preview {
    /// Decoded image, ready for an `<img src=…>`.
    Image {
        data_uri: String,
        width: u32,
        height: u32,
    },
    /// Non-image document; only a description is shown.
    Document { label: String },
}

/// Build the preview for an accepted input.
///
/// An image that carries a valid signature but fails to decode is refused
/// as unsupported content.
pub fn build_preview(doc: &InputDocument) -> Result<Preview, WebUiError> {
    let Some(decoder_format) = image_format(doc.format()) else {
        return Ok(Preview::Document {
            label: format!("{} document, {}", doc.format(), human_size(doc.len())),
        });
    };

    let img = image::load_from_memory_with_format(doc.bytes(), decoder_format).map_err(|e| {
        WebUiError::UndecodableImage {
            name: doc.name().to_string(),
            detail: e.to_string(),
        }
    })?;
    let (width, height) = (img.width(), img.height());

    let img = if width > PREVIEW_MAX_SIDE || height > PREVIEW_MAX_SIDE {
        img.thumbnail(PREVIEW_MAX_SIDE, PREVIEW_MAX_SIDE)
    } else {
        img
    };

    let data_uri = encode_png_data_uri(&img).map_err(|e| WebUiError::UndecodableImage {
        name: doc.name().to_string(),
        detail: e.to_string(),
    })?;

    Ok(Preview::Image {
        data_uri,
        width,
        height,
    })
}

/// Encode an image as `data:image/png;base64,…`.
pub fn encode_png_data_uri(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded preview → {} bytes base64", b64.len());

    Ok(format!("data:image/png;base64,{b64}"))
}

fn image_format(format: InputFormat) -> Option<image::ImageFormat> {
    match format {
        InputFormat::Png => Some(image::ImageFormat::Png),
        InputFormat::Jpg | InputFormat::Jpeg => Some(image::ImageFormat::Jpeg),
        InputFormat::Tiff => Some(image::ImageFormat::Tiff),
        InputFormat::Bmp => Some(image::ImageFormat::Bmp),
        InputFormat::Pdf => None,
    }
}

pub fn human_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encoded(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 0, 0])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format)
            .expect("encode should succeed");
        buf
    }

    #[test]
    fn every_image_format_previews() {
        for (name, format) in [
            ("a.png", image::ImageFormat::Png),
            ("a.jpg", image::ImageFormat::Jpeg),
            ("a.jpeg", image::ImageFormat::Jpeg),
            ("a.tiff", image::ImageFormat::Tiff),
            ("a.bmp", image::ImageFormat::Bmp),
        ] {
            let doc = InputDocument::from_upload(name, encoded(8, 6, format), usize::MAX).unwrap();
            match build_preview(&doc).unwrap_or_else(|e| panic!("{name}: {e}")) {
                Preview::Image {
                    data_uri,
                    width,
                    height,
                } => {
                    assert!(data_uri.starts_with("data:image/png;base64,"));
                    assert_eq!((width, height), (8, 6));
                }
                other => panic!("{name}: expected image preview, got {other:?}"),
            }
        }
    }

    #[test]
    fn large_image_is_downscaled() {
        let doc = InputDocument::from_upload(
            "big.png",
            encoded(PREVIEW_MAX_SIDE * 2, 10, image::ImageFormat::Png),
            usize::MAX,
        )
        .unwrap();
        let Preview::Image { data_uri, width, .. } = build_preview(&doc).unwrap() else {
            panic!("expected image preview");
        };
        // Reported size is the original; the encoded thumbnail is smaller.
        assert_eq!(width, PREVIEW_MAX_SIDE * 2);
        let b64 = data_uri.trim_start_matches("data:image/png;base64,");
        let png = STANDARD.decode(b64).expect("valid base64");
        let thumb = image::load_from_memory(&png).unwrap();
        assert!(thumb.width() <= PREVIEW_MAX_SIDE);
    }

    #[test]
    fn pdf_gets_placeholder() {
        let doc = InputDocument::from_upload("doc.pdf", b"%PDF-1.4\n%%EOF".to_vec(), usize::MAX)
            .unwrap();
        match build_preview(&doc).unwrap() {
            Preview::Document { label } => assert!(label.starts_with("PDF document"), "{label}"),
            other => panic!("expected placeholder, got {other:?}"),
        }
    }

    #[test]
    fn truncated_png_is_rejected() {
        let mut bytes = encoded(4, 4, image::ImageFormat::Png);
        bytes.truncate(20);
        let doc = InputDocument::from_upload("broken.png", bytes, usize::MAX).unwrap();
        assert!(matches!(
            build_preview(&doc),
            Err(WebUiError::UndecodableImage { .. })
        ));
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(10), "10 bytes");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
