//! Recipe images sent as base64 `data:` URIs.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Extensions a stored image may carry.
const EXTENSIONS: &[&str] = &["png", "jpg", "gif", "webp"];

#[derive(Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

impl DecodedImage {
    /// Content-addressed file name, so re-uploading the same image reuses it.
    pub fn filename(&self) -> String {
        format!("{}.{}", blake3::hash(&self.bytes).to_hex(), self.extension)
    }
}

/// Decodes `data:image/<type>;base64,<payload>`.
///
/// Returns the message to show the client when the URI is not an accepted image.
pub fn decode_data_uri(uri: &str) -> Result<DecodedImage, &'static str> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or("Expected a base64 encoded data URI.")?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or("Expected a base64 encoded data URI.")?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or("Expected a base64 encoded data URI.")?;

    let extension = match media_type.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => return Err("Unsupported image type."),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| "Image data is not valid base64.")?;
    if bytes.is_empty() {
        return Err("Image data is empty.");
    }

    Ok(DecodedImage { bytes, extension })
}

/// Whether `filename` looks like a name produced by [`DecodedImage::filename`].
pub fn is_image_filename(filename: &str) -> bool {
    match filename.split_once('.') {
        Some((stem, ext)) => {
            stem.len() == 64
                && stem.chars().all(|c| c.is_ascii_hexdigit())
                && EXTENSIONS.contains(&ext)
        }
        None => false,
    }
}
