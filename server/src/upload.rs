//! Multipart image uploads

use axum::extract::Multipart;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Extensions accepted where uploads are filtered by file type
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

fn human_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let bytes = bytes as f64;
    let (value, unit) = if bytes >= KIB * KIB {
        (bytes / (KIB * KIB), "MB")
    } else {
        (bytes / KIB, "KB")
    };

    // One decimal, dropping a trailing ".0"
    let formatted = format!("{:.1}", value);
    let trimmed = formatted.strip_suffix(".0").unwrap_or(&formatted);
    format!("{}{}", trimmed, unit)
}

fn has_allowed_extension(filename: &str, allowed: &[&str]) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| allowed.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Pull the `image` field out of a multipart body.
///
/// The size cap is enforced while streaming, so nothing larger than
/// `max_bytes` is ever buffered or decoded. With `allowed_extensions` set the
/// client filename must carry one of them.
pub async fn read_image(
    multipart: &mut Multipart,
    max_bytes: usize,
    allowed_extensions: Option<&[&str]>,
) -> ApiResult<ImageUpload> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        if filename.as_deref() == Some("") {
            return Err(ApiError::bad_request("No selected file"));
        }
        if let Some(allowed) = allowed_extensions {
            let ok = filename
                .as_deref()
                .map(|name| has_allowed_extension(name, allowed))
                .unwrap_or(false);
            if !ok {
                return Err(ApiError::bad_request(
                    "Invalid file type. Please upload PNG or JPG images only.",
                ));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(ApiError::bad_request(format!(
                    "File too large. Please upload an image smaller than {}.",
                    human_size(max_bytes)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(ApiError::bad_request("Uploaded image is empty"));
        }
        debug!("Received upload {:?} ({} bytes)", filename, bytes.len());
        return Ok(ImageUpload { filename, bytes });
    }

    Err(ApiError::bad_request("No image file provided"))
}
