use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    constants::{IMAGE_FORMATS, RECIPE_IMAGE_DIR},
    error::ApiError,
};

#[derive(Debug, PartialEq)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Decodes `data:image/<fmt>;base64,<payload>`.
pub fn decode_data_url(value: &str) -> Result<DecodedImage, ApiError> {
    let invalid = || ApiError::validation("image", "Expected a base64 encoded image data URL");

    let rest = value.trim().strip_prefix("data:image/").ok_or_else(invalid)?;
    let (format, payload) = rest.split_once(";base64,").ok_or_else(invalid)?;

    let extension = IMAGE_FORMATS
        .iter()
        .find_map(|(f, ext)| f.eq_ignore_ascii_case(format).then_some(*ext))
        .ok_or_else(|| {
            ApiError::validation("image", format!("Unsupported image format '{format}'"))
        })?;

    let bytes = STANDARD.decode(payload.trim()).map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(ApiError::validation("image", "The submitted image is empty"));
    }

    Ok(DecodedImage { extension, bytes })
}

/// Writes a data URL image under the media root and returns its relative path.
pub async fn store_image(media_root: &Path, value: &str) -> Result<String, ApiError> {
    let image = decode_data_url(value)?;

    let relative = format!(
        "{RECIPE_IMAGE_DIR}/{}.{}",
        uuid::Uuid::new_v4(),
        image.extension
    );
    let target: PathBuf = media_root.join(&relative);

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to create {parent:?}: {e}")))?;
    }
    tokio::fs::write(&target, &image.bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to write {target:?}: {e}")))?;

    log::debug!("> Stored image {relative} ({} bytes)", image.bytes.len());
    Ok(relative)
}

pub async fn remove_image(media_root: &Path, relative: &str) {
    if relative.is_empty() {
        return;
    }
    if let Err(e) = tokio::fs::remove_file(media_root.join(relative)).await {
        log::warn!("Failed to remove image {relative}: {e}");
    }
}

/// Public URL of a stored image; an empty path stays empty.
pub fn image_url(media_url: &str, relative: &str) -> String {
    if relative.is_empty() {
        return String::new();
    }
    format!("{}/{}", media_url.trim_end_matches('/'), relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent png
    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn decodes_png_data_url() {
        let image = decode_data_url(&format!("data:image/png;base64,{PIXEL}")).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn jpeg_is_stored_as_jpg() {
        let image = decode_data_url(&format!("data:image/jpeg;base64,{PIXEL}")).unwrap();
        assert_eq!(image.extension, "jpg");
    }

    #[test]
    fn rejects_non_data_urls_and_unknown_formats() {
        assert!(decode_data_url("https://example.com/a.png").is_err());
        assert!(decode_data_url(&format!("data:image/tiff;base64,{PIXEL}")).is_err());
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
        assert!(decode_data_url("data:image/png;base64,").is_err());
    }

    #[tokio::test]
    async fn stores_and_removes_image() {
        let root = std::env::temp_dir().join(format!("foodgram-media-{}", uuid::Uuid::new_v4()));

        let relative = store_image(&root, &format!("data:image/png;base64,{PIXEL}"))
            .await
            .unwrap();
        assert!(relative.starts_with(RECIPE_IMAGE_DIR));
        assert!(root.join(&relative).exists());

        remove_image(&root, &relative).await;
        assert!(!root.join(&relative).exists());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[test]
    fn urls_join_with_single_slash() {
        assert_eq!(
            image_url("/media/", "recipes/images/a.png"),
            "/media/recipes/images/a.png"
        );
        assert_eq!(image_url("/media", ""), "");
    }
}
