//! Storage of images attached to posts.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use utoipa::ToSchema;

/// Subdirectory of the media root post images are stored in.
pub const POST_IMAGE_DIR: &str = "posts";

/// An image submitted with the post form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageUpload {
    /// Original file name, e.g. `small.gif`
    pub file_name: String,
    /// Base64 encoded file content
    pub content: String,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("The submitted data was not a file.")]
    Encoding(#[from] base64::DecodeError),
    #[error(
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
    )]
    NotAnImage,
    #[error("Failed to store file: {0}")]
    Io(#[from] std::io::Error),
}

/// Formats accepted as post images.
const ACCEPTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Gif,
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
];

/// Check that `bytes` hold a complete image in one of the accepted
/// formats and return its file extension.
///
/// The whole image is decoded, so a valid header followed by anything
/// else is rejected. This is CPU bound; call it off the async runtime.
pub fn verify_image(bytes: &[u8]) -> Result<&'static str, MediaError> {
    let format = image::guess_format(bytes).map_err(|_| MediaError::NotAnImage)?;
    if !ACCEPTED_FORMATS.contains(&format) {
        debug!("Rejecting image in unsupported format {:?}", format);
        return Err(MediaError::NotAnImage);
    }

    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        debug!("Failed to decode {:?} image: {}", format, e);
        MediaError::NotAnImage
    })?;
    let (width, height) = decoded.dimensions();
    debug!(width, height, "Decoded {:?} image", format);

    Ok(match format {
        ImageFormat::Gif => "gif",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        _ => "jpeg",
    })
}

/// Reduce a client supplied name to a safe file name.
fn clean_file_name(file_name: &str, format: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        format!("image.{}", format)
    } else {
        cleaned.to_string()
    }
}

/// Append a random suffix to the stem of `file_name`.
fn with_suffix(file_name: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..7];
    match file_name.rsplit_once('.') {
        Some((stem, extension)) => format!("{}_{}.{}", stem, suffix, extension),
        None => format!("{}_{}", file_name, suffix),
    }
}

/// Decode and store an uploaded post image under `media_root`.
///
/// Returns the path relative to the media root, e.g. `posts/small.gif`.
/// An existing file of the same name is never overwritten.
pub async fn store_post_image(media_root: &Path, upload: &ImageUpload) -> Result<String, MediaError> {
    let bytes = STANDARD.decode(upload.content.trim())?;
    let (bytes, format) = tokio::task::spawn_blocking(move || {
        verify_image(&bytes).map(|format| (bytes, format))
    })
    .await
    .map_err(std::io::Error::other)??;
    debug!("Received {} image of {} bytes", format, bytes.len());

    let directory = media_root.join(POST_IMAGE_DIR);
    tokio::fs::create_dir_all(&directory).await?;

    let mut file_name = clean_file_name(&upload.file_name, format);
    while tokio::fs::try_exists(directory.join(&file_name)).await? {
        file_name = with_suffix(&file_name);
    }

    tokio::fs::write(directory.join(&file_name), &bytes).await?;
    info!("Stored post image {}/{}", POST_IMAGE_DIR, file_name);

    Ok(format!("{}/{}", POST_IMAGE_DIR, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageOutputFormat;
    use std::io::Cursor;

    const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    fn upload(file_name: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: file_name.to_string(),
            content: STANDARD.encode(bytes),
        }
    }

    fn encode(format: ImageOutputFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image::RgbImage::new(2, 1).write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_verify_image() {
        assert_eq!(verify_image(SMALL_GIF).unwrap(), "gif");
        assert_eq!(verify_image(&encode(ImageOutputFormat::Png)).unwrap(), "png");
        assert_eq!(verify_image(&encode(ImageOutputFormat::Jpeg(80))).unwrap(), "jpeg");
        assert!(matches!(verify_image(b"plain text"), Err(MediaError::NotAnImage)));
    }

    #[test]
    fn test_verify_image_rejects_header_followed_by_garbage() {
        let fake_gif = b"GIF89a<script>alert(1)</script>";
        assert!(matches!(verify_image(fake_gif), Err(MediaError::NotAnImage)));

        let mut truncated_png = encode(ImageOutputFormat::Png);
        truncated_png.truncate(20);
        assert!(matches!(verify_image(&truncated_png), Err(MediaError::NotAnImage)));
    }

    #[test]
    fn test_verify_image_rejects_other_formats() {
        let bmp = encode(ImageOutputFormat::Bmp);
        assert!(matches!(verify_image(&bmp), Err(MediaError::NotAnImage)));
    }

    #[test]
    fn test_clean_file_name() {
        assert_eq!(clean_file_name("small.gif", "gif"), "small.gif");
        assert_eq!(clean_file_name("../../etc/passwd", "gif"), "passwd");
        assert_eq!(clean_file_name("my photo.png", "png"), "my_photo.png");
        assert_eq!(clean_file_name("", "gif"), "image.gif");
    }

    #[tokio::test]
    async fn test_store_post_image() {
        let media_root = tempfile::tempdir().unwrap();

        let path = store_post_image(media_root.path(), &upload("small.gif", SMALL_GIF))
            .await
            .unwrap();

        assert_eq!(path, "posts/small.gif");
        let stored = std::fs::read(media_root.path().join(&path)).unwrap();
        assert_eq!(stored, SMALL_GIF);
    }

    #[tokio::test]
    async fn test_name_collision_gets_suffix() {
        let media_root = tempfile::tempdir().unwrap();
        let first = store_post_image(media_root.path(), &upload("small.gif", SMALL_GIF))
            .await
            .unwrap();

        let second = store_post_image(media_root.path(), &upload("small.gif", SMALL_GIF))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(second.starts_with("posts/small_"));
        assert!(second.ends_with(".gif"));
    }

    #[tokio::test]
    async fn test_rejects_non_images() {
        let media_root = tempfile::tempdir().unwrap();

        let err = store_post_image(media_root.path(), &upload("notes.txt", b"plain text"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NotAnImage));

        let bad = ImageUpload {
            file_name: "small.gif".to_string(),
            content: "not base64!".to_string(),
        };
        let err = store_post_image(media_root.path(), &bad).await.unwrap_err();
        assert!(matches!(err, MediaError::Encoding(_)));
    }
}
