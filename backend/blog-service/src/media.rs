//! Storage for uploaded post images
//!
//! Files are written below `<media root>/posts/` under a unique name; the
//! returned path is relative to the media root and is what posts store.
use std::io;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use crate::forms::ValidatedImage;

const UPLOAD_DIR: &str = "posts";
const MAX_STEM_CHARS: usize = 40;

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist `image` and return its path relative to the media root.
    pub async fn save_image(&self, image: &ValidatedImage) -> io::Result<String> {
        let extension = image
            .format
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("img");
        let name = format!(
            "{}_{}.{}",
            &Uuid::new_v4().simple().to_string()[..12],
            sanitize_stem(&image.filename),
            extension
        );
        let relative = format!("{}/{}", UPLOAD_DIR, name);

        let dir = self.root.join(UPLOAD_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), &image.bytes).await?;

        info!(path = %relative, size = image.bytes.len(), "Stored uploaded image");
        Ok(relative)
    }
}

/// File stem reduced to ASCII alphanumerics, `-` and `_`.
fn sanitize_stem(filename: &str) -> String {
    let base = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let stem = base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base);
    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_STEM_CHARS)
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("cat.png"), "cat");
        assert_eq!(sanitize_stem("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_stem("C:\\Users\\me\\my photo!.jpg"), "myphoto");
        assert_eq!(sanitize_stem("котик.png"), "image");
    }

    #[tokio::test]
    async fn test_save_image_writes_under_posts() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        let image = ValidatedImage {
            filename: "small.png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
            format: ImageFormat::Png,
        };

        let relative = storage.save_image(&image).await.unwrap();
        assert!(relative.starts_with("posts/"));
        assert!(relative.ends_with("_small.png"));

        let written = std::fs::read(dir.path().join(&relative)).unwrap();
        assert_eq!(written, image.bytes);
    }
}
