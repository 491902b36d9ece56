//! Storage for images attached to posts.

use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["gif", "jpg", "jpeg", "png", "webp", "bmp"];
const POSTS_DIR: &str = "posts";

pub const EMPTY_FILE: &str = "The submitted file is empty.";
pub const NOT_AN_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// A file field pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Check that the upload looks like an image and return its extension.
    pub fn image_extension(&self) -> Result<String, &'static str> {
        if self.bytes.is_empty() {
            return Err(EMPTY_FILE);
        }

        let ext = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
            .ok_or(NOT_AN_IMAGE)?;

        let guessed = mime_guess::from_ext(&ext).first_or_octet_stream();
        let declared_ok = self
            .content_type
            .as_deref()
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(true);
        if guessed.type_() != mime_guess::mime::IMAGE || !declared_ok {
            return Err(NOT_AN_IMAGE);
        }

        Ok(ext)
    }
}

/// Write an image under `<root>/posts/` and return its path relative to `root`.
pub async fn save_image(root: &Path, upload: &Upload) -> std::io::Result<String> {
    let ext = upload
        .image_extension()
        .map_err(|msg| std::io::Error::new(std::io::ErrorKind::InvalidInput, msg))?;

    let dir = root.join(POSTS_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let name = format!("{}.{}", uuid::Uuid::now_v7(), ext);
    tokio::fs::write(dir.join(&name), &upload.bytes).await?;

    let relative = format!("{}/{}", POSTS_DIR, name);
    tracing::debug!("Stored upload {} as {}", upload.file_name, relative);
    Ok(relative)
}

/// Remove a stored image. A file that is already gone is not an error.
pub async fn remove_image(root: &Path, relative: &str) -> std::io::Result<()> {
    let Some(path) = resolve(root, relative) else {
        return Ok(());
    };
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Join a stored relative path onto the media root, refusing anything that
/// would escape it.
fn resolve(root: &Path, relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    let plain = rel
        .components()
        .all(|c| matches!(c, std::path::Component::Normal(_)));
    if plain {
        Some(root.join(rel))
    } else {
        None
    }
}
