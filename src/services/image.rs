use anyhow::{Context, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use tokio::fs;
use tracing::info;

use crate::config::UploadConfig;

/// Kind of image being stored, used only for log context.
pub enum ImageType {
    Post,
    ProfilePicture,
}

impl ImageType {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::ProfilePicture => "profile_pic",
        }
    }
}

/// Writes uploaded images to the uploads directory.
pub struct ImageService {
    directory: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
        }
    }

    /// Stores `bytes` under a sanitized, collision-free name and returns
    /// that name.
    pub async fn save_upload(
        &self,
        original_name: &str,
        bytes: &[u8],
        image_type: ImageType,
    ) -> Result<String> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory).await?;
        }

        let filename = format!(
            "{}_{}",
            uuid::Uuid::new_v4().simple(),
            secure_filename(original_name)
        );
        let file_path = self.directory.join(&filename);

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(
            kind = image_type.as_str(),
            path = %file_path.display(),
            size = bytes.len(),
            "Stored uploaded image"
        );

        Ok(filename)
    }
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("Invalid regex"))
}

/// Reduces a client-supplied filename to `[A-Za-z0-9_.-]`, with no path
/// components and no leading dots. Falls back to `upload` when nothing
/// survives.
#[must_use]
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name.chars().filter(char::is_ascii).collect();
    let flattened = ascii.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = unsafe_chars().replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My cool photo.jpg"), "My_cool_photo.jpg");
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\pic.png"), "C_Users_me_pic.png");
        assert_eq!(secure_filename("caf\u{e9}.png"), "caf.png");
        assert_eq!(secure_filename(".hidden"), "hidden");
    }

    #[test]
    fn test_secure_filename_fallback() {
        assert_eq!(secure_filename(""), "upload");
        assert_eq!(secure_filename("..."), "upload");
        assert_eq!(secure_filename("\u{1f600}"), "upload");
    }

    #[tokio::test]
    async fn test_save_upload_writes_file() {
        let dir = std::env::temp_dir().join(format!("gramguard-img-{}", uuid::Uuid::new_v4()));
        let config = UploadConfig {
            directory: dir.display().to_string(),
            ..UploadConfig::default()
        };
        let service = ImageService::new(&config);

        let name = service
            .save_upload("sunset.jpg", b"jpegdata", ImageType::Post)
            .await
            .unwrap();

        assert!(name.ends_with("_sunset.jpg"));
        assert_eq!(std::fs::read(dir.join(&name)).unwrap(), b"jpegdata");
        std::fs::remove_dir_all(&dir).ok();
    }
}
