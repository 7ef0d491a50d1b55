use service_core::error::AppError;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Staging area for uploaded images awaiting relay to the model.
///
/// Every staged file is scoped to a single request and removed when its
/// [`StagedFile`] guard drops, whichever way the request ends.
#[derive(Clone)]
pub struct UploadStaging {
    base_path: PathBuf,
}

impl UploadStaging {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    /// Persist an upload under a collision-resistant name:
    /// `<uuid-v4>_<sanitized original name>`.
    pub async fn stage(&self, original_name: &str, data: Vec<u8>) -> Result<StagedFile, AppError> {
        let unique_name = format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_name));
        let path = self.base_path.join(&unique_name);
        fs::write(&path, data).await?;
        Ok(StagedFile { path, unique_name })
    }
}

/// Exclusive handle to one staged upload. Dropping the handle deletes the
/// file, so the staged input is removed on every exit path, early returns
/// and panics included.
pub struct StagedFile {
    path: PathBuf,
    unique_name: String,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// Name part before the first dot, used to derive the download name
    /// of the generated asset.
    pub fn download_stem(&self) -> &str {
        self.unique_name
            .split('.')
            .next()
            .unwrap_or(&self.unique_name)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove staged upload"
                );
            }
        }
    }
}

/// Reduce a client-supplied filename to a safe single path component:
/// path separators are stripped, anything outside `[A-Za-z0-9._-]`
/// becomes `_`, and leading/trailing dots and underscores are trimmed.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned.trim_matches(|c: char| c == '.' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> PathBuf {
        PathBuf::from(format!("target/test-staging-{}", Uuid::new_v4()))
    }

    #[test]
    fn sanitize_keeps_simple_names() {
        assert_eq!(sanitize_filename("cat.png"), "cat.png");
        assert_eq!(sanitize_filename("my-photo_01.jpeg"), "my-photo_01.jpeg");
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd.png"), "passwd.png");
        assert_eq!(sanitize_filename("C:\\temp\\shot.jpg"), "shot.jpg");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_filename(".hidden.png"), "hidden.png");
    }

    #[tokio::test]
    async fn staged_file_is_removed_on_drop() {
        let dir = test_dir();
        let staging = UploadStaging::new(&dir).await.unwrap();

        let staged = staging.stage("cat.png", vec![1, 2, 3]).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn staged_names_are_unique_for_identical_uploads() {
        let dir = test_dir();
        let staging = UploadStaging::new(&dir).await.unwrap();

        let a = staging.stage("cat.png", vec![0; 8]).await.unwrap();
        let b = staging.stage("cat.png", vec![0; 8]).await.unwrap();
        assert_ne!(a.path(), b.path());
        assert_ne!(a.unique_name(), b.unique_name());

        drop(a);
        drop(b);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn download_stem_cuts_at_first_dot() {
        let dir = test_dir();
        let staging = UploadStaging::new(&dir).await.unwrap();

        let staged = staging.stage("cat.png", vec![0; 8]).await.unwrap();
        assert!(!staged.download_stem().contains('.'));
        assert!(staged.unique_name().starts_with(staged.download_stem()));

        drop(staged);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
