use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::mood_entry::voice_note_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVoiceNote {
    pub filename: String,
    pub url: String,
}

/// Uploaded audio files on local disk, named `{uuid}.{ext}`.
#[derive(Debug, Clone)]
pub struct VoiceStorage {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
    max_bytes: usize,
}

impl VoiceStorage {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.upload_dir.clone(),
            allowed_extensions: config.allowed_audio_extensions.clone(),
            max_bytes: config.max_upload_bytes,
        }
    }

    /// Creates the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Lowercased extension of `original_name` if it is on the allow-list.
    pub fn accepted_extension(&self, original_name: &str) -> Option<String> {
        let (_, ext) = original_name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        self.allowed_extensions.contains(&ext).then_some(ext)
    }

    /// Writes an upload under a fresh random name, keeping only the
    /// original extension.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> AppResult<StoredVoiceNote> {
        if original_name.is_empty() {
            return Err(AppError::Validation("No file selected".into()));
        }
        let ext = self.accepted_extension(original_name).ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid file type. Allowed: {}",
                self.allowed_extensions.join(", ")
            ))
        })?;
        if bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Voice note exceeds {} bytes",
                self.max_bytes
            )));
        }

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to store voice note: {}", e)))?;

        tracing::info!(filename = %filename, bytes = bytes.len(), "Stored voice note");
        Ok(StoredVoiceNote {
            url: voice_note_url(&filename),
            filename,
        })
    }

    /// Reads a stored voice note. Names that could not have been issued by
    /// [`VoiceStorage::save`] are reported as missing without touching disk.
    pub async fn read(&self, filename: &str) -> AppResult<Vec<u8>> {
        if !self.is_issued_name(filename) {
            return Err(AppError::NotFound("Voice file not found".into()));
        }

        match tokio::fs::read(self.dir.join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("Voice file not found".into()))
            }
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "failed to read voice note: {}",
                e
            ))),
        }
    }

    fn is_issued_name(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((stem, ext)) => {
                Uuid::parse_str(stem).is_ok()
                    && self.allowed_extensions.iter().any(|allowed| allowed == ext)
            }
            None => false,
        }
    }
}

/// MIME type for an allowed audio extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn storage(dir: &Path) -> VoiceStorage {
        VoiceStorage::new(&Config {
            upload_dir: dir.to_path_buf(),
            max_upload_bytes: 16,
            ..Config::default()
        })
    }

    #[test]
    fn test_accepted_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path());
        assert_eq!(storage.accepted_extension("note.WAV").as_deref(), Some("wav"));
        assert_eq!(storage.accepted_extension("a.b.m4a").as_deref(), Some("m4a"));
        assert_eq!(storage.accepted_extension("clip.flac"), None);
        assert_eq!(storage.accepted_extension("noextension"), None);
        assert_eq!(storage.accepted_extension("evil.mp3.exe"), None);
    }

    #[tokio::test]
    async fn test_save_and_read_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path());

        let stored = storage.save("memo.mp3", b"ID3fake").await.unwrap();
        assert!(stored.filename.ends_with(".mp3"));
        assert_eq!(stored.url, format!("/voice/{}", stored.filename));
        assert_eq!(storage.read(&stored.filename).await.unwrap(), b"ID3fake");
    }

    #[tokio::test]
    async fn test_save_issues_distinct_names() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path());

        let mut names = HashSet::new();
        for _ in 0..20 {
            let stored = storage.save("same.ogg", b"x").await.unwrap();
            assert!(names.insert(stored.filename));
        }
    }

    #[tokio::test]
    async fn test_save_rejects_bad_type_and_empty_name() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path());

        assert!(matches!(
            storage.save("script.sh", b"x").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(storage.save("", b"x").await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_save_rejects_oversized() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path());

        let result = storage.save("big.wav", &[0u8; 17]).await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
    }

    #[tokio::test]
    async fn test_read_missing_and_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path());

        let missing = format!("{}.wav", Uuid::new_v4());
        assert!(matches!(storage.read(&missing).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            storage.read("../Cargo.toml").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(storage.read("passwd").await, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("a.wav"), "audio/wav");
        assert_eq!(content_type_for("a"), "application/octet-stream");
    }
}
