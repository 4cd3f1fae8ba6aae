use crate::models::ExtractedResumeData;
use anyhow::{Context, Result};
use std::path::PathBuf;
use uuid::Uuid;

/// Flat-file store for uploaded resume files and derived extracted-data
/// documents. Filenames are derived from the owning (user, resume) pair;
/// raw files additionally carry a timestamp and a random suffix so two
/// uploads within the same clock tick cannot collide.
pub struct ArtifactStore {
    upload_dir: PathBuf,
    extracted_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(upload_dir: impl Into<PathBuf>, extracted_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            extracted_dir: extracted_dir.into(),
        }
    }

    /// Map an upload content type to its stored file kind. Anything outside
    /// the allow-list is rejected by callers before any write happens.
    pub fn kind_for_content_type(content_type: &str) -> Option<&'static str> {
        match content_type {
            "application/pdf" => Some("pdf"),
            "image/png" => Some("png"),
            "image/jpeg" => Some("jpg"),
            _ => None,
        }
    }

    pub fn allowed_kinds() -> [&'static str; 3] {
        ["pdf", "png", "jpg"]
    }

    pub async fn save_raw_file(
        &self,
        user_id: &str,
        resume_id: &str,
        content: &[u8],
        kind: &str,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .context("Failed to create upload directory")?;

        let suffix = Uuid::new_v4().simple().to_string();
        let filename = format!(
            "{}_{}_{}_{}.{}",
            user_id,
            resume_id,
            chrono::Utc::now().timestamp(),
            &suffix[..8],
            kind
        );
        let path = self.upload_dir.join(filename);

        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write upload to {}", path.display()))?;

        Ok(path)
    }

    pub async fn save_extracted(
        &self,
        user_id: &str,
        resume_id: &str,
        data: &ExtractedResumeData,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.extracted_dir)
            .await
            .context("Failed to create extracted-data directory")?;

        let path = self
            .extracted_dir
            .join(format!("{}_{}_extracted.json", user_id, resume_id));

        let json = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write extracted data to {}", path.display()))?;

        Ok(path)
    }

    /// Read a persisted extracted-data document. A missing or unreadable
    /// file is a cache miss, not an error.
    pub async fn read_extracted(&self, path: &str) -> Option<ExtractedResumeData> {
        let bytes = tokio::fs::read(path).await.ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Best-effort removal; a missing target is not an error.
    pub async fn remove(&self, path: &str) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove artifact {}: {}", path, e);
            }
        }
    }
}
