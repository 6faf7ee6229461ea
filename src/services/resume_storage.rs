use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// File storage for uploaded résumés, addressed by relative path strings.
#[async_trait]
pub trait ResumeStorage: Send + Sync {
    /// Stores the file and returns the path recorded on the application.
    async fn store(&self, candidate_id: i64, extension: &str, data: Bytes) -> Result<String>;

    async fn read(&self, path: &str) -> Result<Option<Bytes>>;

    async fn remove(&self, path: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct LocalResumeStorage {
    root: PathBuf,
}

const MAX_NAME_ATTEMPTS: i64 = 16;

impl LocalResumeStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let relative = Path::new(relative);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(Error::BadRequest("Invalid file path".into()));
        }
        Ok(self.root.join(relative))
    }
}

fn relative_path(candidate_id: i64, stamp: i64, extension: &str) -> String {
    format!(
        "cvs/{id}/cv_{id}_{stamp}.{ext}",
        id = candidate_id,
        stamp = stamp,
        ext = extension
    )
}

#[async_trait]
impl ResumeStorage for LocalResumeStorage {
    async fn store(&self, candidate_id: i64, extension: &str, data: Bytes) -> Result<String> {
        let extension = extension.to_ascii_lowercase();
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::BadRequest(format!(
                "File type .{} is not allowed",
                extension
            )));
        }

        let dir = self.root.join("cvs").join(candidate_id.to_string());
        fs::create_dir_all(&dir).await?;

        let base = chrono::Utc::now().timestamp_millis();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let relative = relative_path(candidate_id, base + attempt, &extension);
            let full = self.root.join(&relative);
            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&full)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = file.write_all(&data).await {
                tracing::error!("Failed to write CV file {}: {}", full.display(), e);
                let _ = fs::remove_file(&full).await;
                return Err(Error::Internal(format!("Failed to save file: {}", e)));
            }
            file.flush().await?;

            tracing::debug!(candidate_id, path = %relative, bytes = data.len(), "Stored CV file");
            return Ok(relative);
        }

        Err(Error::Internal(
            "Could not allocate a unique file name for the CV".into(),
        ))
    }

    async fn read(&self, path: &str) -> Result<Option<Bytes>> {
        let full = self.resolve(path)?;
        match fs::read(&full).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
