use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::{
    models::{PersonId, StoredProof},
    AppError, AppResult,
};

/// Durable storage for proof images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, person_id: PersonId, date: NaiveDate, bytes: &[u8]) -> AppResult<StoredProof>;
    /// `None` when nothing is stored under `key`.
    async fn load(&self, key: &str) -> AppResult<Option<Vec<u8>>>;
}

/// Builds the storage key `YYYY/MM/DD/<person>_<uuid>.<ext>` and the content digest.
pub fn proof_key(person_id: PersonId, date: NaiveDate, bytes: &[u8]) -> StoredProof {
    let extension = image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("bin");

    StoredProof {
        key: format!(
            "{:04}/{:02}/{:02}/{}_{}.{}",
            date.year(),
            date.month(),
            date.day(),
            person_id,
            Uuid::new_v4().simple(),
            extension
        ),
        sha256: hex::encode(Sha256::digest(bytes)),
    }
}

/// Stores images under a root directory on the local filesystem.
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, person_id: PersonId, date: NaiveDate, bytes: &[u8]) -> AppResult<StoredProof> {
        let proof = proof_key(person_id, date, bytes);
        let path = self.root.join(&proof.key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                tracing::error!(error = %e, path = %parent.display(), "Failed to create proof directory");
                AppError::Internal(format!("Failed to store proof image: {}", e))
            })?;
        }

        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), person_id, "Failed to write proof image");
            AppError::Internal(format!("Failed to store proof image: {}", e))
        })?;

        tracing::debug!(person_id, key = %proof.key, "Proof image stored");
        Ok(proof)
    }

    async fn load(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let relative = Path::new(key);
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(AppError::Validation(format!("Invalid proof key '{}'", key)));
        }

        match tokio::fs::read(self.root.join(relative)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::error!(error = %e, key, "Failed to read proof image");
                Err(AppError::Internal(format!("Failed to read proof image: {}", e)))
            }
        }
    }
}

#[cfg(test)]
pub use memory::MemoryImageStore;
