//! Local filesystem blob store
//!
//! Supporting documents are written under a single upload directory with a
//! generated `<uuid>.<ext>` name; the name is the attachment handle.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable};
use domain_claims::{AttachmentHandle, AttachmentPolicy, BlobStore, ClaimError, Upload};

/// Blob store that keeps documents in a local directory
#[derive(Debug, Clone)]
pub struct FileSystemBlobStore {
    root: PathBuf,
    policy: AttachmentPolicy,
}

impl FileSystemBlobStore {
    pub fn new(root: impl Into<PathBuf>, policy: AttachmentPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a stored document
    pub fn path_of(&self, handle: &AttachmentHandle) -> PathBuf {
        self.root.join(handle.as_str())
    }
}

impl DomainPort for FileSystemBlobStore {}

#[async_trait]
impl HealthCheckable for FileSystemBlobStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let (status, message) = match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => (AdapterHealth::Healthy, None),
            Ok(_) => (
                AdapterHealth::Unhealthy,
                Some(format!("{} is not a directory", self.root.display())),
            ),
            // created lazily on first upload
            Err(_) => (
                AdapterHealth::Degraded,
                Some(format!("{} does not exist yet", self.root.display())),
            ),
        };
        HealthCheckResult {
            adapter_id: "filesystem-blob-store".to_string(),
            status,
            latency_ms: start.elapsed().as_millis() as u64,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl BlobStore for FileSystemBlobStore {
    fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    #[instrument(skip(self, upload), fields(file = %upload.file_name, size = upload.size()))]
    async fn store(&self, upload: &Upload) -> Result<AttachmentHandle, ClaimError> {
        let extension = self.policy.check(&upload.file_name, upload.size())?;
        let handle = AttachmentHandle::generate(&extension);

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            error!(root = %self.root.display(), error = %e, "Cannot create upload directory");
            ClaimError::Unavailable(format!("attachment storage unavailable: {}", e))
        })?;
        tokio::fs::write(self.path_of(&handle), &upload.bytes)
            .await
            .map_err(|e| {
                error!(handle = %handle, error = %e, "Cannot write attachment");
                ClaimError::Unavailable(format!("attachment storage unavailable: {}", e))
            })?;

        debug!(handle = %handle, "Attachment stored");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_file_under_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemBlobStore::new(dir.path().join("uploads"), AttachmentPolicy::default());

        let handle = store
            .store(&Upload::new("Timesheet March.PDF", b"%PDF-1.7".to_vec()))
            .await
            .unwrap();

        assert!(handle.as_str().ends_with(".pdf"));
        assert!(!handle.as_str().contains("Timesheet"));
        let written = tokio::fs::read(store.path_of(&handle)).await.unwrap();
        assert_eq!(written, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_rejected_file_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemBlobStore::new(dir.path(), AttachmentPolicy::default());

        let err = store
            .store(&Upload::new("script.sh", b"echo".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::FileRejected { .. }));
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_health_degraded_before_first_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemBlobStore::new(dir.path().join("later"), AttachmentPolicy::default());
        assert_eq!(store.health_check().await.status, AdapterHealth::Degraded);
    }
}
