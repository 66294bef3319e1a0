//! Supporting documents
//!
//! The domain only keeps opaque [`AttachmentHandle`]s on a claim. Bytes are
//! handed to a [`BlobStore`] which enforces the [`AttachmentPolicy`] and
//! returns the handle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use uuid::Uuid;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable};

use crate::error::ClaimError;

/// 5 MiB
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Opaque reference to a stored document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentHandle(String);

impl AttachmentHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh handle that keeps the document's extension
    pub fn generate(extension: &str) -> Self {
        Self(format!("{}.{}", Uuid::new_v4(), extension))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file as received from the caller
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Extension and size rules for supporting documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentPolicy {
    /// Lower-case extensions without the dot
    pub allowed_extensions: Vec<String>,
    pub max_bytes: u64,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["pdf".to_string(), "docx".to_string(), "xlsx".to_string()],
            max_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

impl AttachmentPolicy {
    /// Checks a file against the policy, returning its normalized extension
    pub fn check(&self, file_name: &str, size: u64) -> Result<String, ClaimError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| ClaimError::file_rejected(file_name, "missing file extension"))?;

        if !self.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(ClaimError::file_rejected(
                file_name,
                format!(
                    "invalid file type .{}, allowed: {}",
                    extension,
                    self.allowed_extensions.join(", ")
                ),
            ));
        }
        if size == 0 {
            return Err(ClaimError::file_rejected(file_name, "file is empty"));
        }
        if size > self.max_bytes {
            return Err(ClaimError::file_rejected(
                file_name,
                format!("file too large ({} KB), max {} KB", size / 1024, self.max_bytes / 1024),
            ));
        }
        Ok(extension)
    }
}

/// Storage for supporting documents
#[async_trait]
pub trait BlobStore: DomainPort + HealthCheckable {
    /// The policy this store enforces
    fn policy(&self) -> &AttachmentPolicy;

    /// Validates and stores one file
    ///
    /// Fails with `FileRejected` when the policy refuses the file and with
    /// `Unavailable` when the backend fails.
    async fn store(&self, upload: &Upload) -> Result<AttachmentHandle, ClaimError>;
}

/// Per-file result of an upload batch
#[derive(Debug, Default)]
pub struct AttachmentUploadReport {
    pub accepted: Vec<StoredAttachment>,
    pub rejected: Vec<RejectedAttachment>,
}

impl AttachmentUploadReport {
    /// Handles of the accepted files, in upload order
    pub fn handles(&self) -> Vec<AttachmentHandle> {
        self.accepted.iter().map(|a| a.handle.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct StoredAttachment {
    pub file_name: String,
    pub handle: AttachmentHandle,
}

#[derive(Debug)]
pub struct RejectedAttachment {
    pub file_name: String,
    pub error: ClaimError,
}

/// In-memory blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    policy: AttachmentPolicy,
    blobs: RwLock<HashMap<AttachmentHandle, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new(policy: AttachmentPolicy) -> Self {
        Self {
            policy,
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the stored bytes for a handle
    pub async fn get(&self, handle: &AttachmentHandle) -> Option<Vec<u8>> {
        self.blobs.read().await.get(handle).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl DomainPort for MemoryBlobStore {}

#[async_trait]
impl HealthCheckable for MemoryBlobStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("memory-blob-store")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    async fn store(&self, upload: &Upload) -> Result<AttachmentHandle, ClaimError> {
        let extension = self.policy.check(&upload.file_name, upload.size())?;
        let handle = AttachmentHandle::generate(&extension);
        self.blobs
            .write()
            .await
            .insert(handle.clone(), upload.bytes.clone());
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_is_case_insensitive() {
        let policy = AttachmentPolicy::default();
        assert_eq!(policy.check("Timesheet.PDF", 10).unwrap(), "pdf");
    }

    #[test]
    fn test_policy_rejections() {
        let policy = AttachmentPolicy::default();
        assert!(policy.check("virus.exe", 10).is_err());
        assert!(policy.check("no_extension", 10).is_err());
        assert!(policy.check("empty.pdf", 0).is_err());
        assert!(policy.check("big.xlsx", DEFAULT_MAX_ATTACHMENT_BYTES + 1).is_err());
        assert!(policy.check("limit.xlsx", DEFAULT_MAX_ATTACHMENT_BYTES).is_ok());
    }

    #[tokio::test]
    async fn test_memory_store_keeps_extension() {
        let store = MemoryBlobStore::default();
        let handle = store.store(&Upload::new("hours.docx", b"data".to_vec())).await.unwrap();
        assert!(handle.as_str().ends_with(".docx"));
        assert_eq!(store.get(&handle).await.unwrap(), b"data".to_vec());
    }
}
