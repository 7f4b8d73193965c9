//! File service for depot.
//!
//! Orchestrates the upload, download and delete pipelines over the
//! validation policy, content store, metadata repository and storage
//! accounting.

use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::warn;

use crate::analytics::{EventRepository, NewEvent, EVENT_FILE_DOWNLOADED};
use crate::db::Database;
use crate::{DepotError, Result};

use super::access::authorize_file_access;
use super::accounting::Accounting;
use super::inspect::{ContentInspector, NoopInspector};
use super::metadata::{FileRepository, NewStoredFile, StoredFile};
use super::storage::FileStorage;
use super::validation::{sanitize_filename, UploadPolicy};

/// How many leading bytes the signature check reads.
const SIGNATURE_HEAD_BYTES: usize = 8192;

/// Result of a file download.
#[derive(Debug)]
pub struct Download {
    /// File metadata (display name, content type, size).
    pub file: StoredFile,
    /// File content.
    pub content: Vec<u8>,
}

/// High-level file operations: upload, list, download, delete.
pub struct FileService {
    db: Database,
    storage: FileStorage,
    policy: UploadPolicy,
    inspector: Arc<dyn ContentInspector>,
}

impl FileService {
    /// Create a new FileService.
    ///
    /// Content-signature verification defaults to the fail-open no-op
    /// inspector; pass a real one via [`with_inspector`](Self::with_inspector).
    pub fn new(db: Database, storage: FileStorage, policy: UploadPolicy) -> Self {
        Self {
            db,
            storage,
            policy,
            inspector: Arc::new(NoopInspector),
        }
    }

    /// Replace the content inspector selected at startup.
    pub fn with_inspector(mut self, inspector: Arc<dyn ContentInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Get the validation policy.
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Get the content store.
    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Upload a payload that is already in memory.
    ///
    /// The size gate runs before any disk write; otherwise identical to
    /// [`upload`](Self::upload).
    pub async fn upload_bytes(
        &self,
        owner_id: i64,
        filename: Option<&str>,
        content_type: Option<&str>,
        content: &[u8],
    ) -> Result<StoredFile> {
        let filename = require_filename(filename)?;
        self.policy.validate_size(content.len() as u64)?;

        self.upload_validated(owner_id, filename, content_type, &mut std::io::Cursor::new(content))
            .await
    }

    /// Upload from a byte stream of unknown length.
    ///
    /// The ceiling is enforced incrementally during the streaming copy,
    /// so a single request cannot grow the disk past the limit; a partial
    /// object left by an aborted copy is deleted before the error
    /// propagates.
    pub async fn upload<R>(
        &self,
        owner_id: i64,
        filename: Option<&str>,
        content_type: Option<&str>,
        reader: &mut R,
    ) -> Result<StoredFile>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let filename = require_filename(filename)?;
        self.upload_validated(owner_id, filename, content_type, reader)
            .await
    }

    /// The shared tail of the upload pipeline: sanitize, gate the
    /// extension, stream to disk, verify the signature, then persist the
    /// metadata row, the accounting delta and the upload event as one
    /// transaction. Every failure after the disk write deletes the
    /// just-written object before propagating, so disk and database can
    /// only diverge toward "orphaned object", and only transiently.
    async fn upload_validated<R>(
        &self,
        owner_id: i64,
        filename: &str,
        content_type: Option<&str>,
        reader: &mut R,
    ) -> Result<StoredFile>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let safe_name = sanitize_filename(filename);
        let ext = self.policy.validate_extension(&safe_name)?;

        let stored_name = FileStorage::generate_stored_name(&ext);
        let size = match self
            .storage
            .write(&stored_name, reader, self.policy.max_file_size())
            .await
        {
            Ok(size) => size,
            Err(e) => {
                self.cleanup(&stored_name).await;
                return Err(e);
            }
        };

        if let Err(e) = self.verify_signature(&stored_name, &ext).await {
            self.cleanup(&stored_name).await;
            return Err(e);
        }

        match self
            .persist(owner_id, &safe_name, &stored_name, content_type, size)
            .await
        {
            Ok(file) => Ok(file),
            Err(e) => {
                self.cleanup(&stored_name).await;
                Err(e)
            }
        }
    }

    async fn verify_signature(&self, stored_name: &str, ext: &str) -> Result<()> {
        let head = self.storage.read_head(stored_name, SIGNATURE_HEAD_BYTES).await?;
        self.inspector.verify(&head, ext)
    }

    /// Steps 7 and 8 of the upload pipeline, as one transaction.
    async fn persist(
        &self,
        owner_id: i64,
        safe_name: &str,
        stored_name: &str,
        content_type: Option<&str>,
        size: u64,
    ) -> Result<StoredFile> {
        let path = self.storage.path_of(stored_name).to_string_lossy().into_owned();

        let mut new_file = NewStoredFile::new(stored_name, safe_name, owner_id, path, size as f64);
        if let Some(ct) = content_type {
            new_file = new_file.with_content_type(ct);
        }

        let mut tx = self.db.pool().begin().await?;

        let file = FileRepository::create(&mut *tx, &new_file).await?;
        Accounting::record_upload(&mut tx, owner_id, file.id, file.size, content_type).await?;

        tx.commit().await?;

        Ok(file)
    }

    /// Remove a partially-written or now-unwanted object; failures are
    /// logged, not propagated, so the original error wins.
    async fn cleanup(&self, stored_name: &str) {
        if let Err(e) = self.storage.delete(stored_name).await {
            warn!("failed to clean up storage object {}: {}", stored_name, e);
        }
    }

    /// Get a file's metadata, enforcing existence then ownership.
    pub async fn get(&self, file_id: i64, requester_id: i64) -> Result<StoredFile> {
        let file = FileRepository::get_by_id(self.db.pool(), file_id)
            .await?
            .ok_or_else(|| DepotError::NotFound("file".to_string()))?;
        authorize_file_access(&file, requester_id)?;
        Ok(file)
    }

    /// List the requester's own files, most recent first.
    pub async fn list(&self, owner_id: i64, offset: i64, limit: i64) -> Result<Vec<StoredFile>> {
        FileRepository::list_by_owner(self.db.pool(), owner_id, offset, limit).await
    }

    /// Download a file.
    ///
    /// Existence is checked before ownership; a metadata row whose disk
    /// object has gone missing is a 404, not a crash. Appends a
    /// `file_downloaded` event; no accounting mutation.
    pub async fn download(&self, file_id: i64, requester_id: i64) -> Result<Download> {
        let file = self.get(file_id, requester_id).await?;

        if !self.storage.exists(&file.stored_name) {
            return Err(DepotError::NotFound("file on disk".to_string()));
        }

        let content = self.storage.load(&file.stored_name).await?;

        let event = NewEvent::new(EVENT_FILE_DOWNLOADED)
            .with_user(requester_id)
            .with_details(serde_json::json!({ "file_id": file.id }));
        EventRepository::record(self.db.pool(), &event).await?;

        Ok(Download { file, content })
    }

    /// Delete a file.
    ///
    /// Disk removal is best-effort and happens outside the transaction: a
    /// missing or undeletable disk object is logged and the metadata
    /// removal proceeds regardless. Row deletion, the accounting
    /// decrement and the `file_deleted` event are one transaction.
    pub async fn delete(&self, file_id: i64, requester_id: i64) -> Result<()> {
        let file = self.get(file_id, requester_id).await?;

        match self.storage.delete(&file.stored_name).await {
            Ok(true) => {}
            Ok(false) => warn!("disk object {} was already missing", file.stored_name),
            Err(e) => warn!(
                "failed to delete disk object {}, removing metadata anyway: {}",
                file.stored_name, e
            ),
        }

        let mut tx = self.db.pool().begin().await?;

        let deleted = FileRepository::delete(&mut *tx, file.id).await?;
        if !deleted {
            return Err(DepotError::NotFound("file".to_string()));
        }
        Accounting::record_removal(&mut tx, file.owner_id, file.id, file.size).await?;

        tx.commit().await?;

        Ok(())
    }
}

fn require_filename(filename: Option<&str>) -> Result<&str> {
    match filename {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(DepotError::MissingFilename),
    }
}
