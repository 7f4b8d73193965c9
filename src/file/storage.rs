//! Physical content storage for depot.
//!
//! Objects live flat under a single storage root, named by a random UUID
//! plus the validated extension. Display names never reach the disk.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::{DepotError, Result};

/// Fixed copy buffer size. Memory use per upload is independent of the
/// object size.
const COPY_BUFFER_SIZE: usize = 8 * 1024;

/// Content store writing opaque-named objects under a storage root.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given root directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    /// Get the storage root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generate a new opaque stored name for the given extension.
    pub fn generate_stored_name(ext: &str) -> String {
        format!("{}.{}", Uuid::new_v4(), ext)
    }

    /// Get the full path of a stored object.
    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }

    /// Stream a reader into the object `stored_name`.
    ///
    /// Bytes are copied through a fixed-size buffer and counted
    /// incrementally; the moment the count exceeds `limit` the copy stops
    /// with `PayloadTooLarge`. I/O faults surface as `StorageWrite`. On
    /// any error the partial object is left on disk and the caller must
    /// invoke [`delete`](Self::delete) before propagating.
    ///
    /// Returns the number of bytes written.
    pub async fn write<R>(&self, stored_name: &str, reader: &mut R, limit: u64) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| DepotError::StorageWrite(e.to_string()))?;

        let path = self.path_of(stored_name);
        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| DepotError::StorageWrite(e.to_string()))?;

        let mut buf = [0u8; COPY_BUFFER_SIZE];
        let mut written: u64 = 0;

        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| DepotError::StorageWrite(e.to_string()))?;
            if n == 0 {
                break;
            }

            written += n as u64;
            if written > limit {
                return Err(DepotError::PayloadTooLarge {
                    size: written,
                    limit,
                });
            }

            file.write_all(&buf[..n])
                .await
                .map_err(|e| DepotError::StorageWrite(e.to_string()))?;
        }

        file.flush()
            .await
            .map_err(|e| DepotError::StorageWrite(e.to_string()))?;

        Ok(written)
    }

    /// Load the full content of a stored object.
    pub async fn load(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(stored_name);

        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DepotError::NotFound(format!("file object {stored_name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read up to `max` leading bytes of a stored object.
    ///
    /// Used for magic-byte signature checks without loading the whole
    /// object.
    pub async fn read_head(&self, stored_name: &str, max: usize) -> Result<Vec<u8>> {
        let path = self.path_of(stored_name);

        let mut file = match fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DepotError::NotFound(format!("file object {stored_name}")))
            }
            Err(e) => return Err(e.into()),
        };

        let mut head = vec![0u8; max];
        let mut filled = 0;
        while filled < max {
            let n = file.read(&mut head[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        head.truncate(filled);

        Ok(head)
    }

    /// Delete a stored object.
    ///
    /// Deleting an absent object is not an error; returns `true` if an
    /// object was actually removed.
    pub async fn delete(&self, stored_name: &str) -> Result<bool> {
        let path = self.path_of(stored_name);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a stored object exists.
    pub fn exists(&self, stored_name: &str) -> bool {
        self.path_of(stored_name).exists()
    }
}
