use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{BlobStore, BoxReader};

const READ_CHUNK: usize = 64 * 1024;

/// Blob store backed by a local directory.
///
/// Layout is `{root}/{shard}/{leaf}` where `shard` is the first hash byte.
/// Writes land in `{root}/.tmp` first and are renamed into place, so a reader
/// never observes a partially written blob.
pub struct FilesystemBlobStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    pub async fn new(root: impl Into<PathBuf>, max_size: u64) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root, max_size })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.root.join(hash.shard()).join(hash.leaf())
    }

    fn staging_path(&self) -> PathBuf {
        self.root.join(".tmp").join(uuid::Uuid::new_v4().to_string())
    }

    /// Move a fully written staging file to its content address.
    async fn promote(&self, staging: &Path, hash: &ContentHash) -> Result<(), StorageError> {
        let target = self.blob_path(hash);
        if fs::try_exists(&target).await? {
            let _ = fs::remove_file(staging).await;
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Err(e) = fs::rename(staging, &target).await {
            let _ = fs::remove_file(staging).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(&self, mut reader: BoxReader) -> Result<ContentHash, StorageError> {
        let staging = self.staging_path();
        let mut file = fs::File::create(&staging).await?;
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;
        let mut buf = vec![0u8; READ_CHUNK];

        let copied: Result<(), StorageError> = async {
            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                written += n as u64;
                if written > self.max_size {
                    return Err(StorageError::TooLarge {
                        actual: written,
                        limit: self.max_size,
                    });
                }
                hasher.update(&buf[..n]);
                file.write_all(&buf[..n]).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;
        drop(file);

        if let Err(e) = copied {
            let _ = fs::remove_file(&staging).await;
            return Err(e);
        }

        let hash = ContentHash::from_bytes(hasher.finalize().into());
        self.promote(&staging, &hash).await?;
        debug!(%hash, bytes = written, "blob stored");
        Ok(hash)
    }

    async fn get_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.blob_path(hash)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
