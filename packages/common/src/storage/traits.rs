use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::hash::ContentHash;

/// Owned async byte source handed to and returned by a [`BlobStore`].
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Content-addressed binary storage.
///
/// Implementations must be safe to share across concurrent requests and must
/// make `put` idempotent for identical content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an in-memory buffer and return its content hash.
    ///
    /// Convenience wrapper over [`put_stream`](Self::put_stream).
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(reader).await
    }

    /// Store everything `reader` yields and return its content hash.
    ///
    /// Fails with [`StorageError::TooLarge`] once the configured limit is
    /// exceeded, leaving nothing behind. Storing bytes that are already present
    /// returns the existing hash.
    async fn put_stream(&self, reader: BoxReader) -> Result<ContentHash, StorageError>;

    /// Open a stored blob for streaming.
    ///
    /// Returns [`StorageError::NotFound`] if no blob has this hash.
    async fn get_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError>;
}
