//! Large-file storage on GridFS.

use std::path::Path;

use bson::Bson;
use bson::oid::ObjectId;
use tracing::debug;

use crate::error::{QuickError, QuickResult};

/// A GridFS bucket. Created by [`Database::gridfs_bucket`](crate::Database::gridfs_bucket).
#[derive(Clone)]
pub struct GridFsBucket {
    bucket: mongodb::gridfs::GridFsBucket,
}

impl std::fmt::Debug for GridFsBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridFsBucket").finish_non_exhaustive()
    }
}

impl GridFsBucket {
    pub(crate) fn new(bucket: mongodb::gridfs::GridFsBucket) -> Self {
        Self { bucket }
    }

    /// Store `bytes` under `filename` and return the new file's id.
    pub async fn upload_from_bytes(&self, filename: &str, bytes: &[u8]) -> QuickResult<ObjectId> {
        debug!(filename, len = bytes.len(), "GridFS upload");
        let reader = futures::io::Cursor::new(bytes);
        self.bucket
            .upload_from_futures_0_3_reader(filename, reader, None)
            .await
            .map_err(|e| QuickError::gridfs(format!("upload of '{}' failed: {}", filename, e)))
    }

    /// Store the local file at `source_path` under `filename`.
    pub async fn upload_from_file(
        &self,
        filename: &str,
        source_path: impl AsRef<Path>,
    ) -> QuickResult<ObjectId> {
        let bytes = tokio::fs::read(source_path.as_ref()).await?;
        self.upload_from_bytes(filename, &bytes).await
    }

    /// Read a stored file into memory.
    pub async fn download_to_bytes(&self, file_id: ObjectId) -> QuickResult<Vec<u8>> {
        debug!(%file_id, "GridFS download");
        let mut buffer = Vec::new();
        self.bucket
            .download_to_futures_0_3_writer(Bson::ObjectId(file_id), &mut buffer)
            .await
            .map_err(|e| QuickError::gridfs(format!("download of {} failed: {}", file_id, e)))?;
        Ok(buffer)
    }

    /// Write a stored file to `destination_path`, replacing any existing file.
    pub async fn download_to_file(
        &self,
        file_id: ObjectId,
        destination_path: impl AsRef<Path>,
    ) -> QuickResult<()> {
        let bytes = self.download_to_bytes(file_id).await?;
        tokio::fs::write(destination_path.as_ref(), bytes).await?;
        Ok(())
    }

    /// Delete a file and its chunks.
    pub async fn delete_file(&self, file_id: ObjectId) -> QuickResult<()> {
        debug!(%file_id, "GridFS delete");
        self.bucket
            .delete(Bson::ObjectId(file_id))
            .await
            .map_err(|e| QuickError::gridfs(format!("delete of {} failed: {}", file_id, e)))
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let db = Database::connect("mongodb://localhost:27017", "quickdb_test")
            .await
            .unwrap();
        let bucket = db.gridfs_bucket("files");
        let err = bucket
            .upload_from_file("x.bin", "/definitely/not/here.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, crate::QuickError::Io(_)));
    }
}
