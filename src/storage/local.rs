//! Local filesystem storage backend.

use super::{StorageBackend, StorageError, StorageObject};
use actix_web::web::{self, Bytes};
use async_trait::async_trait;
use mime::Mime;
use std::fs;
use std::path::PathBuf;

/// Local filesystem storage backend.
pub struct LocalStorage {
    /// Base path for file storage
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    ///
    /// The `base_path` directory will be created if it doesn't exist.
    pub fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path)?;
        log::info!("LocalStorage initialized at {:?}", base_path);
        Ok(Self { base_path })
    }

    /// Get the full path for a file, including prefix directories.
    ///
    /// Keys are flat file names; anything that could escape the base
    /// directory is rejected.
    fn get_file_path(&self, filename: &str) -> Result<PathBuf, StorageError> {
        if filename.is_empty()
            || filename.starts_with('.')
            || filename.contains(['/', '\\'])
            || !filename.is_ascii()
        {
            return Err(StorageError::InvalidKey(filename.to_owned()));
        }

        if filename.len() < 4 {
            Ok(self.base_path.join(filename))
        } else {
            let prefix1 = &filename[0..2];
            let prefix2 = &filename[2..4];
            Ok(self.base_path.join(prefix1).join(prefix2).join(filename))
        }
    }

    /// Get MIME type from filename extension.
    fn get_mime_type(filename: &str) -> Option<Mime> {
        let ext = filename.rsplit('.').next()?;
        let mime = match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => mime::IMAGE_JPEG,
            "png" => mime::IMAGE_PNG,
            "gif" => mime::IMAGE_GIF,
            "webp" => "image/webp".parse().ok()?,
            "txt" => mime::TEXT_PLAIN,
            _ => mime::APPLICATION_OCTET_STREAM,
        };
        Some(mime)
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn put_object(&self, data: Vec<u8>, filename: &str) -> Result<(), StorageError> {
        let path = self.get_file_path(filename)?;
        log::info!("LocalStorage: put_object: {:?}", path);

        web::block(move || {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, data)
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<StorageObject, StorageError> {
        let path = self.get_file_path(key)?;
        log::debug!("LocalStorage: get_object: {:?}", path);

        let (buffer, metadata) = web::block(
            move || -> Result<(Vec<u8>, fs::Metadata), StorageError> {
                let metadata = fs::metadata(&path)?;
                let buffer = fs::read(&path)?;
                Ok((buffer, metadata))
            },
        )
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        let e_tag = metadata.modified().ok().map(|t: std::time::SystemTime| {
            let duration = t.duration_since(std::time::UNIX_EPOCH).unwrap_or_default();
            format!("\"{}-{}\"", duration.as_secs(), metadata.len())
        });

        Ok(StorageObject {
            body: Bytes::from(buffer),
            content_type: Self::get_mime_type(key).map(|m| m.to_string()),
            e_tag,
        })
    }

    async fn exists(&self, filename: &str) -> Result<bool, StorageError> {
        let path = self.get_file_path(filename)?;
        Ok(path.exists())
    }
}
