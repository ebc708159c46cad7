use std::path::{Path, PathBuf};

use crate::checksum::content_hash;
use crate::error::ProbeError;
use crate::multipart::{MultipartBody, OCTET_STREAM};

pub const SINGLE_BOUNDARY_PREFIX: &str = "----TestBoundary";
pub const BATCH_BOUNDARY_PREFIX: &str = "----BatchBoundary";

/// A file read into memory and hashed just before it is uploaded.
#[derive(Debug, Clone)]
pub struct FileUploadUnit {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub remote_path: String,
    pub content_hash: String,
}

impl FileUploadUnit {
    pub fn new(path: PathBuf, bytes: Vec<u8>, remote_path: &str) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_hash = content_hash(&bytes, &file_name);
        Self {
            path,
            file_name,
            bytes,
            remote_path: remote_path.to_string(),
            content_hash,
        }
    }

    pub fn read(path: impl AsRef<Path>, remote_path: &str) -> Result<Self, ProbeError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ProbeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.to_path_buf(), bytes, remote_path))
    }
}

/// `name`, `path`, `file`, then `content_hash` as the final part.
pub fn single_hash_last(boundary: impl Into<String>, unit: &FileUploadUnit) -> MultipartBody {
    MultipartBody::new(boundary)
        .text("name", &unit.file_name)
        .text("path", &unit.remote_path)
        .file("file", &unit.file_name, OCTET_STREAM, unit.bytes.clone())
        .text("content_hash", &unit.content_hash)
}

/// One `name[]`/`content_hash[]`/`file[]` triple per file, then a single
/// shared `path` field.
pub fn batch(
    boundary: impl Into<String>,
    units: &[FileUploadUnit],
    remote_path: &str,
) -> MultipartBody {
    let body = units.iter().fold(MultipartBody::new(boundary), |body, unit| {
        body.text("name[]", &unit.file_name)
            .text("content_hash[]", &unit.content_hash)
            .file("file[]", &unit.file_name, OCTET_STREAM, unit.bytes.clone())
    });
    body.text("path", remote_path)
}
