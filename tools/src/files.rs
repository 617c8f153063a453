//! Bulk retrieval of whole files from an allow-listed directory.

use std::path::{Path, PathBuf};

use host_agent_types::{
    DirectoryName, FileContentRecord, FileErrorCode, FileOperationError, GetFilesResult,
};

use crate::FileRetrievalError;
use crate::sandbox::BaseDir;

/// Reads files from `root/<directory>`.
///
/// This is synchronous disk IO; async callers run it on the blocking pool.
#[derive(Debug, Clone)]
pub struct FileRetrievalService {
    root: PathBuf,
}

impl FileRetrievalService {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every entry of `files` ends up in exactly one of `files` or `errors` of the
    /// result, in request order. One file failing never affects the others.
    pub fn get_files(
        &self,
        directory: DirectoryName,
        files: &[String],
    ) -> Result<GetFilesResult, FileRetrievalError> {
        let base_path = self.root.join(directory.dir_name());
        let base = BaseDir::open(&base_path)
            .map_err(|_| FileRetrievalError::DirectoryNotFound { path: base_path })?;

        let mut result = GetFilesResult::default();
        for requested in files {
            match read_one(&base, requested) {
                Ok(record) => result.files.push(record),
                Err(err) => {
                    if err.code == FileErrorCode::PathTraversal {
                        tracing::warn!(
                            file = %requested,
                            %directory,
                            "Rejected path traversal attempt"
                        );
                    }
                    result.errors.push(err);
                }
            }
        }

        tracing::info!(
            %directory,
            requested = files.len(),
            returned = result.files.len(),
            failed = result.errors.len(),
            "File retrieval completed"
        );
        Ok(result)
    }
}

fn read_one(base: &BaseDir, requested: &str) -> Result<FileContentRecord, FileOperationError> {
    let path = base
        .resolve(requested)
        .map_err(|code| FileOperationError::new(requested, code))?;
    let bytes = std::fs::read(&path).map_err(|e| {
        FileOperationError::with_detail(requested, FileErrorCode::ReadFailed, &e.to_string())
    })?;
    let size = bytes.len() as u64;
    Ok(FileContentRecord {
        path: requested.to_string(),
        content: decode_text(bytes, requested),
        size,
    })
}

/// UTF-8, falling back to U+FFFD replacement for invalid sequences.
fn decode_text(bytes: Vec<u8>, requested: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(file = %requested, "File is not valid UTF-8; decoding lossily");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}
