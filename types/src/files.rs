//! Bulk file retrieval records.

use serde::{Deserialize, Serialize};

use crate::{DirectoryName, MAX_FILES_PER_REQUEST, RequestError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFilesRequest {
    pub directory: String,
    pub files: Vec<String>,
}

impl GetFilesRequest {
    #[must_use]
    pub fn new(directory: DirectoryName, files: Vec<String>) -> Self {
        Self {
            directory: directory.as_str().to_string(),
            files,
        }
    }

    /// Check the allow-list and the per-request file bound.
    pub fn validate(&self) -> Result<DirectoryName, RequestError> {
        let directory: DirectoryName = self.directory.parse()?;
        if self.files.is_empty() {
            return Err(RequestError::NoFiles);
        }
        if self.files.len() > MAX_FILES_PER_REQUEST {
            return Err(RequestError::TooManyFiles {
                requested: self.files.len(),
                max: MAX_FILES_PER_REQUEST,
            });
        }
        Ok(directory)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContentRecord {
    /// The path exactly as requested.
    pub path: String,
    pub content: String,
    /// Size on disk in bytes (before any lossy decoding).
    pub size: u64,
}

/// Machine-readable reason a single requested file was not returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorCode {
    PathTraversal,
    NotFound,
    NotAFile,
    ReadFailed,
}

impl FileErrorCode {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::PathTraversal => "Path traversal attempt detected",
            Self::NotFound => "File not found",
            Self::NotAFile => "Path is not a file",
            Self::ReadFailed => "Failed to read file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperationError {
    /// The path exactly as requested.
    pub file: String,
    pub error: String,
    pub code: FileErrorCode,
}

impl FileOperationError {
    #[must_use]
    pub fn new(file: impl Into<String>, code: FileErrorCode) -> Self {
        Self {
            file: file.into(),
            error: code.message().to_string(),
            code,
        }
    }

    #[must_use]
    pub fn with_detail(file: impl Into<String>, code: FileErrorCode, detail: &str) -> Self {
        Self {
            file: file.into(),
            error: format!("{}: {detail}", code.message()),
            code,
        }
    }
}

/// Every requested path lands in exactly one of `files` or `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFilesResult {
    pub files: Vec<FileContentRecord>,
    #[serde(default)]
    pub errors: Vec<FileOperationError>,
}
