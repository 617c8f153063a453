//! Core domain types for the host agent.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! The server, the tool layer and the outbound client all share these definitions, so
//! the wire format lives in exactly one place.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod directory;
mod files;
mod search;

pub use directory::{DirectoryName, InvalidDirectory};
pub use files::{
    FileContentRecord, FileErrorCode, FileOperationError, GetFilesRequest, GetFilesResult,
};
pub use search::{FileMatchGroup, MatchRecord, SearchQuery, SearchRequest, SearchResult};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Limits
// ============================================================================

/// Default cap on recorded matches when the caller omits `max_results`.
pub const DEFAULT_MAX_RESULTS: u32 = 50;
/// Upper bound for `max_results`; larger requests are clamped.
pub const MAX_MAX_RESULTS: u32 = 200;
/// Default context window when the caller omits `context_lines`.
pub const DEFAULT_CONTEXT_LINES: u32 = 2;
/// Upper bound for `context_lines`; larger requests are clamped.
pub const MAX_CONTEXT_LINES: u32 = 5;
/// Maximum number of paths a single file-retrieval request may name.
pub const MAX_FILES_PER_REQUEST: usize = 20;

// ============================================================================
// NonEmpty String Types
// ============================================================================

/// A string guaranteed to be non-empty (after trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("value must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ============================================================================
// Request validation
// ============================================================================

/// Why a wire request was rejected before reaching a service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error(transparent)]
    InvalidDirectory(#[from] InvalidDirectory),
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("at least one file must be requested")]
    NoFiles,
    #[error("Maximum {max} files can be retrieved at once (requested {requested})")]
    TooManyFiles { requested: usize, max: usize },
}

// ============================================================================
// Service envelopes
// ============================================================================

/// Outcome of a successful backup script run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupReport {
    pub status: String,
    pub timestamp: String,
    pub message: String,
    #[serde(default)]
    pub output: String,
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

impl HealthStatus {
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "HostAgent".to_string(),
        }
    }
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub timestamp: String,
}
