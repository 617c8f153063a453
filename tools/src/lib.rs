//! Services behind the host agent's HTTP surface.
//!
//! - [`search`]: runs ripgrep over an allow-listed directory and folds its JSON
//!   event stream into per-file match groups
//! - [`files`]: reads a bounded list of files from the same directories, never
//!   leaving the directory's canonical base
//! - [`backup`]: runs the n8n workflow backup script
//!
//! All subprocesses go through [`process`], which kills the child's process group
//! when the owning future is dropped.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Error variants are documented on the enums
#![allow(clippy::module_name_repetitions)] // SearchService in search, etc.

pub mod backup;
pub mod files;
pub mod process;
pub mod sandbox;
pub mod search;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use backup::BackupRunner;
pub use files::FileRetrievalService;
pub use sandbox::BaseDir;
pub use search::{MatchAggregator, RipgrepRunner, SearchService};

/// Whole-request failure of a search. Malformed individual events are not errors;
/// the aggregator skips them.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },
    #[error("Search tool not available: {binary}")]
    ToolUnavailable { binary: String },
    #[error("Failed to start search tool {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Search failed: {}", .stderr.trim())]
    ToolFailed { code: Option<i32>, stderr: String },
    #[error("Search timed out after {}s", .after.as_secs())]
    TimedOut { after: Duration },
    #[error("I/O error while searching: {0}")]
    Io(#[from] io::Error),
}

/// Whole-request failure of a file retrieval. Per-file problems are reported as
/// [`host_agent_types::FileOperationError`] values instead.
#[derive(Debug, Error)]
pub enum FileRetrievalError {
    #[error("Directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup script not found: {}", .path.display())]
    ScriptNotFound { path: PathBuf },
    #[error("Failed to start backup script: {0}")]
    Spawn(#[source] io::Error),
    #[error("Backup script failed with exit code {}\nStdout: {stdout}\nStderr: {stderr}", .code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    Failed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error("Backup operation timed out after {}s", .after.as_secs())]
    TimedOut { after: Duration },
    #[error("I/O error during backup: {0}")]
    Io(#[from] io::Error),
}
