//! The closed allow-list of searchable directories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A logical directory the host agent is allowed to search and read from.
///
/// Callers name directories by their wire name; the on-disk directory under the
/// configured root comes from [`DirectoryName::dir_name`], never from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum DirectoryName {
    /// Human-oriented n8n documentation.
    N8nDocs,
    /// TypeScript sources of the n8n nodes.
    N8nNodes,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid directory: {name}")]
pub struct InvalidDirectory {
    pub name: String,
}

impl DirectoryName {
    pub const ALL: [Self; 2] = [Self::N8nDocs, Self::N8nNodes];

    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::N8nDocs => "n8n-docs",
            Self::N8nNodes => "n8n-nodes-only",
        }
    }

    /// Directory name on disk, relative to the search root.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::N8nDocs => "n8n-docs",
            Self::N8nNodes => "n8n-nodes-only",
        }
    }
}

impl FromStr for DirectoryName {
    type Err = InvalidDirectory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n8n-docs" => Ok(Self::N8nDocs),
            // The tool-calling server names the node sources after the upstream org.
            "n8n-nodes-only" | "n8nio" => Ok(Self::N8nNodes),
            other => Err(InvalidDirectory {
                name: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DirectoryName {
    type Error = InvalidDirectory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DirectoryName> for &'static str {
    fn from(value: DirectoryName) -> Self {
        value.as_str()
    }
}

impl fmt::Display for DirectoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
