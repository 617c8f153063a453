//! Search request and result records.

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_CONTEXT_LINES, DEFAULT_MAX_RESULTS, DirectoryName, MAX_CONTEXT_LINES, MAX_MAX_RESULTS,
    NonEmptyString, RequestError,
};

const fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

const fn default_context_lines() -> u32 {
    DEFAULT_CONTEXT_LINES
}

/// Search request as it arrives on the wire.
///
/// `directory` stays a plain string here so an unknown name surfaces as
/// [`RequestError::InvalidDirectory`] instead of a generic body rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub directory: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_context_lines")]
    pub context_lines: u32,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>, directory: DirectoryName) -> Self {
        Self {
            query: query.into(),
            directory: directory.as_str().to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn with_context_lines(mut self, context_lines: u32) -> Self {
        self.context_lines = context_lines;
        self
    }

    /// Validate into a [`SearchQuery`].
    pub fn validate(&self) -> Result<SearchQuery, RequestError> {
        let directory: DirectoryName = self.directory.parse()?;
        SearchQuery::new(
            self.query.clone(),
            directory,
            self.max_results,
            self.context_lines,
        )
    }
}

/// A validated search: allow-listed directory, non-empty query, clamped limits.
///
/// This is the only place limits are clamped. Everything downstream passes
/// `max_results` and `context_lines` through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    query: NonEmptyString,
    directory: DirectoryName,
    max_results: u32,
    context_lines: u32,
}

impl SearchQuery {
    pub fn new(
        query: impl Into<String>,
        directory: DirectoryName,
        max_results: u32,
        context_lines: u32,
    ) -> Result<Self, RequestError> {
        let query = NonEmptyString::new(query).map_err(|_| RequestError::EmptyQuery)?;
        Ok(Self {
            query,
            directory,
            max_results: max_results.clamp(1, MAX_MAX_RESULTS),
            context_lines: context_lines.min(MAX_CONTEXT_LINES),
        })
    }

    #[must_use]
    pub fn query(&self) -> &str {
        self.query.as_str()
    }

    #[must_use]
    pub const fn directory(&self) -> DirectoryName {
        self.directory
    }

    #[must_use]
    pub const fn max_results(&self) -> u32 {
        self.max_results
    }

    #[must_use]
    pub const fn context_lines(&self) -> u32 {
        self.context_lines
    }
}

/// One matching line plus the context lines claimed by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub line_number: u64,
    pub content: String,
    #[serde(default)]
    pub context_before: Vec<String>,
    #[serde(default)]
    pub context_after: Vec<String>,
}

/// All recorded matches of one file, in the order the search tool reported them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMatchGroup {
    /// Path relative to the searched directory.
    pub file: String,
    pub matches: Vec<MatchRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub results: Vec<FileMatchGroup>,
    pub total_matches: usize,
    /// Set when `total_matches` reached `max_results`; more matches likely exist.
    #[serde(default)]
    pub truncated: bool,
}
