use std::path::{Path, PathBuf};

use host_agent_types::{DirectoryName, SearchQuery, SearchResult};

use super::aggregate::MatchAggregator;
use super::runner::RipgrepRunner;
use crate::SearchError;

/// Searches one allow-listed directory under `root` per request.
#[derive(Debug, Clone)]
pub struct SearchService {
    root: PathBuf,
    runner: RipgrepRunner,
}

impl SearchService {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, runner: RipgrepRunner) -> Self {
        Self {
            root: root.into(),
            runner,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn base_dir(&self, directory: DirectoryName) -> PathBuf {
        self.root.join(directory.dir_name())
    }

    /// `max_results` and `context_lines` reach ripgrep exactly as they are in
    /// `query`; [`SearchQuery`] already clamped them.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let base = self.base_dir(query.directory());
        let is_dir = tokio::fs::metadata(&base)
            .await
            .is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return Err(SearchError::DirectoryNotFound { path: base });
        }

        let mut aggregator = MatchAggregator::new(&base, query.max_results());
        self.runner
            .run(
                query.query(),
                &base,
                query.max_results(),
                query.context_lines(),
                |line| aggregator.push_line(line),
            )
            .await?;

        let result = aggregator.finish();
        tracing::info!(
            query = query.query(),
            directory = %query.directory(),
            files = result.results.len(),
            total_matches = result.total_matches,
            truncated = result.truncated,
            "Search completed"
        );
        Ok(result)
    }
}
