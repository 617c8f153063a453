//! Folding the ripgrep event stream into per-file match groups.
//!
//! A context line is compared with the most recently recorded match of its own
//! file: a smaller line number goes to that match's `context_before`, a larger one
//! to its `context_after`. Context for a file with no recorded match yet is
//! dropped. Once `max_results` matches are recorded, any further match closes its
//! file and nothing more is attached there.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use host_agent_types::{FileMatchGroup, MatchRecord, SearchResult};

use super::event::{LineEvent, StreamEvent, parse_line};

#[derive(Debug, Default)]
struct FileState {
    group: Option<usize>,
    closed: bool,
}

#[derive(Debug)]
pub struct MatchAggregator {
    base: PathBuf,
    max_results: usize,
    groups: Vec<FileMatchGroup>,
    files: HashMap<String, FileState>,
    total_matches: usize,
    dropped_matches: usize,
    dropped_context: usize,
    skipped_events: usize,
}

impl MatchAggregator {
    /// `base` is the absolute directory ripgrep was pointed at; reported file
    /// paths are made relative to it.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>, max_results: u32) -> Self {
        Self {
            base: base.into(),
            max_results: max_results as usize,
            groups: Vec::new(),
            files: HashMap::new(),
            total_matches: 0,
            dropped_matches: 0,
            dropped_context: 0,
            skipped_events: 0,
        }
    }

    /// Feed one raw stdout line. Blank lines are ignored; malformed lines are
    /// logged and skipped.
    pub fn push_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match parse_line(line) {
            Ok(Some(event)) => self.push_event(event),
            Ok(None) => {}
            Err(err) => {
                self.skipped_events += 1;
                tracing::warn!(error = %err, "Skipping malformed ripgrep event");
            }
        }
    }

    pub fn push_event(&mut self, event: StreamEvent) {
        let Some(file) = self.relative_key(&event.line().path) else {
            self.skipped_events += 1;
            tracing::warn!(
                path = %event.line().path.display(),
                base = %self.base.display(),
                "Skipping ripgrep event outside the search base"
            );
            return;
        };
        match event {
            StreamEvent::Match(line) => self.record_match(file, line),
            StreamEvent::Context(line) => self.record_context(&file, line),
        }
    }

    #[must_use]
    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    /// Events ignored because they could not be parsed or placed.
    #[must_use]
    pub fn skipped_events(&self) -> usize {
        self.skipped_events
    }

    #[must_use]
    pub fn finish(self) -> SearchResult {
        if self.dropped_matches > 0 || self.dropped_context > 0 || self.skipped_events > 0 {
            tracing::debug!(
                dropped_matches = self.dropped_matches,
                dropped_context = self.dropped_context,
                skipped_events = self.skipped_events,
                "Search aggregation discarded events"
            );
        }
        SearchResult {
            truncated: self.total_matches >= self.max_results,
            total_matches: self.total_matches,
            results: self.groups,
        }
    }

    fn relative_key(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.base).ok()?;
        let key = rel.to_string_lossy().replace('\\', "/");
        if key.is_empty() { None } else { Some(key) }
    }

    fn record_match(&mut self, file: String, line: LineEvent) {
        let state = self.files.entry(file.clone()).or_default();
        if state.closed {
            self.dropped_matches += 1;
            return;
        }
        if self.total_matches >= self.max_results {
            state.closed = true;
            self.dropped_matches += 1;
            return;
        }

        let index = if let Some(index) = state.group {
            index
        } else {
            let index = self.groups.len();
            self.groups.push(FileMatchGroup {
                file,
                matches: Vec::new(),
            });
            state.group = Some(index);
            index
        };

        self.groups[index].matches.push(MatchRecord {
            line_number: line.line_number,
            content: line.text,
            context_before: Vec::new(),
            context_after: Vec::new(),
        });
        self.total_matches += 1;
    }

    fn record_context(&mut self, file: &str, line: LineEvent) {
        let last = self
            .files
            .get(file)
            .filter(|state| !state.closed)
            .and_then(|state| state.group)
            .and_then(|index| self.groups[index].matches.last_mut());
        let Some(last) = last else {
            self.dropped_context += 1;
            return;
        };

        if line.line_number < last.line_number {
            last.context_before.push(line.text);
        } else if line.line_number > last.line_number {
            last.context_after.push(line.text);
        } else {
            self.dropped_context += 1;
        }
    }
}
