//! Content search over the allow-listed directories, backed by ripgrep.

mod aggregate;
mod event;
mod runner;
mod service;

pub use aggregate::MatchAggregator;
pub use event::{EventParseError, LineEvent, StreamEvent, parse_line};
pub use runner::{DEFAULT_SEARCH_TIMEOUT, RipgrepRunner};
pub use service::SearchService;
