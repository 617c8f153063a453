//! Typed ripgrep `--json` messages.
//!
//! Every stdout line of `rg --json` is one JSON object tagged by `type`. Only
//! `match` and `context` carry lines; `begin`, `end` and `summary` are framing
//! and are skipped.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RgMessage {
    Match { data: RgLine },
    Context { data: RgLine },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RgLine {
    path: RgData,
    line_number: Option<u64>,
    lines: RgData,
}

/// ripgrep's "arbitrary data": UTF-8 text, or base64 when the bytes are not UTF-8.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RgData {
    Text { text: String },
    Bytes { bytes: String },
}

impl RgData {
    fn into_bytes(self) -> Result<Vec<u8>, EventParseError> {
        match self {
            Self::Text { text } => Ok(text.into_bytes()),
            Self::Bytes { bytes } => STANDARD
                .decode(bytes.as_bytes())
                .map_err(|e| EventParseError::Base64(e.to_string())),
        }
    }

    fn into_text(self) -> Result<String, EventParseError> {
        match self {
            Self::Text { text } => Ok(text),
            bytes @ Self::Bytes { .. } => {
                Ok(String::from_utf8_lossy(&bytes.into_bytes()?).into_owned())
            }
        }
    }

    fn into_path(self) -> Result<PathBuf, EventParseError> {
        match self {
            Self::Text { text } => Ok(PathBuf::from(text)),
            bytes @ Self::Bytes { .. } => Ok(path_from_bytes(bytes.into_bytes()?)),
        }
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(Debug, thiserror::Error)]
pub enum EventParseError {
    #[error("invalid JSON from ripgrep: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event has no line number")]
    MissingLineNumber,
    #[error("invalid base64 payload: {0}")]
    Base64(String),
}

/// A line-bearing event, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    /// Path as printed by ripgrep (absolute, since the search root is absolute).
    pub path: PathBuf,
    pub line_number: u64,
    /// Line text with trailing whitespace (including the newline) stripped.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Match(LineEvent),
    Context(LineEvent),
}

impl StreamEvent {
    #[must_use]
    pub fn line(&self) -> &LineEvent {
        match self {
            Self::Match(line) | Self::Context(line) => line,
        }
    }
}

/// Parse one stdout line. `Ok(None)` means a framing message with nothing to record.
pub fn parse_line(line: &str) -> Result<Option<StreamEvent>, EventParseError> {
    match serde_json::from_str::<RgMessage>(line)? {
        RgMessage::Match { data } => Ok(Some(StreamEvent::Match(data.try_into()?))),
        RgMessage::Context { data } => Ok(Some(StreamEvent::Context(data.try_into()?))),
        RgMessage::Other => Ok(None),
    }
}

impl TryFrom<RgLine> for LineEvent {
    type Error = EventParseError;

    fn try_from(data: RgLine) -> Result<Self, Self::Error> {
        let line_number = data.line_number.ok_or(EventParseError::MissingLineNumber)?;
        let path = data.path.into_path()?;
        let text = data.lines.into_text()?.trim_end().to_string();
        Ok(Self {
            path,
            line_number,
            text,
        })
    }
}
