//! Confinement of requested file paths to an allow-listed directory.

use std::io;
use std::path::{Component, Path, PathBuf};

use host_agent_types::FileErrorCode;

/// Canonical base directory that requested paths must stay under.
#[derive(Debug, Clone)]
pub struct BaseDir {
    canonical: PathBuf,
}

impl BaseDir {
    /// Canonicalize `path`, which must be an existing directory.
    pub fn open(path: &Path) -> io::Result<Self> {
        let canonical = std::fs::canonicalize(path)?;
        if !canonical.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", canonical.display()),
            ));
        }
        Ok(Self { canonical })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.canonical
    }

    /// Resolve a caller-supplied path to the canonical regular file it names.
    ///
    /// Escapes through `..`, absolute paths or symlinks are
    /// [`FileErrorCode::PathTraversal`] whether or not the target exists, and are
    /// decided before anything outside the base is stat'ed for existence. The
    /// returned path is the one to read; it has no symlinks left in it.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, FileErrorCode> {
        if contains_unsafe_path_chars(requested) {
            return Err(FileErrorCode::PathTraversal);
        }

        let joined = lexical_normalize(&self.canonical.join(requested));
        if !joined.starts_with(&self.canonical) {
            return Err(FileErrorCode::PathTraversal);
        }

        let canonical = canonicalize_nearest(&joined).map_err(|_| FileErrorCode::NotFound)?;
        if !canonical.starts_with(&self.canonical) {
            return Err(FileErrorCode::PathTraversal);
        }

        match std::fs::metadata(&canonical) {
            Ok(meta) if meta.is_file() => Ok(canonical),
            Ok(_) => Err(FileErrorCode::NotAFile),
            Err(_) => Err(FileErrorCode::NotFound),
        }
    }
}

/// Collapse `.` and `..` without touching the filesystem. `..` at the root stays
/// at the root.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize `path`, or its nearest existing ancestor with the missing tail
/// re-appended. Symlinks in the existing part are resolved either way.
fn canonicalize_nearest(path: &Path) -> io::Result<PathBuf> {
    if path.exists() {
        return std::fs::canonicalize(path);
    }

    let mut missing = Vec::new();
    let mut ancestor = path;
    while !ancestor.exists() {
        let Some(name) = ancestor.file_name() else {
            break;
        };
        missing.push(name.to_os_string());
        let Some(parent) = ancestor.parent() else {
            break;
        };
        ancestor = parent;
    }

    let mut result = std::fs::canonicalize(ancestor)?;
    for part in missing.into_iter().rev() {
        result.push(part);
    }
    Ok(result)
}

fn contains_unsafe_path_chars(input: &str) -> bool {
    input.chars().any(is_unsafe_path_char)
}

/// C0/C1 control characters and DEL.
fn is_unsafe_path_char(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001f}' | '\u{007f}' | '\u{0080}'..='\u{009f}')
}
