//! # Local Source Providers
//!
//! `file://` references are served by a [`SourceLoader`]: anything that can
//! return the raw text stored under a path relative to its own root, or
//! report that nothing lives there. This is the same capability a template
//! loader offers for template sources, which is why schemas and templates
//! usually share one root.
//!
//! Paths are split on `/`. Empty and `.` segments are ignored; a `..`
//! segment is reported as not found rather than escaping the root.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure reported by a [`SourceLoader`].
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Nothing is stored under the requested path.
    #[error("source not found: {0}")]
    NotFound(String),

    /// The source exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Provider of raw schema text for loader-relative paths.
pub trait SourceLoader: Send + Sync {
    /// Raw text stored under `path`, relative to the loader root.
    fn get_source(&self, path: &str) -> Result<String, LoaderError>;
}

/// Split a loader path into its segments, refusing to climb above the root.
fn split_source_path(path: &str) -> Result<Vec<&str>, LoaderError> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(LoaderError::NotFound(path.to_string())),
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return Err(LoaderError::NotFound(path.to_string()));
    }
    Ok(segments)
}

/// Loader reading files below a root directory.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceLoader for FileSystemLoader {
    fn get_source(&self, path: &str) -> Result<String, LoaderError> {
        let segments = split_source_path(path)?;
        let file = segments
            .iter()
            .fold(self.root.clone(), |acc, segment| acc.join(segment));

        if !file.is_file() {
            return Err(LoaderError::NotFound(path.to_string()));
        }

        std::fs::read_to_string(&file).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoaderError::NotFound(path.to_string()),
            _ => LoaderError::Io {
                path: file.display().to_string(),
                source,
            },
        })
    }
}

/// Loader serving sources from memory, keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sources: BTreeMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `source` under `path`. Returns `self` for chaining.
    pub fn with_source(mut self, path: &str, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    /// Store `source` under `path`, replacing any previous entry.
    pub fn insert(&mut self, path: &str, source: impl Into<String>) {
        let key = split_source_path(path)
            .map(|segments| segments.join("/"))
            .unwrap_or_else(|_| path.to_string());
        self.sources.insert(key, source.into());
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceLoader for MemoryLoader {
    fn get_source(&self, path: &str) -> Result<String, LoaderError> {
        let key = split_source_path(path)?.join("/");
        self.sources
            .get(&key)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(path.to_string()))
    }
}
