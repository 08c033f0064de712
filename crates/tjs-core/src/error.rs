//! # Error Types — Resolution Error Taxonomy
//!
//! Only two resolution failures are part of the typed taxonomy: a local
//! reference requested without any source loader configured, and a schema
//! that could not be located (missing local file or HTTP 404). Transport,
//! parse, and engine failures are deliberately kept out of this enum; they
//! travel as their own error types in `tjs-schema`.

use thiserror::Error;

/// A schema reference could not be resolved to a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// A `file://` reference was requested but no source loader is configured.
    #[error("template loader not found")]
    LoaderNotFound,

    /// The local path or remote URL does not exist.
    #[error("Schema file \"{0}\" not found")]
    SchemaFileNotFound(String),
}

impl ResolutionError {
    /// The offending reference, when the error carries one.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::LoaderNotFound => None,
            Self::SchemaFileNotFound(reference) => Some(reference),
        }
    }
}
