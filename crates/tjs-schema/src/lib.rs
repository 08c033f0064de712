//! # tjs-schema — Schema Resolution & Validation
//!
//! Resolves schema references to documents and validates template data
//! against them with the `jsonschema` engine.
//!
//! ## Resolution (`resolve`)
//!
//! [`SchemaResolver`] fetches the document behind a canonical URI:
//! `file://` references come from a [`SourceLoader`], `http(s)://`
//! references from a blocking HTTP GET. Fetched text is parsed as YAML
//! (feature `yaml`, on by default) or strict JSON.
//!
//! ## Validation (`validate`)
//!
//! [`SchemaValidator::validate`] returns an [`Outcome`]: `Valid`, rendered
//! as the empty string, or `Invalid` with the first [`Violation`] and its
//! report. Typed [`ResolutionError`](tjs_core::ResolutionError)s raised
//! while chasing `$ref`s come back unwrapped as
//! [`ValidateError::Resolution`].
//!
//! ## Crate Policy
//!
//! - Depends only on `tjs-core` internally.
//! - No schema caching across or within calls.
//! - Validation failure is an outcome, never an error.

pub mod config;
pub mod loader;
pub mod outcome;
pub mod parse;
pub mod resolve;
pub mod validate;

pub use config::{ConfigError, ResolverConfig};
pub use loader::{FileSystemLoader, LoaderError, MemoryLoader, SourceLoader};
pub use outcome::{Outcome, Violation};
pub use parse::{parse_document, ParseError};
pub use resolve::{FetchError, HttpFetcher, SchemaResolver};
pub use validate::{SchemaValidator, ValidateError};
