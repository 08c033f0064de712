//! # tjs-core — Foundational Types for tera-jsonschema
//!
//! This crate is the leaf of the workspace. It defines how a user-supplied
//! schema reference is classified and normalized, and the small typed error
//! taxonomy that resolution failures are mapped onto. Every other crate in
//! the workspace depends on `tjs-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Tagged schema sources.** A schema reference is an explicit
//!    [`SchemaSource`] (`Inline | Local | Remote`), discriminated once at the
//!    locator boundary. Nothing downstream inspects raw strings to decide
//!    where a schema lives.
//!
//! 2. **Canonical URIs.** Local paths become `file://` URIs rooted at the
//!    loader namespace, remote URLs pass through unchanged. The resolver only
//!    ever sees [`CanonicalUri`] forms.
//!
//! 3. **Typed resolution errors.** [`ResolutionError`] has exactly two
//!    variants and survives the trip through the validation engine intact.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tjs-*` crates.
//! - No I/O. Locating a schema is pure string normalization.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod locator;

pub use error::ResolutionError;
pub use locator::{CanonicalUri, Scheme, SchemaSource};
