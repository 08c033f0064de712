//! # Schema Validation
//!
//! Drives the `jsonschema` engine for one `(data, schema)` pair and maps
//! the result onto an [`Outcome`] or a [`ValidateError`].
//!
//! ## Reference Retrieval
//!
//! Each call builds its own retriever bound to the shared loader and HTTP
//! fetcher. The engine asks it for every external document it needs
//! (the root `$ref` and everything reachable from it). JSON-Pointer
//! fragments are applied by the engine to the returned documents.
//!
//! ## Draft Selection
//!
//! A reference source compiles a synthesized `{"$ref": ...}` root, which
//! carries no `$schema` of its own. Such roots are compiled as Draft 7 so a
//! pointer target declaring `$schema` inside a larger document is still
//! applied. Fetched documents with a top-level `$schema` keep their own
//! draft; inline schemas are detected from their own `$schema` as usual.
//!
//! ## Error Recovery
//!
//! The engine only sees an opaque message when retrieval fails. The
//! original [`FetchError`] is kept in a per-call slot, and once the engine
//! returns:
//!
//! - a typed [`ResolutionError`] in the slot is returned as
//!   [`ValidateError::Resolution`], and the engine's wrapper is dropped;
//! - otherwise the engine's own error is returned as
//!   [`ValidateError::Engine`], with any untyped fetch failure as its source.

use std::fmt;
use std::sync::Arc;

use jsonschema::{Draft, Retrieve, Uri};
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tjs_core::{ResolutionError, SchemaSource};

use crate::config::ResolverConfig;
use crate::loader::SourceLoader;
use crate::outcome::{Outcome, Violation};
use crate::resolve::{FetchError, HttpFetcher, SchemaResolver};

/// Error surfaced by a validation call.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// A typed resolution failure raised while chasing references.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The engine failed to compile or apply the schema.
    #[error("{message}")]
    Engine {
        /// The engine's own error message.
        message: String,
        /// The retrieval failure behind it, if any.
        #[source]
        source: Option<FetchError>,
    },
}

impl ValidateError {
    /// The typed resolution error, if this is one.
    pub fn as_resolution(&self) -> Option<&ResolutionError> {
        match self {
            Self::Resolution(err) => Some(err),
            Self::Engine { .. } => None,
        }
    }
}

/// Draft for synthesized reference roots.
const REFERENCE_ROOT_DRAFT: Draft = Draft::Draft7;

/// Per-call slot for the first retrieval failure.
type FailureSlot = Arc<Mutex<Option<FetchError>>>;

/// Retriever handed to the engine for a single validation call.
struct CallRetriever {
    resolver: SchemaResolver,
    failure: FailureSlot,
}

impl Retrieve for CallRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        match self.resolver.resolve(uri.as_str()) {
            Ok(document) => Ok(document),
            Err(err) => {
                let message = err.to_string();
                self.failure.lock().get_or_insert(err);
                Err(message.into())
            }
        }
    }
}

/// Validates template data against JSON Schemas.
///
/// Holds the local source loader (if any) and the HTTP fetcher. Cheap to
/// share: nothing about a single call outlives it.
#[derive(Clone)]
pub struct SchemaValidator {
    loader: Option<Arc<dyn SourceLoader>>,
    http: Arc<HttpFetcher>,
}

impl SchemaValidator {
    /// Validator without a local source loader. Local references fail with
    /// [`ResolutionError::LoaderNotFound`].
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            loader: None,
            http: Arc::new(HttpFetcher::new(config)),
        }
    }

    /// Validator serving `file://` references from `loader`.
    pub fn with_loader(loader: impl SourceLoader + 'static, config: ResolverConfig) -> Self {
        Self {
            loader: Some(Arc::new(loader)),
            http: Arc::new(HttpFetcher::new(config)),
        }
    }

    /// Validator sharing an existing loader.
    pub fn with_shared_loader(loader: Arc<dyn SourceLoader>, config: ResolverConfig) -> Self {
        Self {
            loader: Some(loader),
            http: Arc::new(HttpFetcher::new(config)),
        }
    }

    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    pub fn config(&self) -> &ResolverConfig {
        self.http.config()
    }

    /// A resolver over this validator's sources.
    pub fn resolver(&self) -> SchemaResolver {
        SchemaResolver::new(self.loader.clone(), Arc::clone(&self.http))
    }

    /// Validate `data` against `source`.
    ///
    /// Returns the first violation only; the engine is not asked for more.
    pub fn validate(&self, data: &Value, source: &SchemaSource) -> Result<Outcome, ValidateError> {
        let root = source.root_document();
        let failure: FailureSlot = Arc::new(Mutex::new(None));

        let mut options = jsonschema::options();
        options.with_retriever(CallRetriever {
            resolver: self.resolver(),
            failure: Arc::clone(&failure),
        });
        if source.canonical_uri().is_some() {
            options.with_draft(REFERENCE_ROOT_DRAFT);
        }

        let validator = match options.build(&root) {
            Ok(validator) => validator,
            Err(err) => return Err(recover(&failure, err.to_string())),
        };

        let first = validator
            .iter_errors(data)
            .next()
            .map(|err| Violation::from_engine(&err, &root));

        if failure.lock().is_some() {
            let message = first
                .as_ref()
                .map(|v| v.message.clone())
                .unwrap_or_else(|| "schema reference could not be retrieved".to_string());
            return Err(recover(&failure, message));
        }

        let outcome = match first {
            None => Outcome::Valid,
            Some(violation) => Outcome::Invalid(violation),
        };
        tracing::debug!(valid = outcome.is_valid(), schema = ?source.canonical_uri(), "validated document");
        Ok(outcome)
    }

    /// `true` iff `data` conforms to `source`.
    pub fn is_valid(&self, data: &Value, source: &SchemaSource) -> Result<bool, ValidateError> {
        self.validate(data, source).map(|outcome| outcome.is_valid())
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("has_loader", &self.loader.is_some())
            .field("http", &self.http)
            .finish()
    }
}

/// Map an engine failure back onto the fetch failure that caused it.
fn recover(failure: &FailureSlot, message: String) -> ValidateError {
    match failure.lock().take() {
        Some(FetchError::Resolution(err)) => ValidateError::Resolution(err),
        source => ValidateError::Engine { message, source },
    }
}
