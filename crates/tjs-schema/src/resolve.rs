//! # Schema Resolution
//!
//! Turns a canonical URI into a parsed schema document. The validation
//! engine calls into this module once for the root reference and once for
//! every external `$ref` it meets while compiling the schema.
//!
//! ## Sources
//!
//! - `file://` URIs are served by the configured [`SourceLoader`], using the
//!   URI path relative to the loader root. The path is percent-decoded but
//!   otherwise passed as written, `..` segments included.
//! - `http://` and `https://` URIs are fetched with a blocking GET.
//!
//! ## Failure Mapping
//!
//! | Condition                         | Error                                         |
//! |-----------------------------------|-----------------------------------------------|
//! | `file://` without a loader        | `ResolutionError::LoaderNotFound`             |
//! | loader reports not found          | `ResolutionError::SchemaFileNotFound(path)`   |
//! | HTTP 404                          | `ResolutionError::SchemaFileNotFound(uri)`    |
//! | other transport/status failure    | `FetchError::Http`, unmapped                  |
//! | unparseable text                  | `FetchError::Parse`, unmapped                 |
//!
//! JSON-Pointer fragments are never applied here. The whole document is
//! returned and the engine dereferences the fragment itself. Nothing is
//! cached: a URI referenced twice is fetched twice.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use thiserror::Error;
use tjs_core::{ResolutionError, Scheme};
use url::Url;

use crate::config::ResolverConfig;
use crate::loader::{LoaderError, SourceLoader};
use crate::parse::{parse_document, ParseError};

/// Failure while fetching or parsing a referenced schema.
#[derive(Error, Debug)]
pub enum FetchError {
    /// One of the typed resolution failures.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Remote references are turned off in [`ResolverConfig`].
    #[error("remote schema references are disabled: {0}")]
    RemoteDisabled(String),

    /// The URI scheme is neither `file` nor `http(s)`.
    #[error("unsupported scheme {scheme:?} in schema reference {uri}")]
    UnsupportedScheme { scheme: String, uri: String },

    /// The URI could not be parsed.
    #[error("invalid schema reference {uri}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    /// The loader found the source but could not read it.
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// HTTP transport error or non-404 error status.
    #[error("HTTP error fetching {uri}: {source}")]
    Http {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body is not UTF-8.
    #[error("schema {uri} is not valid UTF-8: {source}")]
    Utf8 {
        uri: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The fetched text is not a valid document.
    #[error("failed to parse schema {uri}: {source}")]
    Parse {
        uri: String,
        #[source]
        source: ParseError,
    },
}

impl FetchError {
    /// The typed resolution error, if this is one.
    pub fn as_resolution(&self) -> Option<&ResolutionError> {
        match self {
            Self::Resolution(err) => Some(err),
            _ => None,
        }
    }
}

// ─── HTTP Fetcher ───────────────────────────────────────────────────────

/// Blocking HTTP client for remote schemas.
///
/// The underlying `reqwest` client is built on the first remote fetch and
/// reused afterwards, so purely local setups never start one.
pub struct HttpFetcher {
    config: ResolverConfig,
    client: OnceCell<reqwest::blocking::Client>,
}

impl HttpFetcher {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, reqwest::Error> {
        self.client.get_or_try_init(|| {
            let mut builder =
                reqwest::blocking::Client::builder().user_agent(self.config.user_agent.clone());
            if let Some(secs) = self.config.timeout_secs {
                builder = builder.timeout(Duration::from_secs(secs));
            }
            builder.build()
        })
    }

    /// GET `uri` and return the body as text.
    pub fn fetch(&self, uri: &str) -> Result<String, FetchError> {
        if !self.config.allow_remote {
            return Err(FetchError::RemoteDisabled(uri.to_string()));
        }

        let http_err = |source| FetchError::Http {
            uri: uri.to_string(),
            source,
        };

        let response = self.client().map_err(http_err)?.get(uri).send().map_err(http_err)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolutionError::SchemaFileNotFound(uri.to_string()).into());
        }

        let body = response
            .error_for_status()
            .and_then(|response| response.bytes())
            .map_err(http_err)?;

        String::from_utf8(body.to_vec()).map_err(|source| FetchError::Utf8 {
            uri: uri.to_string(),
            source,
        })
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("config", &self.config)
            .field("client_started", &self.client.get().is_some())
            .finish()
    }
}

// ─── Resolver ───────────────────────────────────────────────────────────

/// Resolves canonical URIs to parsed schema documents.
#[derive(Clone)]
pub struct SchemaResolver {
    loader: Option<Arc<dyn SourceLoader>>,
    http: Arc<HttpFetcher>,
}

impl SchemaResolver {
    pub fn new(loader: Option<Arc<dyn SourceLoader>>, http: Arc<HttpFetcher>) -> Self {
        Self { loader, http }
    }

    /// Fetch and parse the document `uri` points to.
    ///
    /// Any fragment on `uri` is ignored; the whole document is returned.
    pub fn resolve(&self, uri: &str) -> Result<Value, FetchError> {
        let location = uri.split_once('#').map_or(uri, |(base, _)| base);
        let scheme = Scheme::of(location);
        tracing::debug!(uri = location, ?scheme, "resolving schema reference");

        let raw = match scheme {
            Scheme::File => self.fetch_local(location)?,
            Scheme::Http | Scheme::Https => self.http.fetch(location)?,
            Scheme::Other(scheme) => {
                return Err(FetchError::UnsupportedScheme {
                    scheme,
                    uri: location.to_string(),
                })
            }
        };

        parse_document(&raw).map_err(|source| FetchError::Parse {
            uri: location.to_string(),
            source,
        })
    }

    fn fetch_local(&self, uri: &str) -> Result<String, FetchError> {
        let loader = self.loader.as_ref().ok_or(ResolutionError::LoaderNotFound)?;

        Url::parse(uri).map_err(|source| FetchError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;
        // `Url` drops `..` segments; the loader must see them to refuse them.
        let path = percent_decode_str(raw_path(uri)).decode_utf8_lossy();

        loader.get_source(&path).map_err(|err| match err {
            LoaderError::NotFound(_) => {
                FetchError::Resolution(ResolutionError::SchemaFileNotFound(path.to_string()))
            }
            LoaderError::Io { path, source } => FetchError::Io { path, source },
        })
    }
}

/// Path component of a `file://` URI exactly as written, still encoded.
fn raw_path(uri: &str) -> &str {
    let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let path = rest.find('/').map_or("", |start| &rest[start..]);
    path.split(|c| c == '?' || c == '#').next().unwrap_or(path)
}

impl fmt::Debug for SchemaResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaResolver")
            .field("has_loader", &self.loader.is_some())
            .field("http", &self.http)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use serde_json::json;

    fn resolver(loader: Option<MemoryLoader>) -> SchemaResolver {
        SchemaResolver::new(
            loader.map(|l| Arc::new(l) as Arc<dyn SourceLoader>),
            Arc::new(HttpFetcher::new(ResolverConfig::default())),
        )
    }

    #[test]
    fn test_resolve_local_json() {
        let loader = MemoryLoader::new().with_source("schema.json", r#"{"type": "object"}"#);
        let doc = resolver(Some(loader)).resolve("file:///schema.json").unwrap();
        assert_eq!(doc, json!({"type": "object"}));
    }

    #[test]
    fn test_resolve_ignores_fragment() {
        let loader = MemoryLoader::new()
            .with_source("sub/schema.json", r#"{"definitions": {"person": {"type": "object"}}}"#);
        let doc = resolver(Some(loader))
            .resolve("file:///sub/schema.json#/definitions/person")
            .unwrap();
        assert!(doc.get("definitions").is_some(), "whole document expected, got {doc}");
    }

    #[test]
    fn test_local_without_loader() {
        let err = resolver(None).resolve("file:///schema.json").unwrap_err();
        assert_eq!(err.as_resolution(), Some(&ResolutionError::LoaderNotFound));
    }

    #[test]
    fn test_local_missing_file_names_path() {
        let err = resolver(Some(MemoryLoader::new()))
            .resolve("file:///sub/schema.json")
            .unwrap_err();
        assert_eq!(
            err.as_resolution(),
            Some(&ResolutionError::SchemaFileNotFound("/sub/schema.json".into()))
        );
    }

    #[test]
    fn test_local_path_is_percent_decoded() {
        let loader = MemoryLoader::new()
            .with_source("my schema.json", r#"{"type": "object"}"#)
            .with_source("sch\u{e9}mas/a.json", r#"{"type": "string"}"#)
            .with_source("a%20b.json", r#"{"type": "null"}"#);
        let resolver = resolver(Some(loader));

        assert_eq!(
            resolver.resolve("file:///my%20schema.json").unwrap(),
            json!({"type": "object"})
        );
        assert_eq!(
            resolver.resolve("file:///sch%C3%A9mas/a.json#/type").unwrap(),
            json!({"type": "string"})
        );
        assert_eq!(
            resolver.resolve("file:///a%2520b.json").unwrap(),
            json!({"type": "null"})
        );
    }

    #[test]
    fn test_parent_segment_reaches_loader() {
        let loader = MemoryLoader::new().with_source("outside.json", "{}");
        let err = resolver(Some(loader))
            .resolve("file:///root/../outside.json")
            .unwrap_err();
        assert_eq!(
            err.as_resolution(),
            Some(&ResolutionError::SchemaFileNotFound("/root/../outside.json".into()))
        );
    }

    #[test]
    fn test_raw_path() {
        assert_eq!(raw_path("file:///a/../b.json#/x"), "/a/../b.json");
        assert_eq!(raw_path("file://host/a.json?v=1"), "/a.json");
        assert_eq!(raw_path("file://"), "");
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = resolver(None).resolve("json-schema:///schema.json").unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme { ref scheme, .. } if scheme == "json-schema"));
    }

    #[test]
    fn test_parse_failure_is_not_a_resolution_error() {
        let loader = MemoryLoader::new().with_source("broken.json", "{\"type\": ");
        let err = resolver(Some(loader)).resolve("file:///broken.json").unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
        assert!(err.as_resolution().is_none());
    }

    #[test]
    fn test_remote_disabled() {
        let resolver = SchemaResolver::new(
            None,
            Arc::new(HttpFetcher::new(ResolverConfig {
                allow_remote: false,
                ..ResolverConfig::default()
            })),
        );
        let err = resolver.resolve("https://example.com/schema.json").unwrap_err();
        assert!(matches!(err, FetchError::RemoteDisabled(uri) if uri == "https://example.com/schema.json"));
    }
}
