//! # Schema Locator
//!
//! Classifies the schema argument handed to the template filter and
//! normalizes it into the root document given to the validation engine.
//!
//! | Input                         | Source            | Root document                      |
//! |-------------------------------|-------------------|------------------------------------|
//! | mapping / boolean schema      | `Inline`          | the value itself                   |
//! | `"http://…"` / `"https://…"`  | `Remote`          | `{"$ref": "<url>"}`                |
//! | `"schema.json"`               | `Local`           | `{"$ref": "file:///schema.json"}`  |
//! | `"/sub/schema.yaml#/x"`       | `Local`           | `{"$ref": "file:///sub/schema.yaml#/x"}` |
//!
//! Local paths are root-relative to the configured source loader, so
//! `"schema.json"` and `"/schema.json"` name the same document. They are
//! percent-encoded on the way into the URI (`"my schema.json"` becomes
//! `file:///my%20schema.json`), and the resolver decodes them again before
//! asking the loader.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const FILE_PREFIX: &str = "file://";
const REMOTE_PREFIXES: [&str; 2] = ["http://", "https://"];

/// Bytes escaped in the path of a local URI. `%` is included so a literal
/// `%` in a file name survives the decode on the resolver side.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Bytes escaped in a JSON-Pointer fragment. The engine decodes fragments
/// itself, so existing escapes are left alone.
const FRAGMENT_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// URI scheme of a canonical reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    /// Local reference served by the source loader.
    File,
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
    /// Anything else; the resolver rejects these.
    Other(String),
}

impl Scheme {
    /// Classify a URI string by its scheme component (case-insensitive).
    pub fn of(uri: &str) -> Self {
        let scheme = uri.split_once(':').map(|(s, _)| s).unwrap_or("");
        match scheme.to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "http" => Self::Http,
            "https" => Self::Https,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether fetching this scheme requires the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }
}

/// Normalized reference used as the lookup key of a resolution request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUri(String);

impl CanonicalUri {
    /// `file://` URI for a loader-relative path. A missing leading `/` is
    /// added, and anything after the first `#` is kept as the fragment.
    pub fn local(reference: &str) -> Self {
        let (path, fragment) = match reference.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (reference, None),
        };
        let root = if path.starts_with('/') { "" } else { "/" };
        let mut uri = format!("{FILE_PREFIX}{root}{}", utf8_percent_encode(path, PATH_ESCAPES));
        if let Some(fragment) = fragment {
            uri.push('#');
            uri.extend(utf8_percent_encode(fragment, FRAGMENT_ESCAPES));
        }
        Self(uri)
    }

    /// Remote URL, unchanged.
    pub fn remote(url: &str) -> Self {
        Self(url.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn scheme(&self) -> Scheme {
        Scheme::of(&self.0)
    }
}

impl fmt::Display for CanonicalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A schema reference as supplied by the template author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SchemaSource {
    /// A document already materialized by the caller.
    Inline(Value),
    /// A bare or absolute path inside the source loader's namespace.
    Local(String),
    /// An absolute HTTP(S) URL.
    Remote(String),
}

impl SchemaSource {
    /// Classify a template value. Strings are references; every other
    /// value is handed to the engine as an inline document.
    pub fn locate(value: &Value) -> Self {
        match value {
            Value::String(reference) => Self::from_reference(reference),
            other => Self::Inline(other.clone()),
        }
    }

    /// Classify a string reference.
    pub fn from_reference(reference: &str) -> Self {
        if REMOTE_PREFIXES.iter().any(|p| reference.starts_with(p)) {
            Self::Remote(reference.to_string())
        } else {
            Self::Local(reference.to_string())
        }
    }

    /// Canonical URI of the referenced document, if this is a reference.
    pub fn canonical_uri(&self) -> Option<CanonicalUri> {
        match self {
            Self::Inline(_) => None,
            Self::Local(path) => Some(CanonicalUri::local(path)),
            Self::Remote(url) => Some(CanonicalUri::remote(url)),
        }
    }

    /// The document handed to the validation engine as its root schema.
    pub fn root_document(&self) -> Value {
        match self {
            Self::Inline(document) => document.clone(),
            Self::Local(path) => json!({ "$ref": CanonicalUri::local(path).as_str() }),
            Self::Remote(url) => json!({ "$ref": url }),
        }
    }
}

impl From<&str> for SchemaSource {
    fn from(reference: &str) -> Self {
        Self::from_reference(reference)
    }
}

impl From<Value> for SchemaSource {
    fn from(value: Value) -> Self {
        match value {
            Value::String(reference) => Self::from_reference(&reference),
            other => Self::Inline(other),
        }
    }
}
