//! # Validation Outcomes
//!
//! A validation call ends in one of two outcomes. Success renders as the
//! empty string, which is what the template filter hands back. A failure
//! carries the first [`Violation`] reported by the engine and renders as a
//! multi-line report:
//!
//! ```text
//! -1 is less than the minimum of 0
//!
//! Failed validating 'minimum' in schema['properties']['age']:
//!     {
//!       "minimum": 0,
//!       "type": "integer"
//!     }
//!
//! On instance['age']:
//!     -1
//! ```
//!
//! The sub-schema block appears only when the failing sub-schema sits inside
//! the root document itself. Schemas reached through `$ref` are not
//! re-fetched just to print them, and `$ref` hops are left out of the
//! schema breadcrumb.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

const REF_KEYWORDS: [&str; 2] = ["$ref", "$dynamicRef"];

/// The first constraint violation reported for a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Engine message, e.g. `-1 is less than the minimum of 0`.
    pub message: String,
    /// Name of the violated keyword, e.g. `minimum`.
    pub keyword: String,
    /// JSON Pointer to the failing value in the instance.
    pub instance_path: String,
    /// JSON Pointer to the violated keyword in the schema.
    pub schema_path: String,
    /// The failing value.
    pub instance: Value,
    /// The sub-schema holding the violated keyword, when reachable in the root document.
    pub schema: Option<Value>,
}

impl Violation {
    /// Capture an engine error against the root document it was produced from.
    pub fn from_engine(err: &jsonschema::ValidationError<'_>, root: &Value) -> Self {
        let schema_path = err.schema_path.to_string();
        let segments = pointer_segments(&schema_path);
        let keyword = segments
            .last()
            .cloned()
            .unwrap_or_else(|| "schema".to_string());
        let schema = parent_pointer(&schema_path)
            .filter(|_| !segments.iter().any(|s| REF_KEYWORDS.contains(&s.as_str())))
            .and_then(|parent| root.pointer(parent))
            .cloned();

        Self {
            message: err.to_string(),
            keyword,
            instance_path: err.instance_path.to_string(),
            schema_path,
            instance: err.instance.as_ref().clone(),
            schema,
        }
    }

    /// `schema['properties']['age']`-style path to the failing sub-schema.
    pub fn schema_breadcrumb(&self) -> String {
        let mut segments = pointer_segments(&self.schema_path);
        segments.pop();
        segments.retain(|s| !REF_KEYWORDS.contains(&s.as_str()));
        breadcrumb("schema", &segments)
    }

    /// `instance['age']`-style path to the failing value.
    pub fn instance_breadcrumb(&self) -> String {
        breadcrumb("instance", &pointer_segments(&self.instance_path))
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        writeln!(f)?;
        match &self.schema {
            Some(schema) => {
                writeln!(
                    f,
                    "Failed validating '{}' in {}:",
                    self.keyword,
                    self.schema_breadcrumb()
                )?;
                writeln!(f, "{}", indented(schema))?;
            }
            None => writeln!(
                f,
                "Failed validating '{}' in {}",
                self.keyword,
                self.schema_breadcrumb()
            )?,
        }
        writeln!(f)?;
        writeln!(f, "On {}:", self.instance_breadcrumb())?;
        write!(f, "{}", indented(&self.instance))
    }
}

/// Result of validating one document against one schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "violation", rename_all = "snake_case")]
pub enum Outcome {
    Valid,
    Invalid(Violation),
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Valid => None,
            Self::Invalid(violation) => Some(violation),
        }
    }

    /// Empty string on success, the violation report otherwise.
    pub fn report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(violation) => violation.fmt(f),
        }
    }
}

/// Decode a JSON Pointer into its unescaped segments.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .strip_prefix('/')
        .map(|rest| {
            rest.split('/')
                .map(|s| s.replace("~1", "/").replace("~0", "~"))
                .collect()
        })
        .unwrap_or_default()
}

fn parent_pointer(pointer: &str) -> Option<&str> {
    pointer.rsplit_once('/').map(|(parent, _)| parent)
}

fn breadcrumb(root: &str, segments: &[String]) -> String {
    let mut out = root.to_string();
    for segment in segments {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            out.push_str(&format!("[{segment}]"));
        } else {
            out.push_str(&format!("['{}']", segment.replace('\'', "\\'")));
        }
    }
    out
}

fn indented(value: &Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    pretty
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violation(schema_path: &str, instance_path: &str, schema: Option<Value>) -> Violation {
        Violation {
            message: "-1 is less than the minimum of 0".into(),
            keyword: pointer_segments(schema_path).pop().unwrap_or_default(),
            instance_path: instance_path.into(),
            schema_path: schema_path.into(),
            instance: json!(-1),
            schema,
        }
    }

    #[test]
    fn test_pointer_segments_unescape() {
        assert_eq!(pointer_segments("/a~1b/c~0d/0"), vec!["a/b", "c~d", "0"]);
        assert!(pointer_segments("").is_empty());
    }

    #[test]
    fn test_breadcrumbs() {
        let v = violation("/properties/items/items/0/minimum", "/items/0", None);
        assert_eq!(v.schema_breadcrumb(), "schema['properties']['items']['items'][0]");
        assert_eq!(v.instance_breadcrumb(), "instance['items'][0]");
    }

    #[test]
    fn test_ref_hops_elided_from_schema_breadcrumb() {
        let v = violation("/$ref/properties/age/minimum", "/age", None);
        assert_eq!(v.schema_breadcrumb(), "schema['properties']['age']");
    }

    #[test]
    fn test_root_instance_breadcrumb() {
        let v = violation("/type", "", None);
        assert_eq!(v.instance_breadcrumb(), "instance");
        assert_eq!(v.schema_breadcrumb(), "schema");
    }

    #[test]
    fn test_report_with_subschema() {
        let v = violation(
            "/properties/age/minimum",
            "/age",
            Some(json!({"type": "integer", "minimum": 0})),
        );
        let report = Outcome::Invalid(v).report();
        assert!(report.starts_with("-1 is less than the minimum of 0\n\n"));
        assert!(report.contains("Failed validating 'minimum' in schema['properties']['age']:\n    {"));
        assert!(report.ends_with("On instance['age']:\n    -1"));
    }

    #[test]
    fn test_report_without_subschema() {
        let v = violation("/$ref/properties/age/minimum", "/age", None);
        let report = v.to_string();
        assert!(report.contains("Failed validating 'minimum' in schema['properties']['age']\n"));
    }

    #[test]
    fn test_valid_outcome_is_empty_sentinel() {
        assert_eq!(Outcome::Valid.report(), "");
        assert!(Outcome::Valid.is_valid());
        assert!(Outcome::Valid.violation().is_none());
    }
}
