//! # `jsonschema` Filter & Test
//!
//! ```text
//! {{ data | jsonschema(schema=schema) }}            → "" or a violation report
//! {% if data is jsonschema(schema) %}…{% endif %}   → true / false
//! ```
//!
//! `schema` is an inline document, a loader-relative path
//! (`"schema.json"`, `"/sub/schema.yaml#/definitions/x"`), or an
//! `http(s)://` URL.
//!
//! Resolution errors (`LoaderNotFound`, `SchemaFileNotFound`) abort
//! rendering. They travel inside Tera's error chain and can be recovered
//! with [`resolution_error`].

use std::collections::HashMap;
use std::error::Error as StdError;

use tera::{Filter, Test, Value};
use tjs_core::{ResolutionError, SchemaSource};
use tjs_schema::{SchemaValidator, ValidateError};

use crate::points::{ExtensionPoints, RegistrationWarning};

/// Name under which the filter and the test are registered.
pub const EXTENSION_NAME: &str = "jsonschema";

/// Keyword argument of the filter holding the schema.
const SCHEMA_ARG: &str = "schema";

/// Filter returning `""` on success and the violation report otherwise.
#[derive(Debug, Clone)]
pub struct JsonSchemaFilter {
    validator: SchemaValidator,
}

impl JsonSchemaFilter {
    pub fn new(validator: SchemaValidator) -> Self {
        Self { validator }
    }
}

impl Filter for JsonSchemaFilter {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let schema = args.get(SCHEMA_ARG).ok_or_else(|| {
            tera::Error::msg(format!(
                "Filter `{EXTENSION_NAME}` expected an arg called `{SCHEMA_ARG}`"
            ))
        })?;

        let outcome = self
            .validator
            .validate(value, &SchemaSource::locate(schema))
            .map_err(into_tera_error)?;
        Ok(Value::String(outcome.report()))
    }
}

/// Test passing iff the value conforms to the schema.
#[derive(Debug, Clone)]
pub struct JsonSchemaTest {
    validator: SchemaValidator,
}

impl JsonSchemaTest {
    pub fn new(validator: SchemaValidator) -> Self {
        Self { validator }
    }
}

impl Test for JsonSchemaTest {
    fn test(&self, value: Option<&Value>, args: &[Value]) -> tera::Result<bool> {
        let schema = args.first().ok_or_else(|| {
            tera::Error::msg(format!("Test `{EXTENSION_NAME}` expects a schema argument"))
        })?;

        let data = value.cloned().unwrap_or(Value::Null);
        self.validator
            .is_valid(&data, &SchemaSource::locate(schema))
            .map_err(into_tera_error)
    }
}

/// Add the `jsonschema` filter and test to `points`.
///
/// Names already present are left untouched; one warning per collision is
/// returned (and logged).
pub fn register(points: &mut ExtensionPoints, validator: SchemaValidator) -> Vec<RegistrationWarning> {
    let warnings: Vec<RegistrationWarning> = [
        points.add_filter(EXTENSION_NAME, JsonSchemaFilter::new(validator.clone())),
        points.add_test(EXTENSION_NAME, JsonSchemaTest::new(validator)),
    ]
    .into_iter()
    .flatten()
    .collect();

    for warning in &warnings {
        tracing::warn!(kind = %warning.kind, name = %warning.name, "{warning}");
    }
    warnings
}

/// Recover the typed resolution error from a rendering error, if one caused it.
pub fn resolution_error(err: &tera::Error) -> Option<&ResolutionError> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(cause) = current {
        if let Some(resolution) = cause.downcast_ref::<ResolutionError>() {
            return Some(resolution);
        }
        if let Some(resolution) = cause
            .downcast_ref::<ValidateError>()
            .and_then(ValidateError::as_resolution)
        {
            return Some(resolution);
        }
        current = cause.source();
    }
    None
}

fn into_tera_error(err: ValidateError) -> tera::Error {
    match err {
        ValidateError::Resolution(resolution) => tera::Error::chain(resolution.to_string(), resolution),
        other => tera::Error::chain(other.to_string(), other),
    }
}
