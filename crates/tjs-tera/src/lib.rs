//! # tjs-tera — Tera Integration
//!
//! Plugs JSON Schema validation into Tera templates as a filter and a test,
//! both named `jsonschema`.
//!
//! ## Usage
//!
//! ```no_run
//! use tera::{Context, Tera};
//! use tjs_schema::{FileSystemLoader, ResolverConfig, SchemaValidator};
//! use tjs_tera::{register, ExtensionPoints};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResolverConfig::from_env()?;
//! let validator = SchemaValidator::with_loader(FileSystemLoader::new("schemas"), config);
//!
//! let mut points = ExtensionPoints::new();
//! for warning in register(&mut points, validator) {
//!     eprintln!("{warning}");
//! }
//!
//! let mut tera = Tera::default();
//! for warning in points.install(&mut tera) {
//!     eprintln!("{warning}");
//! }
//!
//! let mut context = Context::new();
//! context.insert("data", &serde_json::json!({"age": 30}));
//! let report = tera.render_str("{{ data | jsonschema(schema='person.json') }}", &context)?;
//! assert!(report.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Name collisions never fail: both [`register`] and
//! [`ExtensionPoints::install`] keep the existing entry and return a
//! [`RegistrationWarning`] for it.
//!
//! A failed validation renders its report; it never fails the render.
//! Missing loaders and missing schema files do, and
//! [`resolution_error`] pulls the typed cause back out of `tera::Error`.

pub mod extension;
pub mod points;

pub use extension::{register, resolution_error, JsonSchemaFilter, JsonSchemaTest, EXTENSION_NAME};
pub use points::{ExtensionKind, ExtensionPoints, RegistrationWarning};
