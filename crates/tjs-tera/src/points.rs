//! # Extension Points
//!
//! An explicit table of the filters and tests a template environment
//! should carry. Registration goes through this table instead of straight
//! into `Tera`, so a name collision is observable: the existing entry is
//! kept and the caller gets a [`RegistrationWarning`] back.
//!
//! Once populated, [`ExtensionPoints::install`] copies every entry into a
//! `tera::Tera` instance. Names the instance already carries are checked
//! the same way: the instance keeps its entry and a warning comes back.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tera::{Filter, Tera, Test, Value};

/// Which table an extension lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    Filter,
    Test,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter => f.write_str("filter"),
            Self::Test => f.write_str("test"),
        }
    }
}

/// Non-fatal notice that a name was already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationWarning {
    pub kind: ExtensionKind,
    pub name: String,
}

impl fmt::Display for RegistrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A {} named \"{}\" already exists in the template environment",
            self.kind, self.name
        )
    }
}

/// Filters and tests keyed by name.
#[derive(Clone, Default)]
pub struct ExtensionPoints {
    filters: BTreeMap<String, Arc<dyn Filter>>,
    tests: BTreeMap<String, Arc<dyn Test>>,
}

impl ExtensionPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is taken in the `kind` table.
    pub fn already_registered(&self, kind: ExtensionKind, name: &str) -> bool {
        match kind {
            ExtensionKind::Filter => self.filters.contains_key(name),
            ExtensionKind::Test => self.tests.contains_key(name),
        }
    }

    /// Add a filter unless the name is taken.
    pub fn add_filter(
        &mut self,
        name: &str,
        filter: impl Filter + 'static,
    ) -> Option<RegistrationWarning> {
        if self.already_registered(ExtensionKind::Filter, name) {
            return Some(RegistrationWarning {
                kind: ExtensionKind::Filter,
                name: name.to_string(),
            });
        }
        self.filters.insert(name.to_string(), Arc::new(filter));
        None
    }

    /// Add a test unless the name is taken.
    pub fn add_test(&mut self, name: &str, test: impl Test + 'static) -> Option<RegistrationWarning> {
        if self.already_registered(ExtensionKind::Test, name) {
            return Some(RegistrationWarning {
                kind: ExtensionKind::Test,
                name: name.to_string(),
            });
        }
        self.tests.insert(name.to_string(), Arc::new(test));
        None
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn test_names(&self) -> impl Iterator<Item = &str> {
        self.tests.keys().map(String::as_str)
    }

    /// Register every entry with `tera`.
    ///
    /// Names `tera` already knows (built-ins included) keep their existing
    /// filter or test; each one skipped is returned and logged as a warning.
    pub fn install(&self, tera: &mut Tera) -> Vec<RegistrationWarning> {
        let mut warnings = Vec::new();
        for (name, filter) in &self.filters {
            if tera.get_filter(name).is_ok() {
                warnings.push(RegistrationWarning {
                    kind: ExtensionKind::Filter,
                    name: name.clone(),
                });
                continue;
            }
            tera.register_filter(name, SharedFilter(Arc::clone(filter)));
        }
        for (name, test) in &self.tests {
            if tera.get_tester(name).is_ok() {
                warnings.push(RegistrationWarning {
                    kind: ExtensionKind::Test,
                    name: name.clone(),
                });
                continue;
            }
            tera.register_tester(name, SharedTest(Arc::clone(test)));
        }

        for warning in &warnings {
            tracing::warn!(kind = %warning.kind, name = %warning.name, "{warning}");
        }
        warnings
    }
}

impl fmt::Debug for ExtensionPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionPoints")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("tests", &self.tests.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct SharedFilter(Arc<dyn Filter>);

impl Filter for SharedFilter {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        self.0.filter(value, args)
    }

    fn is_safe(&self) -> bool {
        self.0.is_safe()
    }
}

struct SharedTest(Arc<dyn Test>);

impl Test for SharedTest {
    fn test(&self, value: Option<&Value>, args: &[Value]) -> tera::Result<bool> {
        self.0.test(value, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::Context;

    fn shout(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
        let s = tera::try_get_value!("shout", "value", String, value);
        Ok(Value::String(s.to_uppercase()))
    }

    fn whisper(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
        let s = tera::try_get_value!("whisper", "value", String, value);
        Ok(Value::String(s.to_lowercase()))
    }

    fn always(_: Option<&Value>, _: &[Value]) -> tera::Result<bool> {
        Ok(true)
    }

    #[test]
    fn test_already_registered_is_per_kind() {
        let mut points = ExtensionPoints::new();
        assert!(points.add_filter("loud", shout).is_none());
        assert!(points.already_registered(ExtensionKind::Filter, "loud"));
        assert!(!points.already_registered(ExtensionKind::Test, "loud"));
    }

    #[test]
    fn test_collision_keeps_first_entry() {
        let mut points = ExtensionPoints::new();
        assert!(points.add_filter("loud", shout).is_none());
        let warning = points.add_filter("loud", whisper).expect("warning");
        assert_eq!(
            warning.to_string(),
            r#"A filter named "loud" already exists in the template environment"#
        );

        let mut tera = Tera::default();
        assert!(points.install(&mut tera).is_empty());
        let mut context = Context::new();
        context.insert("word", "Hello");
        let out = tera.render_str("{{ word | loud }}", &context).unwrap();
        assert_eq!(out, "HELLO");
    }

    #[test]
    fn test_install_registers_tests() {
        let mut points = ExtensionPoints::new();
        assert!(points.add_test("anything", always).is_none());
        let warning = points.add_test("anything", always).expect("warning");
        assert_eq!(warning.kind, ExtensionKind::Test);
        assert_eq!(points.test_names().collect::<Vec<_>>(), vec!["anything"]);

        let mut tera = Tera::default();
        assert!(points.install(&mut tera).is_empty());
        let mut context = Context::new();
        context.insert("n", &1);
        let out = tera
            .render_str("{% if n is anything %}yes{% endif %}", &context)
            .unwrap();
        assert_eq!(out, "yes");
    }

    #[test]
    fn test_install_keeps_entries_already_in_tera() {
        let mut points = ExtensionPoints::new();
        assert!(points.add_filter("loud", whisper).is_none());
        assert!(points.add_test("odd", always).is_none());

        let mut tera = Tera::default();
        tera.register_filter("loud", shout);
        let warnings = points.install(&mut tera);
        assert_eq!(
            warnings,
            vec![
                RegistrationWarning {
                    kind: ExtensionKind::Filter,
                    name: "loud".into(),
                },
                RegistrationWarning {
                    kind: ExtensionKind::Test,
                    name: "odd".into(),
                },
            ]
        );

        let mut context = Context::new();
        context.insert("word", "Hello");
        context.insert("n", &2);
        let out = tera
            .render_str("{{ word | loud }} {% if n is odd %}odd{% else %}even{% endif %}", &context)
            .unwrap();
        assert_eq!(out, "HELLO even");
    }
}
