//! Variable store and placeholder substitution
//!
//! Each site gets its own [`VariableStore`], seeded from the site's
//! `variables` block and updated by captures. Templates reference values
//! as `%name%`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Separator used when a list value is substituted into a template
pub const LIST_SEPARATOR: &str = ",";

/// A stored value: a single string or an ordered list of strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawValue")]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
}

impl Value {
    /// Text written into a template; lists are joined with [`LIST_SEPARATOR`]
    pub fn render(&self) -> String {
        match self {
            Value::Scalar(s) => s.clone(),
            Value::List(items) => items.join(LIST_SEPARATOR),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// Scalar as written in YAML, before stringification
#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawScalar {
    fn into_string(self) -> String {
        match self {
            RawScalar::Bool(b) => b.to_string(),
            RawScalar::Int(i) => i.to_string(),
            RawScalar::Float(f) => f.to_string(),
            RawScalar::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Scalar(RawScalar),
    List(Vec<RawScalar>),
}

impl From<RawValue> for Value {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Scalar(s) => Value::Scalar(s.into_string()),
            RawValue::List(items) => {
                Value::List(items.into_iter().map(RawScalar::into_string).collect())
            }
        }
    }
}

/// Per-site mapping from variable name to value
///
/// Never shared between sites; a fresh store is built for every site run.
#[derive(Debug, Default, Clone)]
pub struct VariableStore {
    values: BTreeMap<String, Value>,
    /// Next synthetic name handed to an unnamed capture
    next_unnamed: usize,
}

impl VariableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given initial values
    pub fn seeded<I, K>(initial: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: initial.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            next_unnamed: 0,
        }
    }

    /// Get a value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Store a value, replacing any previous one
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Hand out a fresh name for a capture that has none
    ///
    /// Names are "0", "1", ... in the order they are requested.
    pub fn next_synthetic_name(&mut self) -> String {
        let name = self.next_unnamed.to_string();
        self.next_unnamed += 1;
        name
    }

    /// Replace every `%name%` in `template` with the stored value
    ///
    /// Placeholders for names that are not stored are left as written.
    pub fn substitute(&self, template: &str) -> String {
        let mut out = template.to_string();
        for (name, value) in &self.values {
            let placeholder = format!("%{name}%");
            if out.contains(&placeholder) {
                out = out.replace(&placeholder, &value.render());
            }
        }
        out
    }
}
