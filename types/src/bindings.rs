//! Ordered variable bindings.
//!
//! The quantifier engine binds one variable per quantifier, outer to inner.
//! The same type is handed to predicates and deferred domain expressions,
//! and is what a failing check reports as its witness.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::{Value, VarName};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("variable `{name}` is not bound here")]
    Unbound { name: String },
    #[error("variable `{name}` holds a {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Variable assignment in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: Vec<(VarName, Value)>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of these bindings extended with `name = value`.
    #[must_use]
    pub fn with(&self, name: VarName, value: Value) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.extend(self.entries.iter().cloned());
        entries.push((name, value));
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(bound, _)| bound.as_str() == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn value(&self, name: &str) -> Result<&Value, BindingError> {
        self.get(name).ok_or_else(|| BindingError::Unbound {
            name: name.to_string(),
        })
    }

    pub fn int(&self, name: &str) -> Result<i64, BindingError> {
        let value = self.value(name)?;
        value.as_int().ok_or_else(|| mismatch(name, "int", value))
    }

    pub fn bool(&self, name: &str) -> Result<bool, BindingError> {
        let value = self.value(name)?;
        value.as_bool().ok_or_else(|| mismatch(name, "bool", value))
    }

    pub fn str(&self, name: &str) -> Result<&str, BindingError> {
        let value = self.value(name)?;
        value.as_str().ok_or_else(|| mismatch(name, "str", value))
    }

    /// Elements of a bound tuple or list.
    pub fn seq(&self, name: &str) -> Result<&[Value], BindingError> {
        let value = self.value(name)?;
        value.as_seq().ok_or_else(|| mismatch(name, "list", value))
    }

    /// Restrict to `names`, in the order the variables were bound.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Bindings, BindingError> {
        if let Some(missing) = names.iter().find(|name| !self.contains(name.as_ref())) {
            return Err(BindingError::Unbound {
                name: missing.as_ref().to_string(),
            });
        }
        let entries = self
            .entries
            .iter()
            .filter(|(bound, _)| names.iter().any(|name| name.as_ref() == bound.as_str()))
            .cloned()
            .collect();
        Ok(Self { entries })
    }

    pub fn names(&self) -> impl Iterator<Item = &VarName> {
        self.entries.iter().map(|(name, _)| name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarName, &Value)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object in binding order, for external report formatters.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn mismatch(name: &str, expected: &'static str, found: &Value) -> BindingError {
    BindingError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

impl Serialize for Bindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("{}");
        }
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}

impl FromIterator<(VarName, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (VarName, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
