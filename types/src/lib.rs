//! Core value types for forall.
//!
//! This crate contains pure types with no IO and minimal dependencies:
//! seeds and their derivation, sample counts, quantified variable names,
//! the dynamic [`Value`] every domain produces, and the ordered
//! [`Bindings`] that serve as witnesses.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod bindings;
mod seed;
mod value;

pub use bindings::{BindingError, Bindings};
pub use seed::{SampleCount, SampleCountError, Seed};
pub use value::Value;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Variable names
// ============================================================================

/// Name of a quantified variable.
///
/// Guaranteed non-empty and free of surrounding whitespace, so it can be
/// rendered in a witness without quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VarName(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarNameError {
    #[error("variable name must not be empty")]
    Empty,
    #[error("variable name {0:?} must not contain whitespace")]
    Whitespace(String),
}

impl VarName {
    pub fn new(value: impl Into<String>) -> Result<Self, VarNameError> {
        let value = value.into();
        if value.is_empty() {
            return Err(VarNameError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(VarNameError::Whitespace(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VarName {
    type Error = VarNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for VarName {
    type Error = VarNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VarName> for String {
    fn from(value: VarName) -> Self {
        value.0
    }
}

impl AsRef<str> for VarName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for VarName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{VarName, VarNameError};

    #[test]
    fn var_name_rejects_empty() {
        assert_eq!(VarName::new(""), Err(VarNameError::Empty));
    }

    #[test]
    fn var_name_rejects_whitespace() {
        assert!(matches!(
            VarName::new("x y"),
            Err(VarNameError::Whitespace(_))
        ));
        assert!(VarName::new(" x").is_err());
    }

    #[test]
    fn var_name_round_trips_through_serde() {
        let name = VarName::new("xs").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"xs\"");
        let back: VarName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
        assert!(serde_json::from_str::<VarName>("\"\"").is_err());
    }
}
