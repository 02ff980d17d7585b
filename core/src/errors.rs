//! Infrastructure error taxonomy shared by domains and the quantifier engine.
//!
//! These are faults in how a property was declared or in what a domain can
//! deliver. They abort the current check. Ordinary test outcomes
//! (counterexamples, unsatisfied existentials) are never represented here.

use forall_types::{BindingError, SampleCountError, VarNameError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The property or domain was declared in a way the core cannot honor.
    #[error("usage error: {0}")]
    Usage(String),
    /// A filter rejected every candidate within its retry bound.
    #[error("generation exhausted: {domain} rejected {attempts} consecutive draws")]
    GenerationExhausted { domain: String, attempts: u32 },
    /// Enumeration was requested from a domain that cannot list its values.
    #[error("domain {domain} is not exhaustible")]
    NotExhaustible { domain: String },
}

impl DomainError {
    pub fn usage(message: impl Into<String>) -> Self {
        DomainError::Usage(message.into())
    }

    pub fn not_exhaustible(domain: impl Into<String>) -> Self {
        DomainError::NotExhaustible {
            domain: domain.into(),
        }
    }

    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, DomainError::Usage(_))
    }
}

impl From<BindingError> for DomainError {
    fn from(err: BindingError) -> Self {
        DomainError::Usage(err.to_string())
    }
}

impl From<VarNameError> for DomainError {
    fn from(err: VarNameError) -> Self {
        DomainError::Usage(err.to_string())
    }
}

impl From<SampleCountError> for DomainError {
    fn from(err: SampleCountError) -> Self {
        DomainError::Usage(err.to_string())
    }
}
