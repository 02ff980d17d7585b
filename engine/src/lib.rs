//! Quantifier engine for forall.
//!
//! A [`Property`] is a chain of `forall`/`exists` quantifiers over domains
//! closed by a predicate over the bound variables. Checking it yields an
//! [`Outcome`] carrying the seed that reproduces the run, the number of
//! predicate evaluations, and the verdict with its witness.
//!
//! ```
//! use forall_core::{from_sequence, int};
//! use forall_engine::{DomainExpr, Property};
//! use forall_types::Seed;
//!
//! let prop = Property::builder()
//!     .forall("x", int(0, 100)?)
//!     .forall("y", DomainExpr::deferred(["x"], |b| int(0, b.int("x")?)))
//!     .exists("z", from_sequence([0, 1]))
//!     .predicate(|b| Ok::<_, forall_types::BindingError>(b.int("y")? <= b.int("x")?))?;
//!
//! let outcome = prop.check_seeded(Seed::new(7)).unwrap();
//! assert!(outcome.passed());
//! # Ok::<(), forall_core::DomainError>(())
//! ```

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod binder;
mod check;
mod outcome;
mod property;

pub use binder::DomainExpr;
pub use forall_config::ConfigError;
pub use check::{CheckConfig, CheckError, NESTED, check};
pub use outcome::{Failure, Outcome, Verdict};
pub use property::{
    IntoVerdict, PredicateResult, Property, PropertyBuilder, Quantifier, QuantifierKind,
};
