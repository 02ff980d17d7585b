//! Seeded domains for forall.
//!
//! This crate contains the [`Domain`] capability contract, the leaf
//! domains, the combinators that build domains from other domains, and
//! the recursive resolver that keeps self-referential domains finite.
//!
//! The free functions below are the usual way to build domains:
//!
//! ```
//! use forall_core::{Domain, boolean, int, list};
//! use forall_types::Seed;
//!
//! let flags = list(boolean(), 1, 4)?;
//! let small = int(0, 9)?.exhaustive(true);
//! assert_eq!(small.enumerate()?.len(), 10);
//! assert_eq!(flags.produce(Seed::new(7), 5)?.len(), 5);
//! # Ok::<(), forall_core::DomainError>(())
//! ```

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions
#![allow(clippy::module_name_repetitions)] // DomainRef, DomainError read better than Ref, Error

mod combinators;
mod domain;
mod errors;
mod leaves;
mod recursive;

pub use combinators::{
    DEFAULT_MAX_LEN, DEFAULT_MAX_REJECTIONS, DEFAULT_MIN_LEN, Filter, FromSequence, Lazy, Limit,
    List, Map, Mapping, Marked, Sublists, Tuple, Union,
};
pub use domain::{Domain, DomainRef, DrawContext};
pub use errors::DomainError;
pub use leaves::{Alphabet, Boolean, Constant, Int, Text};
pub use recursive::{DEFAULT_MAX_DEPTH, Recursive, SelfRef};

use forall_types::Value;

/// Integers in `min..=max`.
pub fn int(min: i64, max: i64) -> Result<DomainRef, DomainError> {
    Int::new(min, max).map(DomainRef::new)
}

/// Integers in the default range `0..=10000`.
#[must_use]
pub fn integers() -> DomainRef {
    DomainRef::new(Int::default())
}

#[must_use]
pub fn boolean() -> DomainRef {
    DomainRef::new(Boolean)
}

#[must_use]
pub fn none() -> DomainRef {
    DomainRef::new(Constant::new(Value::None))
}

#[must_use]
pub fn singleton(value: impl Into<Value>) -> DomainRef {
    DomainRef::new(Constant::new(value))
}

pub fn text(alphabet: Alphabet, min_len: usize, max_len: usize) -> Result<DomainRef, DomainError> {
    Text::new(alphabet, min_len, max_len).map(DomainRef::new)
}

/// Printable ASCII strings of up to 80 characters.
#[must_use]
pub fn printable() -> DomainRef {
    DomainRef::new(Text::printable())
}

/// Identifier-shaped strings of 1 to 8 characters.
#[must_use]
pub fn identifiers() -> DomainRef {
    DomainRef::new(Text::identifiers())
}

pub fn tuple(items: impl IntoIterator<Item = DomainRef>) -> DomainRef {
    DomainRef::new(Tuple::new(items))
}

pub fn list(elem: DomainRef, min_len: usize, max_len: usize) -> Result<DomainRef, DomainError> {
    List::new(elem, min_len, max_len).map(DomainRef::new)
}

/// Lists of `0..=20` elements.
#[must_use]
pub fn list_of(elem: DomainRef) -> DomainRef {
    DomainRef::new(List::of(elem))
}

pub fn mapping(
    key: DomainRef,
    value: DomainRef,
    min_len: usize,
    max_len: usize,
) -> Result<DomainRef, DomainError> {
    Mapping::new(key, value, min_len, max_len).map(DomainRef::new)
}

#[must_use]
pub fn mapping_of(key: DomainRef, value: DomainRef) -> DomainRef {
    DomainRef::new(Mapping::of(key, value))
}

pub fn union(branches: impl IntoIterator<Item = DomainRef>) -> Result<DomainRef, DomainError> {
    Union::new(branches).map(DomainRef::new)
}

/// A finite sequence as an exhaustive domain.
pub fn from_sequence<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> DomainRef {
    DomainRef::new(FromSequence::new(items))
}

/// Contiguous slices of `items`, starting with the empty slice.
///
/// Sampled unless marked exhaustive.
pub fn sublists<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> DomainRef {
    DomainRef::new(Sublists::new(items))
}

/// A domain built when first drawn, for forward references.
pub fn lazy(
    build: impl Fn() -> Result<DomainRef, DomainError> + Send + Sync + 'static,
) -> DomainRef {
    DomainRef::new(Lazy::new(build))
}

/// Self-referential domain with the default depth budget.
pub fn recursive(
    factory: impl Fn(&SelfRef) -> Result<DomainRef, DomainError> + Send + Sync + 'static,
) -> Result<DomainRef, DomainError> {
    Recursive::new(factory).map(DomainRef::new)
}

pub fn recursive_with_depth(
    factory: impl Fn(&SelfRef) -> Result<DomainRef, DomainError> + Send + Sync + 'static,
    max_depth: usize,
) -> Result<DomainRef, DomainError> {
    Recursive::with_max_depth(factory, max_depth).map(DomainRef::new)
}
