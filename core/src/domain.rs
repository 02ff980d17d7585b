//! The domain capability contract.
//!
//! A domain is an immutable description of a (possibly infinite) value set.
//! It can draw a value from a [`Seed`], produce a reproducible sample
//! sequence, and, when the author marks it exhaustive, list every value.
//!
//! # Determinism
//!
//! `draw` is a pure function of `(domain, seed)`. Composite domains never
//! hand one generator to their children; they derive a child seed per
//! structural position (`seed.child(i)`). Sample `i` of [`Domain::produce`]
//! is drawn from `seed.child(i)`, so identical `(domain, seed, count)`
//! always yields an identical sequence.

use std::fmt;
use std::ops::{BitOr, Deref};
use std::sync::Arc;

use forall_types::{Seed, Value};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::DomainError;
use crate::combinators::{Filter, Limit, Map, Marked, Union};

/// Tracks which recursive and lazy domains are currently being expanded by
/// one draw or enumeration.
///
/// Threaded explicitly through every draw rather than kept in process state.
#[derive(Debug, Default)]
pub struct DrawContext {
    active: Vec<usize>,
}

impl DrawContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register entry into recursive or lazy domain `id`.
    ///
    /// Re-entering a domain that is already being expanded means the domain
    /// reaches itself through another domain.
    pub(crate) fn enter(&mut self, id: usize, describe: &str) -> Result<(), DomainError> {
        if self.active.contains(&id) {
            tracing::warn!(domain = describe, "mutually recursive domains detected");
            return Err(DomainError::usage(format!(
                "mutually recursive domains are not supported: {describe} is reachable from itself through another domain"
            )));
        }
        self.active.push(id);
        Ok(())
    }

    pub(crate) fn leave(&mut self, id: usize) {
        if let Some(pos) = self.active.iter().rposition(|active| *active == id) {
            self.active.remove(pos);
        }
    }

    /// Run `f` with `id` registered as being expanded.
    pub(crate) fn within<T>(
        &mut self,
        id: usize,
        describe: &str,
        f: impl FnOnce(&mut Self) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        self.enter(id, describe)?;
        let result = f(self);
        self.leave(id);
        result
    }
}

/// Capability contract every domain implements.
pub trait Domain: Send + Sync {
    /// Draw one value determined entirely by `seed`.
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError>;

    /// Human-readable shape of the domain.
    fn describe(&self) -> String;

    /// Author-asserted: the engine may enumerate instead of sampling.
    fn is_exhaustive(&self) -> bool {
        false
    }

    /// Every value of the domain, regardless of the exhaustive flag.
    ///
    /// Composites call this on children once the outer flag has been trusted.
    fn enumerate_in(&self, _cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        Err(DomainError::not_exhaustible(self.describe()))
    }

    /// Simplest value, yielded as sample 0 by [`Domain::produce`].
    fn boundary(&self) -> Option<Value> {
        None
    }

    /// Upper bound on the samples [`Domain::produce`] returns.
    fn sample_limit(&self) -> Option<usize> {
        None
    }

    /// True when every draw would need a spent recursive reference.
    fn blocked(&self) -> bool {
        false
    }

    /// Branches of a union, so nested unions flatten.
    fn branches(&self) -> Option<&[DomainRef]> {
        None
    }

    /// `requested` capped by [`Domain::sample_limit`].
    fn sample_count(&self, requested: usize) -> usize {
        self.sample_limit()
            .map_or(requested, |limit| limit.min(requested))
    }

    /// Sample `index` of the sequence [`Domain::produce`] returns: the
    /// boundary value at index 0 (if any), otherwise a draw from
    /// `seed.child(index)`.
    fn sample(
        &self,
        cx: &mut DrawContext,
        seed: Seed,
        index: usize,
    ) -> Result<Value, DomainError> {
        if index == 0
            && let Some(boundary) = self.boundary()
        {
            return Ok(boundary);
        }
        self.draw(cx, seed.child(index as u64))
    }

    /// Up to `count` values: the boundary value first (if any), then seeded draws.
    fn produce(&self, seed: Seed, count: usize) -> Result<Vec<Value>, DomainError> {
        let mut cx = DrawContext::new();
        (0..self.sample_count(count))
            .map(|index| self.sample(&mut cx, seed, index))
            .collect()
    }

    /// [`Domain::enumerate_in`] with a fresh context.
    fn enumerate_all(&self) -> Result<Vec<Value>, DomainError> {
        self.enumerate_in(&mut DrawContext::new())
    }

    /// Every value, if and only if the domain is marked exhaustive.
    fn enumerate(&self) -> Result<Vec<Value>, DomainError> {
        if !self.is_exhaustive() {
            return Err(DomainError::not_exhaustible(self.describe()));
        }
        self.enumerate_all()
    }
}

/// Shared handle to an immutable domain.
#[derive(Clone)]
pub struct DomainRef(Arc<dyn Domain>);

impl DomainRef {
    pub fn new(domain: impl Domain + 'static) -> Self {
        Self(Arc::new(domain))
    }

    /// Override the exhaustive flag. The core trusts this assertion.
    #[must_use]
    pub fn exhaustive(self, exhaustive: bool) -> DomainRef {
        DomainRef::new(Marked::new(self, exhaustive))
    }

    /// Cap the number of samples drawn from this domain.
    #[must_use]
    pub fn limit(self, samples: usize) -> DomainRef {
        DomainRef::new(Limit::new(self, samples))
    }

    #[must_use]
    pub fn map(self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> DomainRef {
        DomainRef::new(Map::new(self, f))
    }

    #[must_use]
    pub fn filter(self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> DomainRef {
        DomainRef::new(Filter::new(self, predicate))
    }

    /// [`DomainRef::filter`] giving up after `max_rejections` consecutive
    /// rejections instead of the default.
    #[must_use]
    pub fn filter_with(
        self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
        max_rejections: u32,
    ) -> DomainRef {
        DomainRef::new(Filter::new(self, predicate).with_max_rejections(max_rejections))
    }

    /// Union with another domain.
    #[must_use]
    pub fn or(self, other: impl Into<DomainRef>) -> DomainRef {
        DomainRef::new(Union::pair(self, other.into()))
    }
}

impl<D: Domain + 'static> From<D> for DomainRef {
    fn from(domain: D) -> Self {
        DomainRef::new(domain)
    }
}

impl Deref for DomainRef {
    type Target = dyn Domain;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for DomainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DomainRef").field(&self.describe()).finish()
    }
}

impl fmt::Display for DomainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl BitOr for DomainRef {
    type Output = DomainRef;

    fn bitor(self, rhs: DomainRef) -> DomainRef {
        self.or(rhs)
    }
}

/// Generator for a single leaf draw.
pub(crate) fn rng(seed: Seed) -> StdRng {
    StdRng::seed_from_u64(seed.value())
}

/// Cartesian product of per-position value lists, first position varying slowest.
pub(crate) fn product(columns: &[Vec<Value>]) -> Vec<Vec<Value>> {
    columns.iter().fold(vec![Vec::new()], |rows, column| {
        rows.iter()
            .flat_map(|row| {
                column.iter().map(move |value| {
                    let mut next = row.clone();
                    next.push(value.clone());
                    next
                })
            })
            .collect()
    })
}
