//! Domains built from other domains.
//!
//! Child seed layout, per composite:
//! - `Union`: child 0 picks the branch, child 1 drives the chosen branch.
//! - `Filter`: attempt `i` draws from child `i`.
//! - `Tuple`: component `i` draws from child `i`.
//! - `List`: child 0 picks the length, element `i` draws from child `i + 1`.
//! - `Mapping`: child 0 picks the length, key `i` from child `2i + 1`,
//!   value `i` from child `2i + 2`.

use std::collections::HashSet;
use std::sync::Arc;

use forall_types::{Seed, Value};
use rand::Rng;

use crate::DomainError;
use crate::domain::{Domain, DomainRef, DrawContext, product, rng};

/// Consecutive rejections a [`Filter`] tolerates before giving up.
pub const DEFAULT_MAX_REJECTIONS: u32 = 100;
/// Default length bounds for lists and mappings.
pub const DEFAULT_MIN_LEN: usize = 0;
pub const DEFAULT_MAX_LEN: usize = 20;

type MapFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;
type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type LazyFn = Arc<dyn Fn() -> Result<DomainRef, DomainError> + Send + Sync>;

fn check_len_bounds(what: &str, min: usize, max: usize) -> Result<(), DomainError> {
    if min > max {
        return Err(DomainError::usage(format!(
            "{what} max length ({max}) cannot be smaller than min length ({min})"
        )));
    }
    Ok(())
}

// ============================================================================
// Union
// ============================================================================

/// Each draw picks one branch with a seeded fair choice.
#[derive(Debug)]
pub struct Union {
    branches: Vec<DomainRef>,
}

impl Union {
    /// Nested unions are flattened into one list of branches.
    pub fn new(branches: impl IntoIterator<Item = DomainRef>) -> Result<Self, DomainError> {
        let mut flat = Vec::new();
        for branch in branches {
            match branch.branches() {
                Some(inner) => flat.extend(inner.iter().cloned()),
                None => flat.push(branch),
            }
        }
        if flat.is_empty() {
            return Err(DomainError::usage("a union needs at least one branch"));
        }
        Ok(Self { branches: flat })
    }

    pub(crate) fn pair(a: DomainRef, b: DomainRef) -> Self {
        let mut branches = Vec::new();
        for side in [a, b] {
            match side.branches() {
                Some(inner) => branches.extend(inner.iter().cloned()),
                None => branches.push(side),
            }
        }
        Self { branches }
    }
}

impl Domain for Union {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        let open: Vec<&DomainRef> = self.branches.iter().filter(|b| !b.blocked()).collect();
        if open.is_empty() {
            return Err(DomainError::usage(format!(
                "every branch of {} needs a spent recursive reference",
                self.describe()
            )));
        }
        let pick = rng(seed.child(0)).random_range(0..open.len());
        open[pick].draw(cx, seed.child(1))
    }

    fn describe(&self) -> String {
        self.branches
            .iter()
            .map(|b| b.describe())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn enumerate_in(&self, cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for branch in &self.branches {
            for value in branch.enumerate_in(cx)? {
                if seen.insert(value.clone()) {
                    values.push(value);
                }
            }
        }
        Ok(values)
    }

    fn blocked(&self) -> bool {
        self.branches.iter().all(|b| b.blocked())
    }

    fn branches(&self) -> Option<&[DomainRef]> {
        Some(&self.branches)
    }
}

// ============================================================================
// Map / Filter
// ============================================================================

pub struct Map {
    inner: DomainRef,
    f: MapFn,
}

impl Map {
    pub fn new(inner: DomainRef, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self {
            inner,
            f: Arc::new(f),
        }
    }
}

impl Domain for Map {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        self.inner.draw(cx, seed).map(|value| (self.f)(value))
    }

    fn describe(&self) -> String {
        format!("map({})", self.inner.describe())
    }

    fn enumerate_in(&self, cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        Ok(self
            .inner
            .enumerate_in(cx)?
            .into_iter()
            .map(|value| (self.f)(value))
            .collect())
    }

    fn boundary(&self) -> Option<Value> {
        self.inner.boundary().map(|value| (self.f)(value))
    }

    fn blocked(&self) -> bool {
        self.inner.blocked()
    }
}

/// Redraws until the predicate holds, within a bounded number of attempts.
pub struct Filter {
    inner: DomainRef,
    predicate: PredicateFn,
    max_rejections: u32,
}

impl Filter {
    pub fn new(inner: DomainRef, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner,
            predicate: Arc::new(predicate),
            max_rejections: DEFAULT_MAX_REJECTIONS,
        }
    }

    /// At least one attempt is always made.
    #[must_use]
    pub fn with_max_rejections(mut self, max_rejections: u32) -> Self {
        self.max_rejections = max_rejections.max(1);
        self
    }
}

impl Domain for Filter {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        for attempt in 0..self.max_rejections {
            let value = self.inner.draw(cx, seed.child(u64::from(attempt)))?;
            if (self.predicate)(&value) {
                return Ok(value);
            }
        }
        tracing::debug!(
            domain = %self.describe(),
            attempts = self.max_rejections,
            "filter gave up"
        );
        Err(DomainError::GenerationExhausted {
            domain: self.describe(),
            attempts: self.max_rejections,
        })
    }

    fn describe(&self) -> String {
        format!("filter({})", self.inner.describe())
    }

    fn enumerate_in(&self, cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        Ok(self
            .inner
            .enumerate_in(cx)?
            .into_iter()
            .filter(|value| (self.predicate)(value))
            .collect())
    }

    fn boundary(&self) -> Option<Value> {
        self.inner
            .boundary()
            .filter(|value| (self.predicate)(value))
    }

    fn blocked(&self) -> bool {
        self.inner.blocked()
    }
}

// ============================================================================
// Products and containers
// ============================================================================

/// Fixed-arity product; components draw from independent child seeds.
pub struct Tuple {
    items: Vec<DomainRef>,
}

impl Tuple {
    pub fn new(items: impl IntoIterator<Item = DomainRef>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

impl Domain for Tuple {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        let values = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| item.draw(cx, seed.child(i as u64)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Tuple(values))
    }

    fn describe(&self) -> String {
        let items: Vec<String> = self.items.iter().map(|item| item.describe()).collect();
        format!("({})", items.join(", "))
    }

    /// Cartesian product of the components' enumerations.
    fn enumerate_in(&self, cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        let columns = self
            .items
            .iter()
            .map(|item| item.enumerate_in(cx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(product(&columns).into_iter().map(Value::Tuple).collect())
    }

    fn blocked(&self) -> bool {
        self.items.iter().any(|item| item.blocked())
    }
}

/// Lists of `min..=max` elements drawn from `elem`.
pub struct List {
    elem: DomainRef,
    min_len: usize,
    max_len: usize,
}

impl List {
    pub fn new(elem: DomainRef, min_len: usize, max_len: usize) -> Result<Self, DomainError> {
        check_len_bounds("list", min_len, max_len)?;
        Ok(Self {
            elem,
            min_len,
            max_len,
        })
    }

    pub fn of(elem: DomainRef) -> Self {
        Self {
            elem,
            min_len: DEFAULT_MIN_LEN,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl Domain for List {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        let len = rng(seed.child(0)).random_range(self.min_len..=self.max_len);
        let values = (0..len)
            .map(|i| self.elem.draw(cx, seed.child(i as u64 + 1)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::List(values))
    }

    fn describe(&self) -> String {
        format!(
            "List({}, {}..={})",
            self.elem.describe(),
            self.min_len,
            self.max_len
        )
    }

    /// Every sequence of every allowed length, shortest first.
    fn enumerate_in(&self, cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        let elems = self.elem.enumerate_in(cx)?;
        let mut values = Vec::new();
        for len in self.min_len..=self.max_len {
            let columns = vec![elems.clone(); len];
            values.extend(product(&columns).into_iter().map(Value::List));
        }
        Ok(values)
    }

    fn boundary(&self) -> Option<Value> {
        (self.min_len == 0).then(|| Value::List(Vec::new()))
    }

    fn blocked(&self) -> bool {
        self.elem.blocked()
    }
}

/// Mappings of `min..=max` drawn entries.
///
/// Later duplicate keys overwrite earlier ones, so a drawn mapping can hold
/// fewer entries than its drawn length.
pub struct Mapping {
    key: DomainRef,
    value: DomainRef,
    min_len: usize,
    max_len: usize,
}

impl Mapping {
    pub fn new(
        key: DomainRef,
        value: DomainRef,
        min_len: usize,
        max_len: usize,
    ) -> Result<Self, DomainError> {
        check_len_bounds("mapping", min_len, max_len)?;
        Ok(Self {
            key,
            value,
            min_len,
            max_len,
        })
    }

    pub fn of(key: DomainRef, value: DomainRef) -> Self {
        Self {
            key,
            value,
            min_len: DEFAULT_MIN_LEN,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl Domain for Mapping {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        let len = rng(seed.child(0)).random_range(self.min_len..=self.max_len) as u64;
        let mut entries = Vec::new();
        for i in 0..len {
            let key = self.key.draw(cx, seed.child(2 * i + 1))?;
            let value = self.value.draw(cx, seed.child(2 * i + 2))?;
            entries.push((key, value));
        }
        Ok(Value::map_from(entries))
    }

    fn describe(&self) -> String {
        format!(
            "Mapping({}, {}, {}..={})",
            self.key.describe(),
            self.value.describe(),
            self.min_len,
            self.max_len
        )
    }

    fn boundary(&self) -> Option<Value> {
        (self.min_len == 0).then(|| Value::Map(Vec::new()))
    }

    fn blocked(&self) -> bool {
        self.key.blocked() || self.value.blocked()
    }
}

// ============================================================================
// Adapters and decorators
// ============================================================================

/// A finite, concrete sequence used as a domain. Exhaustive by construction.
pub struct FromSequence {
    items: Vec<Value>,
}

impl FromSequence {
    pub fn new<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

impl Domain for FromSequence {
    fn draw(&self, _cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::usage("cannot draw from an empty sequence"));
        }
        let pick = rng(seed).random_range(0..self.items.len());
        Ok(self.items[pick].clone())
    }

    fn describe(&self) -> String {
        let items: Vec<String> = self.items.iter().map(ToString::to_string).collect();
        format!("Sequence[{}]", items.join(", "))
    }

    fn is_exhaustive(&self) -> bool {
        true
    }

    fn enumerate_in(&self, _cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        Ok(self.items.clone())
    }
}

/// Contiguous slices of a fixed list, empty slice first.
///
/// Sampled by default; mark it exhaustive to enumerate every slice.
pub struct Sublists {
    items: Vec<Value>,
}

impl Sublists {
    pub fn new<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

impl Domain for Sublists {
    /// Two cut points in `0..=n`; the slice runs from the lower one through
    /// the upper one, clipped to the list.
    fn draw(&self, _cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        let n = self.items.len();
        let mut cuts = rng(seed);
        let a = cuts.random_range(0..=n);
        let b = cuts.random_range(0..=n);
        let start = a.min(b);
        let end = (a.max(b) + 1).min(n);
        Ok(Value::List(self.items[start..end.max(start)].to_vec()))
    }

    fn describe(&self) -> String {
        let items: Vec<String> = self.items.iter().map(ToString::to_string).collect();
        format!("Sublists[{}]", items.join(", "))
    }

    /// The empty slice, then `items[a..=b]` for every `a <= b`.
    fn enumerate_in(&self, _cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        let n = self.items.len();
        let mut values = vec![Value::List(Vec::new())];
        for a in 0..n {
            for b in a..n {
                values.push(Value::List(self.items[a..=b].to_vec()));
            }
        }
        Ok(values)
    }

    fn boundary(&self) -> Option<Value> {
        Some(Value::List(Vec::new()))
    }
}

/// Caps how many samples a quantifier takes from the inner domain.
///
/// A limited domain is sampled, never enumerated by the engine.
pub struct Limit {
    inner: DomainRef,
    samples: usize,
}

impl Limit {
    pub fn new(inner: DomainRef, samples: usize) -> Self {
        Self { inner, samples }
    }
}

impl Domain for Limit {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        self.inner.draw(cx, seed)
    }

    fn describe(&self) -> String {
        format!("{}.limit({})", self.inner.describe(), self.samples)
    }

    fn enumerate_in(&self, cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        self.inner.enumerate_in(cx)
    }

    fn boundary(&self) -> Option<Value> {
        self.inner.boundary()
    }

    fn sample_limit(&self) -> Option<usize> {
        Some(
            self.inner
                .sample_limit()
                .map_or(self.samples, |inner| inner.min(self.samples)),
        )
    }

    fn blocked(&self) -> bool {
        self.inner.blocked()
    }
}

/// Author override of the exhaustive flag.
pub struct Marked {
    inner: DomainRef,
    exhaustive: bool,
}

impl Marked {
    pub fn new(inner: DomainRef, exhaustive: bool) -> Self {
        Self { inner, exhaustive }
    }
}

impl Domain for Marked {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        self.inner.draw(cx, seed)
    }

    fn describe(&self) -> String {
        if self.exhaustive {
            format!("exhaustive({})", self.inner.describe())
        } else {
            self.inner.describe()
        }
    }

    fn is_exhaustive(&self) -> bool {
        self.exhaustive
    }

    fn enumerate_in(&self, cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        self.inner.enumerate_in(cx)
    }

    fn boundary(&self) -> Option<Value> {
        self.inner.boundary()
    }

    fn sample_limit(&self) -> Option<usize> {
        self.inner.sample_limit()
    }

    fn blocked(&self) -> bool {
        self.inner.blocked()
    }
}

/// Builds its domain at draw time. The way to write forward references.
///
/// A lazy domain that reaches itself again before producing a value is a
/// cycle with no base case and fails with a usage error.
pub struct Lazy {
    build: LazyFn,
}

impl Lazy {
    pub fn new(build: impl Fn() -> Result<DomainRef, DomainError> + Send + Sync + 'static) -> Self {
        Self {
            build: Arc::new(build),
        }
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.build).cast::<()>() as usize
    }
}

impl Domain for Lazy {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        cx.within(self.id(), "lazy(..)", |cx| (self.build)()?.draw(cx, seed))
    }

    fn describe(&self) -> String {
        "lazy(..)".to_string()
    }

    fn enumerate_in(&self, cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        cx.within(self.id(), "lazy(..)", |cx| (self.build)()?.enumerate_in(cx))
    }
}
