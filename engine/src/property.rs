//! Property declaration: a chain of quantifiers closed by a predicate.

use std::fmt;
use std::sync::Arc;

use forall_core::DomainError;
use forall_types::{Bindings, SampleCount, Seed, VarName};

use crate::binder::DomainExpr;
use crate::check::{CheckConfig, CheckError, run};
use crate::outcome::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierKind {
    ForAll,
    Exists,
}

impl QuantifierKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            QuantifierKind::ForAll => "forall",
            QuantifierKind::Exists => "exists",
        }
    }
}

/// One link of the quantifier chain.
#[derive(Debug, Clone)]
pub struct Quantifier {
    pub(crate) kind: QuantifierKind,
    pub(crate) name: VarName,
    pub(crate) domain: DomainExpr,
    pub(crate) samples: Option<SampleCount>,
}

impl Quantifier {
    #[must_use]
    pub const fn kind(&self) -> QuantifierKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &VarName {
        &self.name
    }

    #[must_use]
    pub fn domain(&self) -> &DomainExpr {
        &self.domain
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} in {}", self.kind.as_str(), self.name, self.domain)?;
        if let Some(samples) = self.samples {
            write!(f, " ({samples} samples)")?;
        }
        Ok(())
    }
}

/// What a predicate evaluation reports back to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateResult {
    Holds,
    Violated,
    /// The predicate itself failed.
    Error(String),
}

/// Conversion of predicate return values into [`PredicateResult`].
///
/// Predicates may return `bool`, or `Result<bool, E>` for any displayable `E`.
pub trait IntoVerdict {
    fn into_verdict(self) -> PredicateResult;
}

impl IntoVerdict for bool {
    fn into_verdict(self) -> PredicateResult {
        if self {
            PredicateResult::Holds
        } else {
            PredicateResult::Violated
        }
    }
}

impl<E: fmt::Display> IntoVerdict for Result<bool, E> {
    fn into_verdict(self) -> PredicateResult {
        match self {
            Ok(holds) => holds.into_verdict(),
            Err(err) => PredicateResult::Error(err.to_string()),
        }
    }
}

pub(crate) type PredicateFn = Arc<dyn Fn(&Bindings) -> PredicateResult + Send + Sync>;

/// A validated quantifier chain and its terminal predicate.
#[derive(Clone)]
pub struct Property {
    pub(crate) quantifiers: Vec<Quantifier>,
    pub(crate) predicate: PredicateFn,
}

impl Property {
    #[must_use]
    pub fn builder() -> PropertyBuilder {
        PropertyBuilder::default()
    }

    #[must_use]
    pub fn quantifiers(&self) -> &[Quantifier] {
        &self.quantifiers
    }

    /// Evaluate under `config`.
    pub fn check(&self, config: &CheckConfig) -> Result<Outcome, CheckError> {
        run(self, config)
    }

    /// Evaluate with a fixed seed and otherwise default settings.
    pub fn check_seeded(&self, seed: Seed) -> Result<Outcome, CheckError> {
        run(self, &CheckConfig::default().with_seed(seed))
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("quantifiers", &self.quantifiers)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<String> = self.quantifiers.iter().map(ToString::to_string).collect();
        write!(f, "{}", chain.join(", "))
    }
}

/// Accumulates quantifiers; the first declaration error is reported by
/// [`PropertyBuilder::predicate`].
#[derive(Default)]
pub struct PropertyBuilder {
    quantifiers: Vec<Quantifier>,
    error: Option<DomainError>,
}

impl PropertyBuilder {
    /// Universally quantify `name` over `domain`.
    pub fn forall(self, name: &str, domain: impl Into<DomainExpr>) -> Self {
        self.push(QuantifierKind::ForAll, name, domain.into(), None)
    }

    /// Like [`forall`](Self::forall) with a per-quantifier sample count.
    pub fn forall_n(self, name: &str, domain: impl Into<DomainExpr>, samples: usize) -> Self {
        match SampleCount::new(samples) {
            Ok(samples) => self.push(QuantifierKind::ForAll, name, domain.into(), Some(samples)),
            Err(err) => self.fail(err.into()),
        }
    }

    /// Existentially quantify `name` over an exhaustive `domain`.
    pub fn exists(self, name: &str, domain: impl Into<DomainExpr>) -> Self {
        self.push(QuantifierKind::Exists, name, domain.into(), None)
    }

    /// Close the chain.
    pub fn predicate<F, R>(self, predicate: F) -> Result<Property, DomainError>
    where
        F: Fn(&Bindings) -> R + Send + Sync + 'static,
        R: IntoVerdict,
    {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.quantifiers.is_empty() {
            return Err(DomainError::usage(
                "a property needs at least one quantifier",
            ));
        }
        Ok(Property {
            quantifiers: self.quantifiers,
            predicate: Arc::new(move |bindings: &Bindings| predicate(bindings).into_verdict()),
        })
    }

    fn push(
        mut self,
        kind: QuantifierKind,
        name: &str,
        domain: DomainExpr,
        samples: Option<SampleCount>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let name = match VarName::new(name) {
            Ok(name) => name,
            Err(err) => return self.fail(err.into()),
        };
        if self.quantifiers.iter().any(|q| q.name == name) {
            return self.fail(DomainError::usage(format!(
                "variable `{name}` is already bound by an outer quantifier"
            )));
        }
        if let Some(unknown) = domain
            .reads()
            .iter()
            .find(|read| !self.quantifiers.iter().any(|q| q.name.as_str() == read.as_str()))
        {
            return self.fail(DomainError::usage(format!(
                "domain of `{name}` reads `{unknown}`, which no earlier quantifier binds"
            )));
        }
        self.quantifiers.push(Quantifier {
            kind,
            name,
            domain,
            samples,
        });
        self
    }

    fn fail(mut self, err: DomainError) -> Self {
        self.error.get_or_insert(err);
        self
    }
}
