//! Quantifier evaluation.
//!
//! A check walks the quantifier chain depth first. Every quantifier takes
//! its values from the domain resolved under the bindings so far, binds
//! each in turn and descends; the innermost level calls the predicate.
//!
//! Forall stops at the first failing value; samples are drawn one at a time,
//! so nothing past the failing one is ever drawn. Exists stops at the first
//! passing value and requires an exhaustive domain. Predicate errors stop
//! both. Infrastructure faults ([`DomainError`]) abort the whole check.

use forall_config::{CheckSettings, ConfigError};
use forall_core::{DomainError, DomainRef, DrawContext};
use forall_types::{Bindings, SampleCount, Seed, Value};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::outcome::{Failure, Outcome, Verdict};
use crate::property::{PredicateResult, Property, Quantifier, QuantifierKind};

/// Child index that separates a nested quantifier's seed from the seed the
/// enclosing quantifier used to draw the value it is nested under.
pub const NESTED: u64 = u64::MAX;

/// Settings for one check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckConfig {
    /// Seed to run with. A random one is generated (and reported) when unset.
    pub seed: Option<Seed>,
    /// Samples each forall draws unless it overrides the count.
    pub samples: SampleCount,
}

impl CheckConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_samples(mut self, samples: SampleCount) -> Self {
        self.samples = samples;
        self
    }

    /// Settings from the forall config file, overridden by `FORALL_SEED`
    /// and `FORALL_SAMPLES`.
    pub fn from_environment() -> Result<Self, ConfigError> {
        CheckSettings::resolve().map(Self::from)
    }
}

impl From<CheckSettings> for CheckConfig {
    fn from(settings: CheckSettings) -> Self {
        Self {
            seed: settings.seed,
            samples: settings.samples,
        }
    }
}

/// An infrastructure fault that aborted a check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("check aborted (seed {seed}, bindings {bindings}): {source}")]
pub struct CheckError {
    pub seed: Seed,
    /// Bindings in effect when the fault occurred.
    pub bindings: Bindings,
    #[source]
    pub source: DomainError,
}

struct Abort {
    bindings: Bindings,
    source: DomainError,
}

impl Abort {
    fn at(bindings: &Bindings) -> impl FnOnce(DomainError) -> Abort + '_ {
        move |source| Abort {
            bindings: bindings.clone(),
            source,
        }
    }
}

/// Evaluate `property` with an optional seed and sample count.
pub fn check(
    property: &Property,
    seed: Option<Seed>,
    samples: Option<SampleCount>,
) -> Result<Outcome, CheckError> {
    let config = CheckConfig {
        seed,
        samples: samples.unwrap_or_default(),
    };
    run(property, &config)
}

pub(crate) fn run(property: &Property, config: &CheckConfig) -> Result<Outcome, CheckError> {
    let seed = config.seed.unwrap_or_else(|| Seed::new(rand::random()));
    debug!(%seed, samples = config.samples.get(), %property, "check started");

    let mut evaluator = Evaluator {
        property,
        samples: config.samples,
        evaluations: 0,
    };
    let verdict = evaluator
        .level(0, seed, &Bindings::new())
        .map_err(|abort| {
            debug!(%seed, bindings = %abort.bindings, error = %abort.source, "check aborted");
            CheckError {
                seed,
                bindings: abort.bindings,
                source: abort.source,
            }
        })?;

    let evaluations = evaluator.evaluations;
    if let Verdict::Fail(failure) = &verdict {
        info!(%seed, evaluations, %failure, "property falsified");
    }
    debug!(%seed, evaluations, passed = verdict.is_pass(), "check finished");
    Ok(Outcome {
        seed,
        evaluations,
        verdict,
    })
}

/// Seed for the quantifiers nested under sample `index`.
fn nested_seed(seed: Seed, index: usize) -> Seed {
    seed.descend(&[index as u64, NESTED])
}

struct Evaluator<'a> {
    property: &'a Property,
    samples: SampleCount,
    evaluations: u64,
}

impl Evaluator<'_> {
    fn level(&mut self, depth: usize, seed: Seed, bindings: &Bindings) -> Result<Verdict, Abort> {
        let property = self.property;
        let Some(quantifier) = property.quantifiers.get(depth) else {
            return Ok(self.evaluate(bindings));
        };
        let domain = quantifier
            .domain
            .resolve(bindings)
            .map_err(Abort::at(bindings))?;
        match quantifier.kind {
            QuantifierKind::ForAll => self.forall(depth, quantifier, &domain, seed, bindings),
            QuantifierKind::Exists => self.exists(depth, quantifier, &domain, seed, bindings),
        }
    }

    fn evaluate(&mut self, bindings: &Bindings) -> Verdict {
        self.evaluations += 1;
        match (self.property.predicate)(bindings) {
            PredicateResult::Holds => Verdict::Pass { witness: None },
            PredicateResult::Violated => Verdict::Fail(Failure::Counterexample {
                witness: bindings.clone(),
            }),
            PredicateResult::Error(message) => Verdict::Fail(Failure::PredicateError {
                witness: bindings.clone(),
                message,
            }),
        }
    }

    fn forall(
        &mut self,
        depth: usize,
        quantifier: &Quantifier,
        domain: &DomainRef,
        seed: Seed,
        bindings: &Bindings,
    ) -> Result<Verdict, Abort> {
        if domain.is_exhaustive() {
            let values = domain.enumerate().map_err(Abort::at(bindings))?;
            for (index, value) in values.into_iter().enumerate() {
                let verdict = self.step(depth, quantifier, index, value, seed, bindings)?;
                if !verdict.is_pass() {
                    return Ok(verdict);
                }
            }
            return Ok(Verdict::Pass { witness: None });
        }

        // Same values, in the same order, as `domain.produce(seed, count)`.
        let count = domain.sample_count(quantifier.samples.unwrap_or(self.samples).get());
        let mut cx = DrawContext::new();
        for index in 0..count {
            let value = domain
                .sample(&mut cx, seed, index)
                .map_err(Abort::at(bindings))?;
            let verdict = self.step(depth, quantifier, index, value, seed, bindings)?;
            if !verdict.is_pass() {
                return Ok(verdict);
            }
        }
        Ok(Verdict::Pass { witness: None })
    }

    fn exists(
        &mut self,
        depth: usize,
        quantifier: &Quantifier,
        domain: &DomainRef,
        seed: Seed,
        bindings: &Bindings,
    ) -> Result<Verdict, Abort> {
        if !domain.is_exhaustive() {
            return Err(Abort::at(bindings)(DomainError::usage(format!(
                "exists `{}` needs a domain marked exhaustive, got {}",
                quantifier.name,
                domain.describe()
            ))));
        }
        let values = domain.enumerate().map_err(Abort::at(bindings))?;

        for (index, value) in values.into_iter().enumerate() {
            let bound = self.bind(quantifier, index, value, bindings);
            match self.level(depth + 1, nested_seed(seed, index), &bound)? {
                Verdict::Pass { witness } => {
                    return Ok(Verdict::Pass {
                        witness: Some(witness.unwrap_or(bound)),
                    });
                }
                Verdict::Fail(failure @ Failure::PredicateError { .. }) => {
                    return Ok(Verdict::Fail(failure));
                }
                Verdict::Fail(_) => {}
            }
        }
        Ok(Verdict::Fail(Failure::ExistentialUnsatisfied {
            context: bindings.clone(),
        }))
    }

    /// Bind sample `index` and evaluate the rest of the chain under it.
    fn step(
        &mut self,
        depth: usize,
        quantifier: &Quantifier,
        index: usize,
        value: Value,
        seed: Seed,
        bindings: &Bindings,
    ) -> Result<Verdict, Abort> {
        let bound = self.bind(quantifier, index, value, bindings);
        self.level(depth + 1, nested_seed(seed, index), &bound)
    }

    fn bind(
        &self,
        quantifier: &Quantifier,
        index: usize,
        value: Value,
        bindings: &Bindings,
    ) -> Bindings {
        trace!(var = %quantifier.name, index, %value, "bound");
        bindings.with(quantifier.name.clone(), value)
    }
}
