//! Check results and their text report.

use std::fmt;

use forall_types::{Bindings, Seed};

/// Why a property failed. Ordinary test outcomes, never infrastructure faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The predicate returned false under `witness`.
    Counterexample { witness: Bindings },
    /// No element of an existential domain satisfied the rest of the chain.
    /// `context` holds the bindings of the enclosing quantifiers only.
    ExistentialUnsatisfied { context: Bindings },
    /// The predicate itself raised an error under `witness`.
    PredicateError { witness: Bindings, message: String },
}

impl Failure {
    /// Bindings in effect where the failure was detected.
    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        match self {
            Failure::Counterexample { witness } | Failure::PredicateError { witness, .. } => {
                witness
            }
            Failure::ExistentialUnsatisfied { context } => context,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Counterexample { witness } => write!(f, "counterexample: {witness}"),
            Failure::ExistentialUnsatisfied { context } if context.is_empty() => {
                write!(f, "existential unsatisfied")
            }
            Failure::ExistentialUnsatisfied { context } => {
                write!(f, "existential unsatisfied under: {context}")
            }
            Failure::PredicateError { witness, message } => {
                write!(f, "predicate error: {message}\n  at: {witness}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The property held. `witness` is set when an existential found one.
    Pass { witness: Option<Bindings> },
    Fail(Failure),
}

impl Verdict {
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass { .. })
    }
}

/// Result of one completed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Seed the check ran with. Pass it back to replay the run.
    pub seed: Seed,
    /// Number of predicate evaluations performed.
    pub evaluations: u64,
    pub verdict: Verdict,
}

impl Outcome {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.verdict.is_pass()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match &self.verdict {
            Verdict::Fail(failure) => Some(failure),
            Verdict::Pass { .. } => None,
        }
    }

    /// The existential witness of a pass, or the bindings of a failure.
    #[must_use]
    pub fn witness(&self) -> Option<&Bindings> {
        match &self.verdict {
            Verdict::Pass { witness } => witness.as_ref(),
            Verdict::Fail(failure) => Some(failure.bindings()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed() { "PASS" } else { "FAIL" };
        let plural = if self.evaluations == 1 { "" } else { "s" };
        write!(
            f,
            "{status} after {} evaluation{plural} (seed {})",
            self.evaluations, self.seed
        )?;
        match &self.verdict {
            Verdict::Pass { witness: Some(witness) } => write!(f, "\n  witness: {witness}"),
            Verdict::Pass { witness: None } => Ok(()),
            Verdict::Fail(failure) => write!(f, "\n  {failure}"),
        }
    }
}
