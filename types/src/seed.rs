//! Seeds and sample counts.
//!
//! A [`Seed`] never feeds a shared generator. Every composite draw derives
//! an independent child seed from its parent and a structural path, so two
//! sibling components cannot observe correlated values and any sample can
//! be replayed from the seed that produced it.

use std::fmt;
use std::num::{NonZeroUsize, ParseIntError};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Root of a reproducible pseudo-random sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(u64);

impl Seed {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derive the seed for component `index` of whatever this seed drives.
    ///
    /// Deterministic in `(self, index)`; distinct indices give unrelated seeds.
    #[must_use]
    pub fn child(self, index: u64) -> Seed {
        Seed(xxh3_64_with_seed(&index.to_le_bytes(), self.0))
    }

    /// Derive a seed from a multi-step structural path.
    #[must_use]
    pub fn descend(self, path: &[u64]) -> Seed {
        path.iter().fold(self, |seed, index| seed.child(*index))
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Seed {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Seed)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleCountError {
    #[error("sample count must be at least 1")]
    Zero,
    #[error("invalid sample count {0:?}")]
    Invalid(String),
}

/// Number of samples a forall quantifier draws from a non-exhaustive domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct SampleCount(NonZeroUsize);

impl SampleCount {
    pub const DEFAULT: SampleCount = SampleCount(NonZeroUsize::new(100).unwrap());

    pub fn new(value: usize) -> Result<Self, SampleCountError> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or(SampleCountError::Zero)
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for SampleCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for SampleCount {
    type Error = SampleCountError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SampleCount> for usize {
    fn from(value: SampleCount) -> Self {
        value.get()
    }
}

impl FromStr for SampleCount {
    type Err = SampleCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<usize>()
            .map_err(|_| SampleCountError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for SampleCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
