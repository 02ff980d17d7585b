//! Leaf domains draw directly from a seeded generator.

use forall_types::{Seed, Value};
use rand::Rng;

use crate::DomainError;
use crate::domain::{Domain, DrawContext, rng};

/// Default bounds of [`Int`].
pub const DEFAULT_INT_MIN: i64 = 0;
pub const DEFAULT_INT_MAX: i64 = 10_000;

/// Integers in `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int {
    min: i64,
    max: i64,
}

impl Int {
    pub fn new(min: i64, max: i64) -> Result<Self, DomainError> {
        if min > max {
            return Err(DomainError::usage(format!(
                "max value ({max}) cannot be smaller than min value ({min})"
            )));
        }
        Ok(Self { min, max })
    }

    /// Integers in `0..=max`.
    pub fn up_to(max: i64) -> Result<Self, DomainError> {
        Self::new(DEFAULT_INT_MIN, max)
    }

    #[must_use]
    pub const fn min(&self) -> i64 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> i64 {
        self.max
    }
}

impl Default for Int {
    fn default() -> Self {
        Self {
            min: DEFAULT_INT_MIN,
            max: DEFAULT_INT_MAX,
        }
    }
}

impl Domain for Int {
    fn draw(&self, _cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        Ok(Value::Int(rng(seed).random_range(self.min..=self.max)))
    }

    fn describe(&self) -> String {
        format!("Int({}..={})", self.min, self.max)
    }

    fn enumerate_in(&self, _cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        Ok((self.min..=self.max).map(Value::Int).collect())
    }

    fn boundary(&self) -> Option<Value> {
        (self.min..=self.max).contains(&0).then_some(Value::Int(0))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Boolean;

impl Domain for Boolean {
    fn draw(&self, _cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        Ok(Value::Bool(rng(seed).random::<bool>()))
    }

    fn describe(&self) -> String {
        "Boolean".to_string()
    }

    fn is_exhaustive(&self) -> bool {
        true
    }

    fn enumerate_in(&self, _cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        Ok(vec![Value::Bool(false), Value::Bool(true)])
    }
}

/// A domain holding exactly one value.
#[derive(Debug, Clone)]
pub struct Constant(Value);

impl Constant {
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }
}

impl Domain for Constant {
    fn draw(&self, _cx: &mut DrawContext, _seed: Seed) -> Result<Value, DomainError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        if self.0.is_none() {
            "None".to_string()
        } else {
            format!("Singleton({})", self.0)
        }
    }

    fn is_exhaustive(&self) -> bool {
        true
    }

    fn enumerate_in(&self, _cx: &mut DrawContext) -> Result<Vec<Value>, DomainError> {
        Ok(vec![self.0.clone()])
    }
}

/// Character set a [`Text`] domain draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// `[_A-Za-z][_A-Za-z0-9]*`, the usual shape of variable names.
    Identifier,
    /// `' '..='~'`.
    AsciiPrintable,
    /// Any non-control scalar value from U+0020 to U+E007F.
    Unicode,
}

const IDENT_HEAD: &[u8] = b"_abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const IDENT_TAIL: &[u8] = b"_abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_TEXT_MAX_LEN: usize = 80;
pub const DEFAULT_IDENT_MAX_LEN: usize = 8;

/// Strings of `min_len..=max_len` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Text {
    alphabet: Alphabet,
    min_len: usize,
    max_len: usize,
}

impl Text {
    pub fn new(alphabet: Alphabet, min_len: usize, max_len: usize) -> Result<Self, DomainError> {
        if max_len < min_len {
            return Err(DomainError::usage(format!(
                "max len ({max_len}) cannot be smaller than min len ({min_len})"
            )));
        }
        if alphabet == Alphabet::Identifier && min_len < 1 {
            return Err(DomainError::usage(
                "identifiers need a min len of at least one char",
            ));
        }
        Ok(Self {
            alphabet,
            min_len,
            max_len,
        })
    }

    #[must_use]
    pub fn identifiers() -> Self {
        Self {
            alphabet: Alphabet::Identifier,
            min_len: 1,
            max_len: DEFAULT_IDENT_MAX_LEN,
        }
    }

    #[must_use]
    pub fn printable() -> Self {
        Self {
            alphabet: Alphabet::AsciiPrintable,
            min_len: 0,
            max_len: DEFAULT_TEXT_MAX_LEN,
        }
    }

    #[must_use]
    pub fn unicode() -> Self {
        Self {
            alphabet: Alphabet::Unicode,
            min_len: 0,
            max_len: DEFAULT_TEXT_MAX_LEN,
        }
    }
}

fn pick_byte<R: Rng>(rng: &mut R, set: &[u8]) -> char {
    char::from(set[rng.random_range(0..set.len())])
}

fn unicode_char<R: Rng>(rng: &mut R) -> char {
    loop {
        let code = rng.random_range(0x20..=0xE_007F_u32);
        if let Some(ch) = char::from_u32(code)
            && !ch.is_control()
        {
            return ch;
        }
    }
}

impl Domain for Text {
    fn draw(&self, _cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        let mut rng = rng(seed);
        let len = rng.random_range(self.min_len..=self.max_len);
        let text: String = (0..len)
            .map(|i| match self.alphabet {
                Alphabet::Identifier if i == 0 => pick_byte(&mut rng, IDENT_HEAD),
                Alphabet::Identifier => pick_byte(&mut rng, IDENT_TAIL),
                Alphabet::AsciiPrintable => char::from(rng.random_range(b' '..=b'~')),
                Alphabet::Unicode => unicode_char(&mut rng),
            })
            .collect();
        Ok(Value::Str(text))
    }

    fn describe(&self) -> String {
        let name = match self.alphabet {
            Alphabet::Identifier => "Identifier",
            Alphabet::AsciiPrintable => "Printable",
            Alphabet::Unicode => "Unicode",
        };
        format!("{name}({}..={})", self.min_len, self.max_len)
    }

    fn boundary(&self) -> Option<Value> {
        (self.min_len == 0).then(|| Value::Str(String::new()))
    }
}
