//! Domain expressions that may depend on earlier quantified variables.

use std::fmt;
use std::sync::Arc;

use forall_core::{DomainError, DomainRef};
use forall_types::Bindings;

type BuildFn = Arc<dyn Fn(&Bindings) -> Result<DomainRef, DomainError> + Send + Sync>;

/// The domain a quantifier ranges over.
#[derive(Clone)]
pub enum DomainExpr {
    /// A domain fixed when the property is declared.
    Resolved(DomainRef),
    /// A domain built per outer sample from the variables it reads.
    Deferred { reads: Vec<String>, build: BuildFn },
}

impl DomainExpr {
    /// Declare a domain built from the variables named in `reads`.
    ///
    /// `build` only sees the declared reads, never the rest of the bindings.
    pub fn deferred<S: Into<String>>(
        reads: impl IntoIterator<Item = S>,
        build: impl Fn(&Bindings) -> Result<DomainRef, DomainError> + Send + Sync + 'static,
    ) -> Self {
        DomainExpr::Deferred {
            reads: reads.into_iter().map(Into::into).collect(),
            build: Arc::new(build),
        }
    }

    /// Variables this expression reads.
    #[must_use]
    pub fn reads(&self) -> &[String] {
        match self {
            DomainExpr::Resolved(_) => &[],
            DomainExpr::Deferred { reads, .. } => reads,
        }
    }

    /// The concrete domain under `bindings`.
    ///
    /// A fresh domain is built on every call for deferred expressions.
    pub fn resolve(&self, bindings: &Bindings) -> Result<DomainRef, DomainError> {
        match self {
            DomainExpr::Resolved(domain) => Ok(domain.clone()),
            DomainExpr::Deferred { reads, build } => {
                let visible = bindings.project(reads.as_slice())?;
                build(&visible)
            }
        }
    }
}

impl From<DomainRef> for DomainExpr {
    fn from(domain: DomainRef) -> Self {
        DomainExpr::Resolved(domain)
    }
}

impl From<&DomainRef> for DomainExpr {
    fn from(domain: &DomainRef) -> Self {
        DomainExpr::Resolved(domain.clone())
    }
}

impl fmt::Debug for DomainExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainExpr::Resolved(domain) => f.debug_tuple("Resolved").field(domain).finish(),
            DomainExpr::Deferred { reads, .. } => {
                f.debug_struct("Deferred").field("reads", reads).finish_non_exhaustive()
            }
        }
    }
}

impl fmt::Display for DomainExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainExpr::Resolved(domain) => write!(f, "{domain}"),
            DomainExpr::Deferred { reads, .. } => write!(f, "<depends on {}>", reads.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use forall_core::{DomainError, boolean, int};
    use forall_types::{Bindings, Seed, Value, VarName};

    use super::DomainExpr;

    fn var(name: &str) -> VarName {
        VarName::new(name).unwrap()
    }

    #[test]
    fn resolved_ignores_bindings() {
        let expr = DomainExpr::from(boolean());
        assert!(expr.reads().is_empty());
        let domain = expr.resolve(&Bindings::new()).unwrap();
        assert_eq!(domain.describe(), "Boolean");
    }

    #[test]
    fn deferred_builds_from_declared_reads() {
        let expr = DomainExpr::deferred(["x"], |b| int(0, b.int("x")?));
        let bindings = Bindings::new().with(var("x"), Value::Int(4));
        let domain = expr.resolve(&bindings).unwrap();
        assert_eq!(domain.describe(), "Int(0..=4)");
        for value in domain.produce(Seed::new(3), 30).unwrap() {
            assert!(value.as_int().unwrap() <= 4);
        }
    }

    #[test]
    fn deferred_only_sees_its_reads() {
        let expr = DomainExpr::deferred(["x"], |b| {
            assert!(!b.contains("secret"));
            int(0, b.int("x")?)
        });
        let bindings = Bindings::new()
            .with(var("secret"), Value::Int(1))
            .with(var("x"), Value::Int(2));
        assert!(expr.resolve(&bindings).is_ok());
    }

    #[test]
    fn unbound_read_is_a_usage_error() {
        let expr = DomainExpr::deferred(["x"], |b| int(0, b.int("x")?));
        let err = expr.resolve(&Bindings::new()).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn wrongly_typed_read_is_a_usage_error() {
        let expr = DomainExpr::deferred(["flag"], |b| int(0, b.int("flag")?));
        let bindings = Bindings::new().with(var("flag"), Value::Bool(true));
        assert!(matches!(expr.resolve(&bindings), Err(DomainError::Usage(_))));
    }

    #[test]
    fn display_names_dependencies() {
        let expr = DomainExpr::deferred(["x", "y"], |_| Ok(boolean()));
        assert_eq!(expr.to_string(), "<depends on x, y>");
        assert_eq!(DomainExpr::from(boolean()).to_string(), "Boolean");
    }
}
