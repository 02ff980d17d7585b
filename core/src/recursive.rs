//! Self-referential domains with a depth budget.
//!
//! A recursive domain is declared by a factory that receives a [`SelfRef`]
//! handle and returns the domain's shape. Every time the shape is expanded,
//! the handle it receives carries one unit less of budget. At budget zero
//! the handle's domain reports itself [`blocked`](Domain::blocked). Blocking
//! propagates through every composite that contains the handle, and unions
//! skip blocked branches, so every draw terminates within `max_depth`
//! expansions.

use std::sync::Arc;

use forall_types::{Seed, Value};

use crate::DomainError;
use crate::domain::{Domain, DomainRef, DrawContext};

/// Expansion budget used by [`recursive`].
pub const DEFAULT_MAX_DEPTH: usize = 6;

type Factory = Arc<dyn Fn(&SelfRef) -> Result<DomainRef, DomainError> + Send + Sync>;

/// Handle to the recursive domain being defined, as seen from inside its factory.
#[derive(Clone)]
pub struct SelfRef {
    factory: Factory,
    remaining: usize,
}

impl SelfRef {
    /// A domain that expands the factory one level deeper.
    #[must_use]
    pub fn domain(&self) -> DomainRef {
        DomainRef::new(Expansion {
            factory: Arc::clone(&self.factory),
            remaining: self.remaining,
        })
    }
}

struct Expansion {
    factory: Factory,
    remaining: usize,
}

impl Domain for Expansion {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        if self.remaining == 0 {
            return Err(DomainError::usage(
                "recursive reference drawn after its depth budget was spent",
            ));
        }
        let next = SelfRef {
            factory: Arc::clone(&self.factory),
            remaining: self.remaining - 1,
        };
        (self.factory)(&next)?.draw(cx, seed)
    }

    fn describe(&self) -> String {
        "self".to_string()
    }

    fn blocked(&self) -> bool {
        self.remaining == 0
    }
}

pub struct Recursive {
    factory: Factory,
    max_depth: usize,
    shape: String,
}

impl Recursive {
    pub fn new(
        factory: impl Fn(&SelfRef) -> Result<DomainRef, DomainError> + Send + Sync + 'static,
    ) -> Result<Self, DomainError> {
        Self::with_max_depth(factory, DEFAULT_MAX_DEPTH)
    }

    /// Fails with a usage error when the factory has no base case, i.e. its
    /// shape is blocked once the budget is spent.
    pub fn with_max_depth(
        factory: impl Fn(&SelfRef) -> Result<DomainRef, DomainError> + Send + Sync + 'static,
        max_depth: usize,
    ) -> Result<Self, DomainError> {
        let factory: Factory = Arc::new(factory);
        let spent = SelfRef {
            factory: Arc::clone(&factory),
            remaining: 0,
        };
        let base = factory(&spent)?;
        if base.blocked() {
            return Err(DomainError::usage(format!(
                "recursive domain {} has no base case",
                base.describe()
            )));
        }
        let shape = base.describe();
        Ok(Self {
            factory,
            max_depth,
            shape,
        })
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.factory).cast::<()>() as usize
    }
}

impl Domain for Recursive {
    fn draw(&self, cx: &mut DrawContext, seed: Seed) -> Result<Value, DomainError> {
        let root = SelfRef {
            factory: Arc::clone(&self.factory),
            remaining: self.max_depth,
        };
        cx.within(self.id(), &self.shape, |cx| {
            (self.factory)(&root)?.draw(cx, seed)
        })
    }

    fn describe(&self) -> String {
        format!("recursive({}, depth={})", self.shape, self.max_depth)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, OnceLock};

    use forall_types::{Seed, Value};
    use proptest::prelude::*;

    use super::{Recursive, SelfRef};
    use crate::{
        Domain, DomainError, DomainRef, boolean, int, lazy, list, list_of, recursive, tuple,
        union,
    };

    /// `Int(0..=9) | List(self, 0..=3)`
    fn nested_lists(depth: usize) -> Recursive {
        Recursive::with_max_depth(
            |me: &SelfRef| Ok(int(0, 9)? | list(me.domain(), 0, 3)?),
            depth,
        )
        .unwrap()
    }

    proptest! {
        #[test]
        fn draws_never_exceed_depth_budget(seed in any::<u64>(), depth in 0usize..5) {
            let domain = nested_lists(depth);
            for value in domain.produce(Seed::new(seed), 20).unwrap() {
                prop_assert!(value.depth() <= depth);
            }
        }

        #[test]
        fn identical_seeds_draw_identical_trees(seed in any::<u64>()) {
            let domain = nested_lists(4);
            prop_assert_eq!(
                domain.produce(Seed::new(seed), 10).unwrap(),
                domain.produce(Seed::new(seed), 10).unwrap()
            );
        }
    }

    #[test]
    fn zero_budget_yields_only_base_values() {
        let domain = nested_lists(0);
        for value in domain.produce(Seed::new(2), 50).unwrap() {
            assert!(matches!(value, Value::Int(_)));
        }
    }

    #[test]
    fn nesting_appears_with_budget() {
        let domain = nested_lists(3);
        let deepest = domain
            .produce(Seed::new(5), 200)
            .unwrap()
            .iter()
            .map(Value::depth)
            .max()
            .unwrap();
        assert!(deepest >= 1);
    }

    #[test]
    fn missing_base_case_is_rejected() {
        let err = recursive(|me: &SelfRef| Ok(tuple([boolean(), me.domain()]))).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("no base case"));

        let only_self = recursive(|me: &SelfRef| union([me.domain()]));
        assert!(matches!(only_self, Err(DomainError::Usage(_))));

        // A container of self is still a self reference.
        assert!(recursive(|me: &SelfRef| Ok(list_of(me.domain()))).is_err());
    }

    #[test]
    fn factory_errors_surface_at_construction() {
        let err = recursive(|_: &SelfRef| int(5, 1)).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn mutual_recursion_is_a_usage_error() {
        let other: Arc<OnceLock<DomainRef>> = Arc::new(OnceLock::new());
        let forward = Arc::clone(&other);
        let first = recursive(move |_: &SelfRef| {
            let forward = Arc::clone(&forward);
            let next = lazy(move || {
                forward
                    .get()
                    .cloned()
                    .ok_or_else(|| DomainError::usage("forward reference never set"))
            });
            Ok(tuple([int(0, 3)?, next]))
        })
        .unwrap();

        let back = first.clone();
        let second = recursive(move |_: &SelfRef| Ok(tuple([boolean(), back.clone()]))).unwrap();
        assert!(other.set(second).is_ok());

        let err = first.produce(Seed::new(1), 1).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("mutually recursive"));
    }

    #[test]
    fn independent_recursive_domains_compose() {
        let leaf = recursive(|me: &SelfRef| Ok(boolean() | list(me.domain(), 0, 2)?)).unwrap();
        let pair = tuple([leaf.clone(), leaf]);
        assert_eq!(pair.produce(Seed::new(4), 25).unwrap().len(), 25);
    }

    #[test]
    fn describe_shows_shape_and_budget() {
        assert_eq!(
            nested_lists(2).describe(),
            "recursive(Int(0..=9) | List(self, 0..=3), depth=2)"
        );
    }
}
