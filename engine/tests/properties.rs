//! End-to-end checks of domains and quantifiers.

use std::sync::{Arc, OnceLock};

use forall_core::{
    DomainError, DomainRef, Int, SelfRef, boolean, from_sequence, int, lazy, list,
    recursive_with_depth, sublists, tuple,
};
use forall_engine::{DomainExpr, Failure, Property, Verdict, check};
use forall_types::{BindingError, SampleCount, Seed, Value, VarName};
use proptest::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn tree(depth: usize) -> DomainRef {
    recursive_with_depth(
        |me: &SelfRef| Ok(boolean() | list(me.domain(), 1, 3)?),
        depth,
    )
    .unwrap()
}

proptest! {
    #[test]
    fn same_seed_same_samples(seed in any::<u64>()) {
        let domain = tuple([int(-50, 50).unwrap(), boolean() | tree(3)]);
        prop_assert_eq!(
            domain.produce(Seed::new(seed), 25).unwrap(),
            domain.produce(Seed::new(seed), 25).unwrap()
        );
    }

    #[test]
    fn union_values_come_from_a_branch(seed in any::<u64>()) {
        let domain = int(0, 5).unwrap() | boolean();
        for value in domain.produce(Seed::new(seed), 50).unwrap() {
            let in_ints = value.as_int().is_some_and(|n| (0..=5).contains(&n));
            let in_bools = value.as_bool().is_some();
            prop_assert!(in_ints || in_bools, "{value} is in neither branch");
        }
    }

    #[test]
    fn filtered_values_satisfy_the_predicate(seed in any::<u64>()) {
        let odd = int(0, 1_000).unwrap().filter(|v| v.as_int().is_some_and(|n| n % 2 == 1));
        for value in odd.produce(Seed::new(seed), 50).unwrap() {
            prop_assert_eq!(value.as_int().map(|n| n % 2), Some(1));
        }
    }

    #[test]
    fn recursion_respects_depth_budget(seed in any::<u64>(), depth in 0usize..6) {
        for value in tree(depth).produce(Seed::new(seed), 20).unwrap() {
            prop_assert!(value.depth() <= depth);
        }
    }
}

#[test]
fn identical_seeds_give_identical_outcomes() {
    init_tracing();
    let prop = Property::builder()
        .forall("x", int(-100, 100).unwrap())
        .forall("t", tree(3))
        .predicate(|b| b.int("x").map(|x| x < 90))
        .unwrap();
    let first = prop.check_seeded(Seed::new(2024)).unwrap();
    let second = prop.check_seeded(Seed::new(2024)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn zero_depth_recursion_yields_base_values() {
    for value in tree(0).produce(Seed::new(17), 100).unwrap() {
        assert!(matches!(value, Value::Bool(_)));
    }
}

#[test]
fn integer_identity_holds() {
    init_tracing();
    let prop = Property::builder()
        .forall("x", int(-1_000_000, 1_000_000).unwrap())
        .predicate(|b| b.int("x").map(|x| x * -x == -(x * x)))
        .unwrap();
    let outcome = prop.check_seeded(Seed::new(11)).unwrap();
    assert!(outcome.passed(), "{outcome}");
    assert_eq!(outcome.evaluations, 100);
}

#[test]
fn exists_finds_first_witness() {
    init_tracing();
    let prop = Property::builder()
        .exists("y", from_sequence(1..9))
        .predicate(|b| b.int("y").map(|y| y > 7))
        .unwrap();
    let outcome = prop.check_seeded(Seed::new(0)).unwrap();
    assert_eq!(
        outcome.verdict,
        Verdict::Pass {
            witness: Some(
                [(VarName::new("y").unwrap(), Value::Int(8))]
                    .into_iter()
                    .collect()
            )
        }
    );
    assert_eq!(outcome.evaluations, 8);
}

#[test]
fn exists_without_witness_is_unsatisfied() {
    init_tracing();
    let prop = Property::builder()
        .exists("y", from_sequence(1..9))
        .predicate(|b| b.int("y").map(|y| y > 10))
        .unwrap();
    let outcome = prop.check_seeded(Seed::new(0)).unwrap();
    let Some(Failure::ExistentialUnsatisfied { context }) = outcome.failure() else {
        panic!("expected an unsatisfied existential, got {outcome}");
    };
    assert!(context.is_empty());
    assert_eq!(outcome.evaluations, 8);
}

#[test]
fn nested_exists_reports_outer_context() {
    let prop = Property::builder()
        .forall("x", from_sequence([1, 5]))
        .exists("y", from_sequence(0..4))
        .predicate(|b| Ok::<_, BindingError>(b.int("y")? >= b.int("x")?))
        .unwrap();
    let outcome = prop.check_seeded(Seed::new(0)).unwrap();
    assert_eq!(
        outcome.failure().map(ToString::to_string),
        Some("existential unsatisfied under: x = 5".to_string())
    );
}

#[test]
fn dependent_domain_sees_outer_value() {
    init_tracing();
    let prop = Property::builder()
        .forall("x", int(0, 50).unwrap())
        .forall(
            "y",
            DomainExpr::deferred(["x"], |b| Int::up_to(b.int("x")?).map(DomainRef::from)),
        )
        .predicate(|b| Ok::<_, BindingError>(b.int("y")? <= b.int("x")?))
        .unwrap();
    let outcome = check(&prop, Some(Seed::new(5)), SampleCount::new(20).ok()).unwrap();
    assert!(outcome.passed());
    assert_eq!(outcome.evaluations, 400);
}

#[test]
fn nested_forall_cost_is_multiplicative() {
    let prop = Property::builder()
        .forall_n("a", int(0, 1_000).unwrap(), 7)
        .forall_n("b", int(0, 1_000).unwrap(), 5)
        .predicate(|_| true)
        .unwrap();
    let outcome = prop.check_seeded(Seed::new(8)).unwrap();
    assert_eq!(outcome.evaluations, 35);
}

#[test]
fn counterexample_carries_full_witness_chain() {
    let prop = Property::builder()
        .forall("x", from_sequence([1, 2, 3]))
        .forall("y", from_sequence([10, 20]))
        .predicate(|b| Ok::<_, BindingError>(b.int("x")? + b.int("y")? < 22))
        .unwrap();
    let outcome = prop.check_seeded(Seed::new(0)).unwrap();
    assert_eq!(
        outcome.failure(),
        Some(&Failure::Counterexample {
            witness: [
                (VarName::new("x").unwrap(), Value::Int(2)),
                (VarName::new("y").unwrap(), Value::Int(20)),
            ]
            .into_iter()
            .collect()
        })
    );
    assert_eq!(outcome.evaluations, 4);
}

#[test]
fn limited_domain_caps_samples() {
    let prop = Property::builder()
        .forall("x", int(0, 1_000).unwrap().limit(3))
        .predicate(|_| true)
        .unwrap();
    assert_eq!(prop.check_seeded(Seed::new(1)).unwrap().evaluations, 3);
}

#[test]
fn exhausted_filter_aborts_with_seed() {
    let never = int(0, 10).unwrap().filter(|_| false);
    let prop = Property::builder()
        .forall("x", never)
        .predicate(|_| true)
        .unwrap();
    let err = prop.check_seeded(Seed::new(77)).unwrap_err();
    assert_eq!(err.seed, Seed::new(77));
    assert!(err.to_string().contains("generation exhausted"));
}

#[test]
fn witness_serializes_in_binding_order() {
    let prop = Property::builder()
        .forall("b", boolean())
        .forall("n", from_sequence([3]))
        .predicate(|b| b.bool("b"))
        .unwrap();
    let outcome = prop.check_seeded(Seed::new(0)).unwrap();
    let witness = outcome.witness().unwrap();
    assert_eq!(witness.to_json().unwrap(), r#"{"b":false,"n":3}"#);
}

#[test]
fn counterexample_found_before_a_generation_fault_is_reported() {
    init_tracing();
    let zero_only = int(0, 1_000)
        .unwrap()
        .filter(|v| v.as_int() == Some(0));
    let prop = Property::builder()
        .forall("x", zero_only)
        .predicate(|b| b.int("x").map(|x| x != 0))
        .unwrap();
    let outcome = prop.check_seeded(Seed::new(1)).unwrap();
    assert_eq!(
        outcome.failure().map(|f| f.bindings().to_string()),
        Some("x = 0".to_string())
    );
}

#[test]
fn lazy_cycle_aborts_the_check() {
    let slot: Arc<OnceLock<DomainRef>> = Arc::new(OnceLock::new());
    let forward = Arc::clone(&slot);
    let a = lazy(move || {
        forward
            .get()
            .cloned()
            .ok_or_else(|| DomainError::usage("unset"))
    });
    let back = a.clone();
    assert!(slot.set(lazy(move || Ok(back.clone()))).is_ok());

    let prop = Property::builder()
        .forall("x", a)
        .predicate(|_| true)
        .unwrap();
    let err = prop.check_seeded(Seed::new(1)).unwrap_err();
    assert!(err.source.is_usage());
    assert!(err.to_string().contains("mutually recursive"));
}

#[test]
fn exists_over_marked_sublists() {
    let prop = Property::builder()
        .exists("s", sublists([3, 1, 4, 1, 5]).exhaustive(true))
        .predicate(|b| {
            let total: i64 = b
                .get("s")
                .and_then(Value::as_seq)
                .map_or(0, |items| items.iter().filter_map(Value::as_int).sum());
            total == 10
        })
        .unwrap();
    let outcome = prop.check_seeded(Seed::new(0)).unwrap();
    assert_eq!(
        outcome.witness().map(ToString::to_string),
        Some("s = [4, 1, 5]".to_string())
    );
}
