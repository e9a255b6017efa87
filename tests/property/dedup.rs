//! Property-based tests for the lambda deduplication registry.

use proptest::prelude::*;

use emberc::codegen::expr::{Lambda, LambdaExpr, Param};
use emberc::codegen::lambda::{LambdaDedup, process_lambda};

fn arb_identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

// Bodies built from a fixed, static-free statement shape.
fn arb_body() -> impl Strategy<Value = String> {
    (arb_identifier(), 0i64..1000).prop_map(|(name, n)| format!("int {name} = {n}; return {name};"))
}

fn arb_return_type() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("int".to_string())),
        Just(Some("float".to_string())),
        Just(Some("bool".to_string())),
    ]
}

fn arb_params() -> impl Strategy<Value = Vec<Param>> {
    prop::collection::vec(
        (arb_identifier(), arb_identifier()).prop_map(|(ty, name)| Param::new(ty, name)),
        0..3,
    )
}

fn lambda(body: &str, params: Vec<Param>, capture: &str, ret: Option<String>) -> Lambda {
    Lambda::new(vec![body.to_string()], params, capture, ret, None)
}

fn shared_name(expr: &LambdaExpr) -> Option<String> {
    match expr {
        LambdaExpr::Shared(shared) => Some(shared.func_name.clone()),
        LambdaExpr::Inline(_) => None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Field-wise identical eligible lambdas always share one name.
    #[test]
    fn construction_is_idempotent(
        body in arb_body(),
        params in arb_params(),
        ret in arb_return_type(),
    ) {
        let mut dedup = LambdaDedup::new();
        let a = process_lambda(&mut dedup, lambda(&body, params.clone(), "", ret.clone()));
        let b = process_lambda(&mut dedup, lambda(&body, params, "", ret));
        prop_assert_eq!(shared_name(&a).unwrap(), shared_name(&b).unwrap());
        prop_assert_eq!(dedup.pending_len(), 1);
    }

    /// Distinct bodies always get distinct names, one declaration each.
    #[test]
    fn distinct_bodies_get_distinct_names(
        a in 0i64..1000,
        b in 0i64..1000,
        ret in arb_return_type(),
    ) {
        prop_assume!(a != b);
        let mut dedup = LambdaDedup::new();
        let first = dedup.intern(&lambda(&format!("return {a};"), vec![], "", ret.clone()));
        let second = dedup.intern(&lambda(&format!("return {b};"), vec![], "", ret));
        prop_assert_ne!(first.func_name, second.func_name);
        prop_assert_eq!(dedup.pending_len(), 2);
    }

    /// The nth allocation is named `shared_lambda_<n-1>`; names never
    /// repeat within a run.
    #[test]
    fn allocation_is_monotonic(count in 1usize..20) {
        let mut dedup = LambdaDedup::new();
        for n in 0..count {
            let shared = dedup.intern(&lambda(&format!("return {n};"), vec![], "", None));
            prop_assert_eq!(shared.func_name, format!("shared_lambda_{n}"));
        }
        prop_assert_eq!(dedup.pending_len(), count);
    }

    /// A non-empty capture always forces inline emission, regardless of
    /// body equality with previously shared lambdas.
    #[test]
    fn captures_are_excluded(
        body in arb_body(),
        capture in prop_oneof![Just("="), Just("&"), Just("this")],
    ) {
        let mut dedup = LambdaDedup::new();
        // Register the same body as shareable first.
        let shared = process_lambda(&mut dedup, lambda(&body, vec![], "", None));
        prop_assert!(shared.is_shared());

        let captured = process_lambda(&mut dedup, lambda(&body, vec![], capture, None));
        prop_assert!(!captured.is_shared());
        prop_assert_eq!(dedup.pending_len(), 1);
    }

    /// Eligible or not, construction never fails and rendering always
    /// produces non-empty source text.
    #[test]
    fn construction_is_total(
        body in arb_body(),
        params in arb_params(),
        capture in prop_oneof![Just(""), Just("=")],
        ret in arb_return_type(),
    ) {
        let mut dedup = LambdaDedup::new();
        let expr = process_lambda(&mut dedup, lambda(&body, params, capture, ret));
        prop_assert!(!expr.to_string().is_empty());
    }
}
