//! Property-based tests for analysis and evaluation

use calcprog::{ErrorKind, Scope, StoredExpression, analyze, evaluate};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,8}"
}

/// Random expression text over `{{name}}` references
fn expression() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..1000).prop_map(|n| n.to_string()),
        (0.0f64..100.0).prop_map(|x| format!("{x:.3}")),
        identifier().prop_map(|name| format!("{{{{{name}}}}}")),
        Just("pi".to_string()),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        let op = prop::sample::select(vec!["+", "-", "*", "/", "^", "%", "==", "<", "and", "or"]);
        let func = prop::sample::select(vec!["abs", "sqrt", "log", "floor", "max"]);
        prop_oneof![
            (inner.clone(), op, inner.clone()).prop_map(|(l, op, r)| format!("({l} {op} {r})")),
            (func, inner.clone()).prop_map(|(f, x)| format!("{f}({x})")),
            inner.clone().prop_map(|x| format!("-{x}")),
            (inner.clone(), inner.clone(), inner).prop_map(|(c, a, b)| format!("({c} ? {a} : {b})")),
        ]
    })
}

proptest! {
    #[test]
    fn test_no_references_means_no_variables(source in "[^{}]{0,40}") {
        prop_assert!(analyze(&source).variables.is_empty());
    }

    #[test]
    fn test_variables_are_sorted_and_distinct(names in prop::collection::vec(identifier(), 1..8)) {
        let source = names.iter().map(|n| format!("{{{{{n}}}}}")).collect::<Vec<_>>().join(" + ");
        let expected: Vec<String> = names.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        let analysis = analyze(&source);
        prop_assert_eq!(analysis.variables, expected);
        prop_assert_eq!(analysis.error, None);
    }

    #[test]
    fn test_complete_scope_never_reports_unknown_symbol(
        source in expression(),
        seed in prop::collection::vec(-1000.0f64..1000.0, 1..16),
    ) {
        let analysis = analyze(&source);
        prop_assert_eq!(&analysis.error, &None);
        let scope: Scope = analysis
            .variables
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), seed[i % seed.len()]))
            .collect();

        if let Err(err) = evaluate(&StoredExpression::new(source), &scope) {
            prop_assert_ne!(err.kind(), ErrorKind::UnknownSymbol);
        }
    }

    #[test]
    fn test_evaluation_is_idempotent(source in expression(), value in -100.0f64..100.0) {
        let expression = StoredExpression::new(source);
        let scope: Scope = analyze(&expression.source)
            .variables
            .into_iter()
            .map(|name| (name, value))
            .collect();
        // NaN payloads never compare equal, so compare renderings
        let first = format!("{:?}", evaluate(&expression, &scope));
        let second = format!("{:?}", evaluate(&expression, &scope));
        prop_assert_eq!(first, second);
    }
}
