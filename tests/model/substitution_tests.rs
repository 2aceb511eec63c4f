//! Integration tests for model substitution

use smitfit::numeric::{bindings, scalar};
use smitfit::symbolic::Expr;
use smitfit::{Model, SmitFitError, Symbol};

#[test]
fn test_substitution_leaves_original_alone() {
    let model = Model::parse(["y == a*x + b", "z == y + a"]).unwrap();
    let before = model.to_string();
    let order_before: Vec<String> = model
        .evaluation_order()
        .iter()
        .map(|s| s.name().to_string())
        .collect();

    let pinned = model.substitute([("a", 5.0)]).unwrap();

    assert_eq!(model.to_string(), before);
    let order_after: Vec<String> = model
        .evaluation_order()
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(order_after, order_before);
    assert!(model.input_symbols().contains(&Symbol::new("a")));
    assert!(!pinned.input_symbols().contains(&Symbol::new("a")));
}

#[test]
fn test_substituted_model_evaluates() {
    let model = Model::parse(["y == a*x + b"]).unwrap();
    let pinned = model.substitute([("a", 5.0)]).unwrap();

    let result = pinned.evaluate(&bindings([("x", 2.0), ("b", 1.0)])).unwrap();
    assert_eq!(result["y"], scalar(11.0));
}

#[test]
fn test_substitute_symbol_for_symbol() {
    let model = Model::parse(["y == a*x + b"]).unwrap();
    let renamed = model
        .substitute([("x", Expr::symbol("t")), ("b", Expr::parse_expr("c^2").unwrap())])
        .unwrap();

    let inputs: Vec<_> = renamed.input_symbols().iter().map(Symbol::name).collect();
    assert_eq!(inputs, vec!["a", "c", "t"]);

    let result = renamed
        .evaluate(&bindings([("a", 1.0), ("c", 3.0), ("t", 2.0)]))
        .unwrap();
    assert_eq!(result["y"], scalar(11.0));
}

#[test]
fn test_substitution_into_cycle() {
    let model = Model::parse(["y == a*x", "z == b"]).unwrap();
    let err = model.substitute([("a", Expr::symbol("z")), ("b", Expr::symbol("y"))]).unwrap_err();
    assert!(matches!(err, SmitFitError::CyclicModel(_)));
}
