//! Integration tests for model construction and evaluation

use approx::assert_relative_eq;
use ndarray::array;
use smitfit::numeric::{bindings, scalar};
use smitfit::symbolic::Expr;
use smitfit::{Model, SmitFitError, Symbol};

fn names(symbols: Vec<&Symbol>) -> Vec<&str> {
    symbols.into_iter().map(Symbol::name).collect()
}

#[test]
fn test_single_output_order() {
    let model = Model::parse(["y == a*x + b"]).unwrap();
    assert_eq!(names(model.evaluation_order()), vec!["y"]);

    let inputs: Vec<_> = model.input_symbols().iter().map(Symbol::name).collect();
    assert_eq!(inputs, vec!["a", "b", "x"]);
}

#[test]
fn test_dependent_output_comes_later() {
    // Declared in reverse so the order cannot come from declaration alone
    let model = Model::parse(["z == y + c", "y == a*x + b"]).unwrap();

    assert_eq!(names(model.evaluation_order()), vec!["y", "z"]);
    assert_eq!(names(model.output_symbols()), vec!["z", "y"]);
    assert!(!model.input_symbols().contains(&Symbol::new("y")));
}

#[test]
fn test_cycle_is_rejected() {
    let err = Model::parse(["u == v", "v == u"]).unwrap_err();
    assert!(matches!(err, SmitFitError::CyclicModel(_)));
}

#[test]
fn test_non_symbol_left_hand_side() {
    let err = Model::parse(["y + 1 == a*x"]).unwrap_err();
    assert!(matches!(err, SmitFitError::InvalidEquation(_)));

    let err = Model::parse(["y == a*"]).unwrap_err();
    assert!(matches!(err, SmitFitError::InvalidEquation(_)));
}

#[test]
fn test_duplicate_output_from_pairs() {
    let pairs = vec![
        ("y", Expr::parse_expr("a*x").unwrap()),
        ("y", Expr::parse_expr("b").unwrap()),
    ];
    let err = Model::new(pairs).unwrap_err();
    assert!(matches!(err, SmitFitError::InvalidEquation(_)));
}

#[test]
fn test_evaluate_scalar() {
    let model = Model::parse(["y == a*x + b"]).unwrap();
    let result = model
        .evaluate(&bindings([("x", 2.0), ("a", 3.0), ("b", 1.0)]))
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result["y"], scalar(7.0));
}

#[test]
fn test_evaluate_missing_binding() {
    let model = Model::parse(["y == a*x + b"]).unwrap();
    let err = model
        .evaluate(&bindings([("x", 2.0), ("a", 3.0)]))
        .unwrap_err();

    assert!(matches!(err, SmitFitError::UnboundSymbol(name) if name == "b"));
}

#[test]
fn test_evaluate_chained_outputs_over_arrays() {
    let model = Model::parse(["y == a*x + b", "z == y * c"]).unwrap();
    let mut values = bindings([("a", 2.0), ("b", 1.0), ("c", 10.0)]);
    values.insert("x".to_string(), array![0.0, 1.0, 2.0].into_dyn());

    let result = model.evaluate(&values).unwrap();

    assert_eq!(result["y"], array![1.0, 3.0, 5.0].into_dyn());
    assert_eq!(result["z"], array![10.0, 30.0, 50.0].into_dyn());
}

#[test]
fn test_evaluate_functions() {
    let model = Model::parse(["y == amplitude * exp(-k * t) + sqrt(offset)"]).unwrap();
    let values = bindings([("amplitude", 2.0), ("k", 0.5), ("t", 2.0), ("offset", 4.0)]);

    let result = model.evaluate(&values).unwrap();
    assert_relative_eq!(result["y"].sum(), 2.0 * (-1.0f64).exp() + 2.0, epsilon = 1e-12);
}

#[test]
fn test_bare_expression_defines_y() {
    let model = Model::parse(["a*x + b"]).unwrap();
    assert_eq!(names(model.output_symbols()), vec!["y"]);
}
