//! Integration tests for the Parameters collection
//!
//! These tests verify that the Parameters collection behaves correctly in various scenarios.

use ndarray::array;
use smitfit::numeric::scalar;
use smitfit::parameters::{Parameter, Parameters};
use smitfit::{Model, SmitFitError};
use std::collections::BTreeSet;

fn model() -> Model {
    Model::parse(["y == amp * exp(-k1 * t) + amp2 * exp(-k2 * t) + c"]).unwrap()
}

#[test]
fn test_define_all_parameters() {
    let params = model().define_parameters("*").unwrap();
    assert_eq!(params.names(), vec!["amp", "amp2", "c", "k1", "k2", "t"]);
    assert!(params.iter().all(|p| p.guess() == &scalar(1.0)));
}

#[test]
fn test_define_by_pattern() {
    let params = model().define_parameters("k*").unwrap();
    assert_eq!(params.names(), vec!["k1", "k2"]);

    let params = model().define_parameters("amp*").unwrap();
    assert_eq!(params.names(), vec!["amp", "amp2"]);
}

#[test]
fn test_define_by_names() {
    let params = model().define_parameters("c, amp; k1").unwrap();
    assert_eq!(params.names(), vec!["c", "amp", "k1"]);

    let params = model().define_parameters(vec!["k2", "c"]).unwrap();
    assert_eq!(params.names(), vec!["k2", "c"]);
}

#[test]
fn test_define_unknown_name() {
    let err = model().define_parameters("amp, nope").unwrap_err();
    assert!(matches!(err, SmitFitError::UnknownSymbol(name) if name == "nope"));
}

#[test]
fn test_define_with_guesses() {
    let params = model()
        .define_parameters([("amp", 10.0), ("k1", 0.5)])
        .unwrap();

    assert_eq!(params.names(), vec!["amp", "k1"]);
    assert_eq!(params.get("amp").unwrap().guess(), &scalar(10.0));
    assert_eq!(params.get("k1").unwrap().guess(), &scalar(0.5));
}

#[test]
fn test_free_fixed_partition() {
    let mut params = model().define_parameters("amp amp2 c k1 k2").unwrap();
    let all: BTreeSet<String> = params.names().into_iter().map(str::to_string).collect();

    params.fix("amp2, k2").unwrap();
    assert_eq!(params.free().names(), vec!["amp", "c", "k1"]);
    assert_eq!(params.fixed().names(), vec!["amp2", "k2"]);

    let union: BTreeSet<String> = params
        .free()
        .names()
        .into_iter()
        .chain(params.fixed().names())
        .map(str::to_string)
        .collect();
    assert_eq!(union, all);

    params.unfix(["amp2", "k2"]).unwrap();
    assert!(params.fixed().is_empty());
    assert_eq!(params.free().names(), params.names());
}

#[test]
fn test_fix_unknown_parameter() {
    let mut params = model().define_parameters("amp c").unwrap();
    let err = params.fix("amp k9").unwrap_err();
    assert!(matches!(err, SmitFitError::UnknownParameter(name) if name == "k9"));
}

#[test]
fn test_bulk_setters_apply_up_to_first_error() {
    let mut params = model().define_parameters("amp c k1").unwrap();

    let err = params
        .set_guesses(vec![("amp", 3.0), ("missing", 1.0), ("c", 7.0)])
        .unwrap_err();
    assert!(matches!(err, SmitFitError::UnknownParameter(_)));
    assert_eq!(params.get("amp").unwrap().guess(), &scalar(3.0));
    assert_eq!(params.get("c").unwrap().guess(), &scalar(1.0));

    params
        .set_bounds([("k1", (0.0, 2.0)), ("c", (-1.0, f64::INFINITY))])
        .unwrap();
    let bounds = params.get("k1").unwrap().bounds();
    assert_eq!((bounds.min, bounds.max), (0.0, 2.0));

    let err = params.set_bounds([("amp", (5.0, 1.0))]).unwrap_err();
    assert!(matches!(err, SmitFitError::Bounds(_)));
}

#[test]
fn test_array_guess_shapes() {
    let mut params = Parameters::new();
    params
        .add(Parameter::new("k").with_guess(array![[1.0, 2.0], [3.0, 4.0]]))
        .unwrap();
    params.add(Parameter::new("c")).unwrap();

    let free = params.free();
    assert_eq!(free.size(), 5);
    assert_eq!(free.shapes()[0], ("k".to_string(), vec![2, 2]));
    assert_eq!(free.element_bounds().len(), 5);
}

#[test]
fn test_duplicate_parameter() {
    let mut params = Parameters::new();
    params.add(Parameter::new("a")).unwrap();
    let err = params.add(Parameter::new("a")).unwrap_err();
    assert!(matches!(err, SmitFitError::DuplicateParameter(_)));
}

#[test]
fn test_json_round_trip() {
    let mut params = model().define_parameters([("amp", 2.0), ("k1", 0.1)]).unwrap();
    params.set_bounds([("k1", (0.0, 1.0))]).unwrap();
    params.fix("amp").unwrap();

    let loaded = Parameters::from_json(&params.to_json().unwrap()).unwrap();
    assert_eq!(loaded, params);
}
