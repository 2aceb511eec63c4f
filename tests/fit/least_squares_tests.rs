//! Integration tests for the bounded least-squares adapter

use crate::test_helpers::{approx_eq, noisy_line};
use approx::assert_relative_eq;
use ndarray::{Array1, Array2};
use smitfit::numeric::{bindings, scalar};
use smitfit::{
    Bindings, Fit, FitResult, LeastSquaresFit, LevenbergMarquardt, MeanSquaredErrorLoss, Model,
    SquaredErrorLoss,
};

fn xdata(x: Array1<f64>) -> Bindings {
    bindings([("x", x)])
}

fn value(result: &FitResult, name: &str) -> f64 {
    result.fit_parameters()[name].sum()
}

fn error(result: &FitResult, name: &str) -> f64 {
    result.errors()[name].sum()
}

#[test]
fn test_noisy_linear_fit() {
    let (x, y) = noisy_line(0.15, 2.5, 100, 43);

    let model = Model::parse(["y == a*x + b"]).unwrap();
    let params = model.define_parameters([("a", 0.2), ("b", 2.0)]).unwrap();
    let loss = SquaredErrorLoss::new(model, [("y", y)]).unwrap();

    let result = LeastSquaresFit::new(&loss, &params, xdata(x)).fit().unwrap();

    let names: Vec<_> = result.fit_parameters().keys().cloned().collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert!(result.fixed_parameters().is_empty());

    let (a, b) = (value(&result, "a"), value(&result, "b"));
    let (a_err, b_err) = (error(&result, "a"), error(&result, "b"));
    assert!(a_err > 0.0 && b_err > 0.0);
    assert!((a - 0.15).abs() < 5.0 * a_err, "a = {} +/- {}", a, a_err);
    assert!((b - 2.5).abs() < 5.0 * b_err, "b = {} +/- {}", b, b_err);

    let gof = result.goodness_of_fit_qualifiers();
    for key in ["chisqr", "redchi", "aic", "bic"] {
        assert!(gof.contains_key(key), "missing {}", key);
    }
    assert_relative_eq!(gof["redchi"], gof["chisqr"] / 98.0, epsilon = 1e-12);

    assert_eq!(result.initial_guess()["a"], scalar(0.2));
    assert_eq!(result.raw_optimizer_output()["success"], serde_json::json!(true));
}

#[test]
fn test_fitted_parameters_reproduce_model() {
    let (x, y) = noisy_line(0.15, 2.5, 50, 7);

    let model = Model::parse(["y == a*x + b"]).unwrap();
    let params = model.define_parameters("a b").unwrap();
    let loss = SquaredErrorLoss::new(model.clone(), [("y", y.clone())]).unwrap();

    let result = LeastSquaresFit::new(&loss, &params, xdata(x.clone()))
        .fit()
        .unwrap();

    let mut values = result.parameters();
    values.insert("x".to_string(), x.into_dyn());
    let fitted = &model.evaluate(&values).unwrap()["y"];

    let chisqr: f64 = fitted
        .iter()
        .zip(y.iter())
        .map(|(f, o)| (f - o).powi(2))
        .sum();
    assert_relative_eq!(
        chisqr,
        result.goodness_of_fit_qualifiers()["chisqr"],
        max_relative = 1e-10
    );
}

#[test]
fn test_fixed_parameter_is_reported_not_fitted() {
    let (x, y) = noisy_line(0.15, 2.5, 100, 11);

    let model = Model::parse(["y == a*x + b"]).unwrap();
    let mut params = model.define_parameters([("a", 1.0), ("b", 2.5)]).unwrap();
    params.fix("b").unwrap();
    let loss = SquaredErrorLoss::new(model, [("y", y)]).unwrap();

    let result = LeastSquaresFit::new(&loss, &params, xdata(x)).fit().unwrap();

    assert_eq!(result.fit_parameters().len(), 1);
    assert_eq!(result.fixed_parameters()["b"], scalar(2.5));
    assert!(!result.errors().contains_key("b"));
    assert!(approx_eq(value(&result, "a"), 0.15, 0.05));
}

#[test]
fn test_global_fit_shares_parameter() {
    let x = Array1::linspace(0.0, 5.0, 20);
    let y1 = x.mapv(|v| 0.8 * v + 1.0);
    let y2 = x.mapv(|v| 0.8 * v - 3.0);

    let model = Model::parse(["y1 == k*x + c1", "y2 == k*x + c2"]).unwrap();
    let params = model.define_parameters("k c1 c2").unwrap();
    let loss = SquaredErrorLoss::new(model, [("y1", y1), ("y2", y2)]).unwrap();

    let result = LeastSquaresFit::new(&loss, &params, xdata(x)).fit().unwrap();

    assert_relative_eq!(value(&result, "k"), 0.8, epsilon = 1e-6);
    assert_relative_eq!(value(&result, "c1"), 1.0, epsilon = 1e-6);
    assert_relative_eq!(value(&result, "c2"), -3.0, epsilon = 1e-6);
}

#[test]
fn test_array_valued_parameter() {
    // One offset per curve, broadcast against a shared x column
    let offsets = [1.0, 4.0, -2.0];
    let column = Array1::linspace(0.0, 1.0, 10);
    let x = column.clone().into_shape((10, 1)).unwrap().into_dyn();
    let observed = Array2::from_shape_fn((10, 3), |(i, j)| 2.0 * column[i] + offsets[j]);

    let model = Model::parse(["y == 2*x + offsets"]).unwrap();
    let params = model
        .define_parameters(vec![("offsets", ndarray::array![0.0, 0.0, 0.0].into_dyn())])
        .unwrap();
    let loss = SquaredErrorLoss::new(model, [("y", observed)]).unwrap();

    let mut data = Bindings::new();
    data.insert("x".to_string(), x);
    let result = LeastSquaresFit::new(&loss, &params, data).fit().unwrap();

    let fitted_offsets = &result.fit_parameters()["offsets"];
    assert_eq!(fitted_offsets.shape(), &[3]);
    for (fitted, expected) in fitted_offsets.iter().zip(offsets) {
        assert_relative_eq!(*fitted, expected, epsilon = 1e-6);
    }
}

#[test]
fn test_mean_squared_loss_fit() {
    let x = Array1::linspace(0.0, 4.0, 9);
    let y = x.mapv(|v| 3.0 * v + 0.5);

    let model = Model::parse(["y == a*x + b"]).unwrap();
    let params = model.define_parameters("a b").unwrap();
    let loss = MeanSquaredErrorLoss::new(model, [("y", y)]).unwrap();

    let solver = LevenbergMarquardt::new().with_max_iterations(500);
    let result = LeastSquaresFit::new(&loss, &params, xdata(x))
        .with_solver(solver)
        .fit()
        .unwrap();

    assert_relative_eq!(value(&result, "a"), 3.0, epsilon = 1e-6);
    assert_relative_eq!(value(&result, "b"), 0.5, epsilon = 1e-6);
}

#[test]
fn test_result_json_round_trip() {
    let (x, y) = noisy_line(0.15, 2.5, 30, 3);

    let model = Model::parse(["y == a*x + b"]).unwrap();
    let params = model.define_parameters("a b").unwrap();
    let loss = SquaredErrorLoss::new(model, [("y", y)]).unwrap();
    let result = LeastSquaresFit::new(&loss, &params, xdata(x)).fit().unwrap();

    let loaded = FitResult::from_json(&result.to_json().unwrap()).unwrap();
    for name in ["a", "b"] {
        assert_relative_eq!(value(&loaded, name), value(&result, name), max_relative = 1e-14);
        assert_relative_eq!(error(&loaded, name), error(&result, name), max_relative = 1e-14);
    }
    assert_eq!(
        loaded.raw_optimizer_output()["message"],
        result.raw_optimizer_output()["message"]
    );
}
