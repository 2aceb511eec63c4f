//! Bounded fits through both adapters

use approx::assert_relative_eq;
use ndarray::Array1;
use smitfit::numeric::bindings;
use smitfit::{Fit, FitResult, LeastSquaresFit, MinimizeFit, Model, Parameters, SquaredErrorLoss};

fn value(result: &FitResult, name: &str) -> f64 {
    result.fit_parameters()[name].sum()
}

/// Exact line `y = 2x + 1` sampled on `x`, with `a*x + b` as the model.
fn line_fit(x: &Array1<f64>) -> (SquaredErrorLoss, Parameters) {
    let y = x.mapv(|v| 2.0 * v + 1.0);
    let model = Model::parse(["y == a*x + b"]).unwrap();
    let params = model.define_parameters("a b").unwrap();
    (SquaredErrorLoss::new(model, [("y", y)]).unwrap(), params)
}

/// Fit with both adapters and check they land on the same point.
fn fit_both(loss: &SquaredErrorLoss, params: &Parameters, x: &Array1<f64>) -> FitResult {
    let xdata = bindings([("x", x.clone())]);
    let direct = LeastSquaresFit::new(loss, params, xdata.clone())
        .fit()
        .unwrap();
    let named = MinimizeFit::new(loss, params, xdata).fit().unwrap();

    for result in [&direct, &named] {
        assert_eq!(
            result.raw_optimizer_output()["success"],
            serde_json::json!(true),
            "{}",
            result.raw_optimizer_output()["message"]
        );
    }
    for name in ["a", "b"] {
        assert_relative_eq!(value(&direct, name), value(&named, name), max_relative = 1e-9);
    }
    direct
}

#[test]
fn test_upper_bound_frees_the_intercept() {
    let x = Array1::linspace(0.0, 4.0, 5);
    let (loss, mut params) = line_fit(&x);
    params.set_bounds([("a", (0.0, 1.5))]).unwrap();

    let result = fit_both(&loss, &params, &x);

    // with the slope pinned at 1.5 the best intercept is mean(0.5 x + 1)
    assert_relative_eq!(value(&result, "a"), 1.5, epsilon = 1e-8);
    assert_relative_eq!(value(&result, "b"), 2.0, epsilon = 1e-6);
}

#[test]
fn test_upper_bound_far_from_origin() {
    let x = Array1::linspace(100.0, 101.0, 11);
    let (loss, mut params) = line_fit(&x);
    params.set_bounds([("a", (0.0, 1.5))]).unwrap();

    let result = fit_both(&loss, &params, &x);

    assert_relative_eq!(value(&result, "a"), 1.5, epsilon = 1e-6);
    assert_relative_eq!(value(&result, "b"), 51.25, max_relative = 1e-6);
}

#[test]
fn test_lower_bound_on_intercept() {
    let x = Array1::linspace(0.0, 4.0, 5);
    let (loss, mut params) = line_fit(&x);
    params.set_guesses([("b", 4.0)]).unwrap();
    params.set_bounds([("b", (3.0, f64::INFINITY))]).unwrap();

    let result = fit_both(&loss, &params, &x);

    // b held at 3: a = sum(x (2x - 2)) / sum(x^2) = 40 / 30
    assert_relative_eq!(value(&result, "b"), 3.0, epsilon = 1e-8);
    assert_relative_eq!(value(&result, "a"), 4.0 / 3.0, epsilon = 1e-6);
}

#[test]
fn test_inactive_bounds_leave_the_optimum() {
    let x = Array1::linspace(0.0, 4.0, 5);
    let (loss, mut params) = line_fit(&x);
    params.set_bounds([("a", (0.0, 5.0)), ("b", (-10.0, 10.0))]).unwrap();

    let result = fit_both(&loss, &params, &x);

    assert_relative_eq!(value(&result, "a"), 2.0, epsilon = 1e-6);
    assert_relative_eq!(value(&result, "b"), 1.0, epsilon = 1e-6);
}
