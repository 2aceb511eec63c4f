//! Integration tests for the named-variable minimization adapter

use crate::test_helpers::noisy_line;
use approx::assert_relative_eq;
use ndarray::Array1;
use smitfit::fit::{LeastSquaresMinimizer, Minimizer, MinimizerReport, Objective, Variable};
use smitfit::numeric::{bindings, scalar};
use smitfit::{Fit, LeastSquaresFit, LevenbergMarquardt, MinimizeFit, Model, SquaredErrorLoss};

#[test]
fn test_noisy_linear_fit() {
    let (x, y) = noisy_line(0.15, 2.5, 100, 43);

    let model = Model::parse(["y == a*x + b"]).unwrap();
    let params = model.define_parameters([("a", 0.2), ("b", 2.0)]).unwrap();
    let loss = SquaredErrorLoss::new(model, [("y", y)]).unwrap();

    let result = MinimizeFit::new(&loss, &params, bindings([("x", x)]))
        .fit()
        .unwrap();

    let names: Vec<_> = result.fit_parameters().keys().cloned().collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert!(result.fixed_parameters().is_empty());

    let a = result.fit_parameters()["a"].sum();
    let a_err = result.errors()["a"].sum();
    assert!((a - 0.15).abs() < 5.0 * a_err, "a = {} +/- {}", a, a_err);

    let raw = result.raw_optimizer_output();
    assert_eq!(raw["nvarys"], serde_json::json!(2));
    assert_eq!(raw["ndata"], serde_json::json!(100));
    assert!(result.goodness_of_fit_qualifiers().contains_key("redchi"));
}

#[test]
fn test_adapters_agree() {
    let (x, y) = noisy_line(0.15, 2.5, 60, 5);

    let model = Model::parse(["y == a*x + b"]).unwrap();
    let mut params = model.define_parameters([("a", 0.5), ("b", 1.0)]).unwrap();
    params.set_bounds([("b", (0.0, 10.0))]).unwrap();
    let loss = SquaredErrorLoss::new(model, [("y", y)]).unwrap();
    let xdata = bindings([("x", x)]);

    let direct = LeastSquaresFit::new(&loss, &params, xdata.clone())
        .fit()
        .unwrap();
    let named = MinimizeFit::new(&loss, &params, xdata).fit().unwrap();

    for name in ["a", "b"] {
        assert_relative_eq!(
            direct.fit_parameters()[name].sum(),
            named.fit_parameters()[name].sum(),
            max_relative = 1e-6
        );
    }
    assert_relative_eq!(
        direct.goodness_of_fit_qualifiers()["chisqr"],
        named.goodness_of_fit_qualifiers()["chisqr"],
        max_relative = 1e-8
    );
}

#[test]
fn test_fixed_parameter_is_held() {
    let x = Array1::linspace(0.0, 3.0, 7);
    let y = x.mapv(|v| 1.5 * v * v + 2.0);

    let model = Model::parse(["y == a*x^2 + c"]).unwrap();
    let mut params = model.define_parameters([("a", 1.0), ("c", 2.0)]).unwrap();
    params.fix("c").unwrap();
    let loss = SquaredErrorLoss::new(model, [("y", y)]).unwrap();

    let minimizer =
        LeastSquaresMinimizer::with_solver(LevenbergMarquardt::new().with_max_iterations(50));
    let result = MinimizeFit::new(&loss, &params, bindings([("x", x)]))
        .with_minimizer(minimizer)
        .fit()
        .unwrap();

    assert_relative_eq!(result.fit_parameters()["a"].sum(), 1.5, epsilon = 1e-6);
    assert_eq!(result.fixed_parameters()["c"], scalar(2.0));
    assert_eq!(result.initial_guess().len(), 1);
}

/// Evaluates the objective once and returns the variables unchanged.
struct Echo;

impl Minimizer for Echo {
    fn minimize(
        &self,
        objective: &Objective<'_>,
        variables: &[Variable],
    ) -> smitfit::Result<MinimizerReport> {
        let values: smitfit::Bindings = variables
            .iter()
            .map(|v| (v.name.clone(), v.value.clone()))
            .collect();
        let residuals = objective(&values)?;

        Ok(MinimizerReport {
            variables: variables
                .iter()
                .map(|v| smitfit::fit::VariableEstimate {
                    name: v.name.clone(),
                    value: v.value.clone(),
                    std_dev: None,
                    vary: v.vary,
                })
                .collect(),
            chisqr: residuals.dot(&residuals),
            redchi: None,
            aic: None,
            bic: None,
            ndata: residuals.len(),
            nvarys: variables.iter().filter(|v| v.vary).count(),
            nfev: 1,
            success: false,
            message: "echo".to_string(),
        })
    }
}

#[test]
fn test_minimizer_is_swappable() {
    let model = Model::parse(["y == a*x + b"]).unwrap();
    let mut params = model.define_parameters([("a", 2.0), ("b", 1.0)]).unwrap();
    params.fix("b").unwrap();
    let loss = SquaredErrorLoss::new(model, [("y", vec![1.0, 3.0, 6.0])]).unwrap();

    let result = MinimizeFit::new(&loss, &params, bindings([("x", vec![0.0, 1.0, 2.0])]))
        .with_minimizer(Echo)
        .fit()
        .unwrap();

    // Only the free parameter is read back; the fixed one is reported as held
    assert_eq!(result.fit_parameters().len(), 1);
    assert_eq!(result.fit_parameters()["a"], scalar(2.0));
    assert!(result.errors().is_empty());
    assert_relative_eq!(result.goodness_of_fit_qualifiers()["chisqr"], 1.0);
    assert_eq!(result.goodness_of_fit_qualifiers().len(), 1);
    assert_eq!(result.raw_optimizer_output()["success"], serde_json::json!(false));
}
