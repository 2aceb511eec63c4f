//! Bounded least-squares fit over the packed free parameters.

use ndarray::Array1;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{named, Fit};
use crate::error::Result;
use crate::lm::{LeastSquaresSolver, LevenbergMarquardt};
use crate::loss::{flat_concat, Loss};
use crate::numeric::{Bindings, Numerical};
use crate::parameters::{pack, unpack, Parameters, Shapes};
use crate::problem::Problem;
use crate::result::FitResult;
use crate::symbolic::Layered;
use crate::uncertainty::{standard_errors, FitStatistics};

/// Fits the free parameters of a [`Parameters`] set with a bounded
/// least-squares solver.
///
/// Fixed parameters are bound at their guesses for every residual
/// evaluation. Parameter values shadow `xdata` entries of the same name.
///
/// # Example
///
/// ```
/// use smitfit::fit::{Fit, LeastSquaresFit};
/// use smitfit::loss::SquaredErrorLoss;
/// use smitfit::model::Model;
/// use smitfit::numeric::bindings;
///
/// let model = Model::parse(["y == a * x + b"]).unwrap();
/// let params = model.define_parameters("a b").unwrap();
/// let loss = SquaredErrorLoss::new(model, [("y", vec![1.0, 3.0, 5.0, 7.0])]).unwrap();
/// let xdata = bindings([("x", vec![0.0, 1.0, 2.0, 3.0])]);
///
/// let result = LeastSquaresFit::new(&loss, &params, xdata).fit().unwrap();
/// assert!((result.fit_parameters()["a"].sum() - 2.0).abs() < 1e-6);
/// ```
pub struct LeastSquaresFit<'a, L: Loss + ?Sized, S = LevenbergMarquardt> {
    loss: &'a L,
    parameters: &'a Parameters,
    xdata: Bindings,
    solver: S,
}

impl<'a, L: Loss + ?Sized> LeastSquaresFit<'a, L> {
    pub fn new(loss: &'a L, parameters: &'a Parameters, xdata: Bindings) -> Self {
        Self {
            loss,
            parameters,
            xdata,
            solver: LevenbergMarquardt::default(),
        }
    }
}

impl<'a, L: Loss + ?Sized, S: LeastSquaresSolver> LeastSquaresFit<'a, L, S> {
    /// Replace the solver.
    pub fn with_solver<T: LeastSquaresSolver>(self, solver: T) -> LeastSquaresFit<'a, L, T> {
        LeastSquaresFit {
            loss: self.loss,
            parameters: self.parameters,
            xdata: self.xdata,
            solver,
        }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }
}

/// The loss seen as a residual function of the packed free parameters.
struct PackedProblem<'p, L: Loss + ?Sized> {
    loss: &'p L,
    shapes: Shapes,
    /// Independent data plus fixed parameter values
    base: Bindings,
    n_params: usize,
}

impl<L: Loss + ?Sized> Problem for PackedProblem<'_, L> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let free: BTreeMap<String, Numerical> = named(unpack(params.view(), &self.shapes)?);
        let context = Layered {
            front: &free,
            back: &self.base,
        };
        Ok(flat_concat(&self.loss.weighted_residuals(&context)?))
    }

    fn parameter_count(&self) -> usize {
        self.n_params
    }
}

impl<L: Loss + ?Sized, S: LeastSquaresSolver> Fit for LeastSquaresFit<'_, L, S> {
    fn fit(&self) -> Result<FitResult> {
        let free = self.parameters.free();
        let fixed = self.parameters.fixed();

        let shapes = free.shapes();
        let initial_guess = free.guess();
        let fixed_values = fixed.guess();
        let x0 = pack(initial_guess.iter().map(|(_, value)| value));

        let mut base = self.xdata.clone();
        base.extend(fixed_values.iter().cloned());

        let problem = PackedProblem {
            loss: self.loss,
            shapes: shapes.clone(),
            base,
            n_params: x0.len(),
        };

        debug!(
            free = ?free.names(),
            fixed = ?fixed.names(),
            n_params = problem.n_params,
            "starting least-squares fit"
        );

        let report = self.solver.solve(&problem, x0, &free.element_bounds())?;
        if !report.success {
            warn!(message = %report.message, "least-squares solver did not converge");
        }

        let fit_parameters = named(unpack(report.params.view(), &shapes)?);
        let errors = match &report.covariance {
            Some(covar) => named(standard_errors(covar, &shapes)?),
            None => BTreeMap::new(),
        };
        let statistics = FitStatistics::from_residuals(&report.residuals, free.size());

        debug!(
            chisqr = statistics.chisqr,
            n_residuals = report.residuals.len(),
            success = report.success,
            "least-squares fit finished"
        );

        Ok(FitResult::new(
            fit_parameters,
            named(fixed_values),
            errors,
            statistics.qualifiers(),
            named(initial_guess),
            serde_json::to_value(&report)?,
        ))
    }
}
