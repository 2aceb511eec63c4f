//! Fit through a minimizer that works on named variables.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{named, Fit};
use crate::error::{Result, SmitFitError};
use crate::lm::{LeastSquaresSolver, LevenbergMarquardt};
use crate::loss::{flat_concat, Loss};
use crate::numeric::{Bindings, Numerical};
use crate::parameters::{pack, shape_size, unpack, Bounds, Parameters, Shapes};
use crate::problem::Problem;
use crate::result::FitResult;
use crate::symbolic::Layered;
use crate::uncertainty::{standard_errors, FitStatistics};

/// Residual function of named variable values.
pub type Objective<'f> = dyn Fn(&Bindings) -> Result<Array1<f64>> + 'f;

/// A named optimizer variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: Numerical,
    pub min: f64,
    pub max: f64,
    /// Held at `value` when false
    pub vary: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: Numerical) -> Self {
        Self {
            name: name.into(),
            value,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            vary: true,
        }
    }
}

/// Final value of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableEstimate {
    pub name: String,
    pub value: Numerical,
    /// Absent for held variables and when no covariance was available
    pub std_dev: Option<Numerical>,
    pub vary: bool,
}

/// What a [`Minimizer`] returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimizerReport {
    pub variables: Vec<VariableEstimate>,
    pub chisqr: f64,
    pub redchi: Option<f64>,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    pub ndata: usize,
    pub nvarys: usize,
    pub nfev: usize,
    pub success: bool,
    pub message: String,
}

impl MinimizerReport {
    pub fn get(&self, name: &str) -> Option<&VariableEstimate> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// A minimizer over named variables.
pub trait Minimizer {
    /// Minimize the squared norm of `objective` over the varying `variables`.
    ///
    /// `objective` receives a value for every variable, held ones included.
    fn minimize(
        &self,
        objective: &Objective<'_>,
        variables: &[Variable],
    ) -> Result<MinimizerReport>;
}

/// [`Minimizer`] backed by a bounded least-squares solver.
#[derive(Debug, Clone)]
pub struct LeastSquaresMinimizer<S = LevenbergMarquardt> {
    solver: S,
}

impl LeastSquaresMinimizer {
    pub fn new() -> Self {
        Self {
            solver: LevenbergMarquardt::default(),
        }
    }
}

impl Default for LeastSquaresMinimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LeastSquaresSolver> LeastSquaresMinimizer<S> {
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }
}

struct NamedProblem<'p, 'f> {
    objective: &'p Objective<'f>,
    shapes: Shapes,
    held: Bindings,
    n_params: usize,
}

impl NamedProblem<'_, '_> {
    fn values(&self, params: &Array1<f64>) -> Result<Bindings> {
        let mut values = self.held.clone();
        values.extend(unpack(params.view(), &self.shapes)?);
        Ok(values)
    }
}

impl Problem for NamedProblem<'_, '_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        (self.objective)(&self.values(params)?)
    }

    fn parameter_count(&self) -> usize {
        self.n_params
    }
}

impl<S: LeastSquaresSolver> Minimizer for LeastSquaresMinimizer<S> {
    fn minimize(
        &self,
        objective: &Objective<'_>,
        variables: &[Variable],
    ) -> Result<MinimizerReport> {
        let varying: Vec<&Variable> = variables.iter().filter(|v| v.vary).collect();

        let mut bounds = Vec::new();
        for variable in &varying {
            let b = Bounds::new(variable.min, variable.max)?;
            bounds.extend(std::iter::repeat(b).take(variable.value.len()));
        }

        let shapes: Shapes = varying
            .iter()
            .map(|v| (v.name.clone(), v.value.shape().to_vec()))
            .collect();
        let x0 = pack(varying.iter().map(|v| &v.value));
        let held: Bindings = variables
            .iter()
            .filter(|v| !v.vary)
            .map(|v| (v.name.clone(), v.value.clone()))
            .collect();

        let problem = NamedProblem {
            objective,
            shapes,
            held,
            n_params: x0.len(),
        };

        let report = self.solver.solve(&problem, x0, &bounds)?;

        let nvarys = problem.shapes.iter().map(|(_, s)| shape_size(s)).sum();
        let statistics = FitStatistics::from_residuals(&report.residuals, nvarys);

        let fitted: BTreeMap<String, Numerical> =
            named(unpack(report.params.view(), &problem.shapes)?);
        let mut std_devs = match &report.covariance {
            Some(covar) => named(standard_errors(covar, &problem.shapes)?),
            None => BTreeMap::new(),
        };

        let estimates = variables
            .iter()
            .map(|variable| {
                let value = fitted
                    .get(&variable.name)
                    .filter(|_| variable.vary)
                    .unwrap_or(&variable.value)
                    .clone();
                VariableEstimate {
                    name: variable.name.clone(),
                    value,
                    std_dev: std_devs.remove(&variable.name),
                    vary: variable.vary,
                }
            })
            .collect();

        Ok(MinimizerReport {
            variables: estimates,
            chisqr: statistics.chisqr,
            redchi: statistics.redchi,
            aic: statistics.aic,
            bic: statistics.bic,
            ndata: statistics.ndata,
            nvarys,
            nfev: report.func_evals,
            success: report.success,
            message: report.message,
        })
    }
}

/// Fits a [`Parameters`] set through a [`Minimizer`].
///
/// Every parameter becomes a [`Variable`] with its guess and bounds; fixed
/// parameters are registered with `vary = false`.
pub struct MinimizeFit<'a, L: Loss + ?Sized, M = LeastSquaresMinimizer> {
    loss: &'a L,
    parameters: &'a Parameters,
    xdata: Bindings,
    minimizer: M,
}

impl<'a, L: Loss + ?Sized> MinimizeFit<'a, L> {
    pub fn new(loss: &'a L, parameters: &'a Parameters, xdata: Bindings) -> Self {
        Self {
            loss,
            parameters,
            xdata,
            minimizer: LeastSquaresMinimizer::new(),
        }
    }
}

impl<'a, L: Loss + ?Sized, M: Minimizer> MinimizeFit<'a, L, M> {
    /// Replace the minimizer.
    pub fn with_minimizer<T: Minimizer>(self, minimizer: T) -> MinimizeFit<'a, L, T> {
        MinimizeFit {
            loss: self.loss,
            parameters: self.parameters,
            xdata: self.xdata,
            minimizer,
        }
    }

    fn variables(&self) -> Vec<Variable> {
        self.parameters
            .iter()
            .map(|p| Variable {
                name: p.name().to_string(),
                value: p.guess().clone(),
                min: p.bounds().min,
                max: p.bounds().max,
                vary: !p.is_fixed(),
            })
            .collect()
    }
}

impl<L: Loss + ?Sized, M: Minimizer> Fit for MinimizeFit<'_, L, M> {
    fn fit(&self) -> Result<FitResult> {
        let free = self.parameters.free();
        let fixed = self.parameters.fixed();
        let variables = self.variables();

        debug!(
            free = ?free.names(),
            fixed = ?fixed.names(),
            "starting minimizer fit"
        );

        let objective = |values: &Bindings| -> Result<Array1<f64>> {
            let context = Layered {
                front: values,
                back: &self.xdata,
            };
            Ok(flat_concat(&self.loss.weighted_residuals(&context)?))
        };
        let report = self.minimizer.minimize(&objective, &variables)?;
        if !report.success {
            warn!(message = %report.message, "minimizer did not converge");
        }

        let mut fit_parameters = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for name in free.names() {
            let estimate = report.get(name).ok_or_else(|| {
                SmitFitError::OptimizationFailure(format!(
                    "minimizer returned no value for '{}'",
                    name
                ))
            })?;
            fit_parameters.insert(name.to_string(), estimate.value.clone());
            if let Some(std_dev) = &estimate.std_dev {
                errors.insert(name.to_string(), std_dev.clone());
            }
        }

        let mut qualifiers = BTreeMap::new();
        qualifiers.insert("chisqr".to_string(), report.chisqr);
        for (name, value) in [("redchi", report.redchi), ("aic", report.aic), ("bic", report.bic)] {
            if let Some(value) = value {
                qualifiers.insert(name.to_string(), value);
            }
        }

        debug!(chisqr = report.chisqr, success = report.success, "minimizer fit finished");

        Ok(FitResult::new(
            fit_parameters,
            named(fixed.guess()),
            errors,
            qualifiers,
            named(free.guess()),
            serde_json::to_value(&report)?,
        ))
    }
}
