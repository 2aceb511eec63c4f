//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ diag(JᵀJ)) δ = -Jᵀr
//! ```
//!
//! with a Cholesky factorisation, projects the trial point onto the box
//! bounds, and accepts it if the cost decreases. λ shrinks after an accepted
//! step and grows after a rejected one.
//!
//! A parameter sitting on a bound whose descent direction points out of the
//! box is held for the iteration: the system is solved over the remaining
//! parameters only, and the gradient test looks at those alone.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace, warn};

use crate::error::{Result, SmitFitError};
use crate::parameters::Bounds;
use crate::problem::Problem;
use crate::uncertainty::calculate_covariance;
use crate::utils::finite_difference;
use crate::utils::{nalgebra_vec_to_ndarray, ndarray_vec_to_nalgebra};

use super::config::LmConfig;
use super::LeastSquaresSolver;

/// Smallest diagonal entry used for damping, so a parameter the residuals do
/// not depend on still gets a damped (zero) step.
const DIAGONAL_FLOOR: f64 = 1e-12;

/// Result of a least-squares optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LmReport {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Scaled parameter covariance, if it could be estimated
    pub covariance: Option<Array2<f64>>,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {}", self.params)?;
        Ok(())
    }
}

/// Outcome of the search for an acceptable step within one iteration.
enum StepOutcome {
    /// Cost decreased, keep iterating
    Accepted,

    /// Converged successfully
    Converged(String),

    /// Damping grew past its maximum without reducing the cost
    Stalled,
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for relative cost reduction.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for relative step length.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for the gradient.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    pub fn with_lambda_up_factor(mut self, factor: f64) -> Self {
        self.config.lambda_up_factor = factor;
        self
    }

    pub fn with_lambda_down_factor(mut self, factor: f64) -> Self {
        self.config.lambda_down_factor = factor;
        self
    }

    pub fn with_min_lambda(mut self, min_lambda: f64) -> Self {
        self.config.min_lambda = min_lambda;
        self
    }

    pub fn with_max_lambda(mut self, max_lambda: f64) -> Self {
        self.config.max_lambda = max_lambda;
        self
    }

    /// Set the relative finite-difference step.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Minimize the sum of squared residuals within box bounds.
    ///
    /// `bounds` holds one entry per element of `initial_params`. The initial
    /// point is clamped into the bounds. Running out of iterations or damping
    /// is reported through `success = false`, not as an error; errors are
    /// reserved for malformed input and failing residual evaluations.
    pub fn minimize(
        &self,
        problem: &dyn Problem,
        initial_params: Array1<f64>,
        bounds: &[Bounds],
    ) -> Result<LmReport> {
        let cfg = &self.config;
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(SmitFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }
        if bounds.len() != n_params {
            return Err(SmitFitError::DimensionMismatch(format!(
                "Expected {} bounds, got {}",
                n_params,
                bounds.len()
            )));
        }
        if let Some(bad) = bounds
            .iter()
            .find(|b| b.min.is_nan() || b.max.is_nan() || b.min > b.max)
        {
            return Err(SmitFitError::OptimizationFailure(format!(
                "invalid bounds {}",
                bad
            )));
        }

        let mut params = project(initial_params, bounds);
        let mut residuals = problem.eval(&params)?;
        let mut cost = sum_of_squares(&residuals);
        let mut func_evals = 1;

        if !cost.is_finite() {
            return Err(SmitFitError::OptimizationFailure(
                "residuals at the initial point are not finite".to_string(),
            ));
        }

        if n_params == 0 {
            return Ok(LmReport {
                params,
                residuals,
                cost,
                covariance: None,
                iterations: 0,
                func_evals,
                success: true,
                message: "No free parameters".to_string(),
            });
        }

        let mut lambda = cfg.initial_lambda;
        let mut iterations = 0;

        let (success, message) = loop {
            if iterations >= cfg.max_iterations {
                break (
                    false,
                    format!("Maximum number of iterations ({}) reached", cfg.max_iterations),
                );
            }

            let jac =
                finite_difference::jacobian(problem, &params, &residuals, bounds, cfg.epsilon)?;
            func_evals += n_params;

            let jtj = jac.t().dot(&jac);
            let gradient = jac.t().dot(&residuals);
            let free = free_directions(&params, &gradient, bounds);
            let gradient_max = gradient
                .iter()
                .zip(&free)
                .filter(|(_, is_free)| **is_free)
                .fold(0.0f64, |acc, (g, _)| acc.max(g.abs()));
            if gradient_max <= cfg.gtol {
                break (
                    true,
                    format!(
                        "Gradient convergence: max |g| = {:.2e} <= {:.2e}",
                        gradient_max, cfg.gtol
                    ),
                );
            }

            iterations += 1;
            let held = free.iter().filter(|&&is_free| !is_free).count();
            trace!(iterations, cost, lambda, held, "lm iteration");

            let outcome = loop {
                let Some(step) = damped_step(&jtj, &gradient, &free, lambda) else {
                    lambda *= cfg.lambda_up_factor;
                    if lambda > cfg.max_lambda {
                        break StepOutcome::Stalled;
                    }
                    continue;
                };

                let trial = project(&params + &step, bounds);
                let step_norm = norm(&(&trial - &params));
                if step_norm <= cfg.xtol * (norm(&params) + cfg.xtol) {
                    break StepOutcome::Converged(format!(
                        "Parameter convergence: |dx| = {:.2e}",
                        step_norm
                    ));
                }

                let trial_residuals = problem.eval(&trial)?;
                func_evals += 1;
                if trial_residuals.len() != residuals.len() {
                    return Err(SmitFitError::DimensionMismatch(format!(
                        "Expected {} residuals, got {}",
                        residuals.len(),
                        trial_residuals.len()
                    )));
                }
                let trial_cost = sum_of_squares(&trial_residuals);

                if trial_cost.is_finite() && trial_cost < cost {
                    let reduction = cost - trial_cost;
                    let previous = cost;
                    params = trial;
                    residuals = trial_residuals;
                    cost = trial_cost;
                    lambda = (lambda * cfg.lambda_down_factor).max(cfg.min_lambda);

                    if reduction <= cfg.ftol * previous {
                        break StepOutcome::Converged(format!(
                            "Cost convergence: relative reduction {:.2e}",
                            reduction / previous
                        ));
                    }
                    break StepOutcome::Accepted;
                }

                lambda *= cfg.lambda_up_factor;
                if lambda > cfg.max_lambda {
                    break StepOutcome::Stalled;
                }
            };

            match outcome {
                StepOutcome::Accepted => continue,
                StepOutcome::Converged(message) => break (true, message),
                StepOutcome::Stalled => {
                    break (
                        false,
                        "Damping reached its maximum without reducing the cost".to_string(),
                    )
                }
            }
        };

        let jac = finite_difference::jacobian(problem, &params, &residuals, bounds, cfg.epsilon)?;
        func_evals += n_params;
        let covariance = calculate_covariance(&jac, cost);

        if success {
            debug!(iterations, func_evals, cost, "{}", message);
        } else {
            warn!(iterations, func_evals, cost, "least squares did not converge: {}", message);
        }

        Ok(LmReport {
            params,
            residuals,
            cost,
            covariance,
            iterations,
            func_evals,
            success,
            message,
        })
    }
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn solve(
        &self,
        problem: &dyn Problem,
        initial_params: Array1<f64>,
        bounds: &[Bounds],
    ) -> Result<LmReport> {
        self.minimize(problem, initial_params, bounds)
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

fn norm(values: &Array1<f64>) -> f64 {
    sum_of_squares(values).sqrt()
}

fn project(mut params: Array1<f64>, bounds: &[Bounds]) -> Array1<f64> {
    for (value, bound) in params.iter_mut().zip(bounds) {
        *value = bound.clamp(*value);
    }
    params
}

/// Which parameters may move this iteration. A parameter on its lower bound
/// with a positive gradient, or on its upper bound with a negative one, is
/// held.
fn free_directions(params: &Array1<f64>, gradient: &Array1<f64>, bounds: &[Bounds]) -> Vec<bool> {
    params
        .iter()
        .zip(gradient)
        .zip(bounds)
        .map(|((&value, &g), bound)| {
            let pushed_below = value <= bound.min && g > 0.0;
            let pushed_above = value >= bound.max && g < 0.0;
            !(pushed_below || pushed_above)
        })
        .collect()
}

/// Solve the damped normal equations restricted to the `free` parameters.
/// Held parameters get a zero step. `None` if the reduced system is not
/// positive definite or the step is not finite.
fn damped_step(
    jtj: &Array2<f64>,
    gradient: &Array1<f64>,
    free: &[bool],
    lambda: f64,
) -> Option<Array1<f64>> {
    let index: Vec<usize> = free
        .iter()
        .enumerate()
        .filter_map(|(i, &is_free)| is_free.then_some(i))
        .collect();
    let n = index.len();
    let damped = DMatrix::from_fn(n, n, |i, j| {
        let value = jtj[[index[i], index[j]]];
        if i == j {
            value + lambda * value.max(DIAGONAL_FLOOR)
        } else {
            value
        }
    });
    let reduced_gradient: Array1<f64> = index.iter().map(|&i| gradient[i]).collect();
    let rhs = -ndarray_vec_to_nalgebra(&reduced_gradient);

    let reduced = nalgebra_vec_to_ndarray(&damped.cholesky()?.solve(&rhs));
    let mut step = Array1::zeros(gradient.len());
    for (&i, &value) in index.iter().zip(reduced.iter()) {
        step[i] = value;
    }
    step.iter().all(|v| v.is_finite()).then_some(step)
}
