//! Finite difference methods for numerical differentiation.

use crate::error::{Result, SmitFitError};
use crate::parameters::Bounds;
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Compute the Jacobian matrix using one-sided finite differences.
///
/// `J[i,j] = ∂residual[i]/∂param[j]`. `residuals` must be the residuals at
/// `params`; they are reused as the base point. The step for parameter `j` is
/// `epsilon * |params[j]|` (or `epsilon` near zero) and goes backwards when a
/// forward step would leave `bounds[j]`.
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    bounds: &[Bounds],
    epsilon: f64,
) -> Result<Array2<f64>> {
    let n_params = params.len();
    let n_residuals = residuals.len();

    if bounds.len() != n_params {
        return Err(SmitFitError::DimensionMismatch(format!(
            "Expected {} bounds, got {}",
            n_params,
            bounds.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let param_j = params[j];
        let mut eps_j = if param_j.abs() > epsilon {
            param_j.abs() * epsilon
        } else {
            epsilon
        };
        if param_j + eps_j > bounds[j].max {
            eps_j = -eps_j;
        }

        let mut params_perturbed = params.clone();
        params_perturbed[j] += eps_j;

        let residuals_perturbed = problem.eval(&params_perturbed)?;
        if residuals_perturbed.len() != n_residuals {
            return Err(SmitFitError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                n_residuals,
                residuals_perturbed.len()
            )));
        }

        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}
