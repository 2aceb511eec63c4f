//! # Covariance Matrix Calculations
//!
//! Parameter covariance estimated from the Jacobian of the residuals at the
//! solution:
//!
//! ```text
//! covar = inv(Jᵀ J) * chisqr / (ndata - nvarys)
//! ```

use ndarray::{Array1, Array2};
use tracing::warn;

use crate::utils::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Calculate the scaled covariance matrix from a Jacobian.
///
/// Returns `None` when there are no more residuals than parameters or when
/// `Jᵀ J` cannot be inverted.
pub fn calculate_covariance(jacobian: &Array2<f64>, chisqr: f64) -> Option<Array2<f64>> {
    let (ndata, nvarys) = jacobian.dim();
    if nvarys == 0 || ndata <= nvarys {
        return None;
    }

    let jtj = ndarray_to_nalgebra(&jacobian.t().dot(jacobian));
    let Some(inverse) = jtj.try_inverse() else {
        warn!(nvarys, "Jᵀ J is singular, no covariance available");
        return None;
    };

    let redchi = chisqr / (ndata - nvarys) as f64;
    let covar = nalgebra_to_ndarray(&inverse) * redchi;
    if covar.iter().all(|v| v.is_finite()) {
        Some(covar)
    } else {
        warn!(nvarys, "covariance is not finite");
        None
    }
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements; a
/// non-positive variance gives an error of zero.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|variance| if variance > 0.0 { variance.sqrt() } else { 0.0 })
}
