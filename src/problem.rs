//! Problem definition trait.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem over a flat parameter vector. The fit adapters build
//! a `Problem` from a loss and a parameter set; the solvers only see this trait.

use crate::error::Result;
use ndarray::Array1;

/// A trait representing a nonlinear least squares problem.
///
/// The number of residuals is whatever `eval` returns at the starting point;
/// solvers reject later evaluations of a different length.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;
}
