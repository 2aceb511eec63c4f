//! Bounded nonlinear least squares.
//!
//! [`LeastSquaresSolver`] is the seam the least-squares fit adapter talks to:
//! given a [`Problem`], a starting vector and per-element bounds, return an
//! [`LmReport`]. [`LevenbergMarquardt`] is the bundled implementation.

pub mod algorithm;
pub mod config;

pub use algorithm::{LevenbergMarquardt, LmReport};
pub use config::LmConfig;

use ndarray::Array1;

use crate::error::Result;
use crate::parameters::Bounds;
use crate::problem::Problem;

/// A bounded least-squares optimizer.
pub trait LeastSquaresSolver {
    /// Minimize the sum of squared residuals of `problem` starting at
    /// `initial_params`, with one `Bounds` per element.
    ///
    /// Non-convergence is reported in the returned report; an error means the
    /// call itself was malformed or a residual evaluation failed.
    fn solve(
        &self,
        problem: &dyn Problem,
        initial_params: Array1<f64>,
        bounds: &[Bounds],
    ) -> Result<LmReport>;
}
