//! Fit orchestration.
//!
//! A fit ties a [`Loss`](crate::loss::Loss), a [`Parameters`](crate::parameters::Parameters)
//! set and the independent data together and drives an optimizer over the
//! free parameters. Both adapters implement [`Fit`], so callers and tests can
//! swap one for the other, or swap the optimizer behind either, without
//! touching the model, parameter or loss code.
//!
//! - [`LeastSquaresFit`] packs the free parameters into one flat vector and
//!   hands the flattened residuals to a bounded
//!   [`LeastSquaresSolver`](crate::lm::LeastSquaresSolver).
//! - [`MinimizeFit`] registers every parameter as a named [`Variable`] with a
//!   [`Minimizer`] and reads the fitted values back by name.
//!
//! Optimizer non-convergence never fails a fit: it is recorded in
//! [`FitResult::raw_optimizer_output`](crate::result::FitResult::raw_optimizer_output).

mod least_squares;
mod minimize;

pub use least_squares::LeastSquaresFit;
pub use minimize::{
    LeastSquaresMinimizer, MinimizeFit, Minimizer, MinimizerReport, Objective, Variable,
    VariableEstimate,
};

use std::collections::BTreeMap;

use crate::error::Result;
use crate::numeric::Numerical;
use crate::result::FitResult;

/// Something that can be fitted.
pub trait Fit {
    /// Run the optimizer and collect its outcome.
    fn fit(&self) -> Result<FitResult>;
}

fn named(values: Vec<(String, Numerical)>) -> BTreeMap<String, Numerical> {
    values.into_iter().collect()
}
