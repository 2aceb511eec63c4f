//! # smitfit
//!
//! Fit systems of named symbolic equations to data.
//!
//! The library provides:
//! - An equation model: named outputs defined by expressions, evaluated in
//!   dependency order over broadcasting `ndarray` arrays
//! - A parameter system with guesses, bounds, fixing and flat packing
//! - Losses comparing model outputs to observations
//! - Two fit adapters behind one [`Fit`] trait: bounded least squares
//!   (Levenberg-Marquardt) and minimization over named variables
//! - Standard errors and goodness-of-fit statistics in a serializable [`FitResult`]
//!
//! ## Basic Usage
//!
//! ```
//! use smitfit::{bindings, Fit, LeastSquaresFit, Model, SquaredErrorLoss};
//!
//! let model = Model::parse(["y == a * x + b"]).unwrap();
//! let params = model.define_parameters("a b").unwrap();
//!
//! let xdata = bindings([("x", vec![0.0, 1.0, 2.0, 3.0])]);
//! let loss = SquaredErrorLoss::new(model, [("y", vec![2.5, 2.65, 2.8, 2.95])]).unwrap();
//!
//! let result = LeastSquaresFit::new(&loss, &params, xdata).fit().unwrap();
//! let a = result.fit_parameters()["a"].sum();
//! assert!((a - 0.15).abs() < 1e-6);
//! ```

pub mod error;
pub mod numeric;
pub mod symbolic;

pub mod model;
pub mod parameters;

pub mod loss;
pub mod problem;

pub mod lm;
pub mod uncertainty;
mod utils;

pub mod fit;
pub mod result;

// Re-exports for convenience
pub use error::{Result, SmitFitError};
pub use fit::{Fit, LeastSquaresFit, MinimizeFit};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use loss::{Loss, MeanSquaredErrorLoss, SquaredErrorLoss};
pub use model::Model;
pub use numeric::{bindings, Bindings, Numerical};
pub use parameters::{Parameter, Parameters};
pub use problem::Problem;
pub use result::FitResult;
pub use symbolic::{symbols, Expr, Symbol};
pub use uncertainty::FitStatistics;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
