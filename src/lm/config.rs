//! Configuration options for the Levenberg-Marquardt algorithm.

use serde::{Deserialize, Serialize};

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LmConfig {
    /// Maximum number of iterations. Default: 200
    pub max_iterations: usize,

    /// Relative reduction of the cost below which an accepted step ends the
    /// fit. Default: 1e-10
    pub ftol: f64,

    /// Relative step length below which the fit ends. Default: 1e-10
    pub xtol: f64,

    /// Largest gradient component below which the fit ends. Default: 1e-12
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Lambda beyond which the fit gives up. Default: 1e12
    pub max_lambda: f64,

    /// Relative finite-difference step for the Jacobian. Default: 1.49e-8
    pub epsilon: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            // sqrt of machine epsilon
            epsilon: 1.49e-8,
        }
    }
}
