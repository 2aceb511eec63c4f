//! # Uncertainty Calculation
//!
//! Parameter uncertainties and goodness-of-fit statistics for a finished fit:
//!
//! - Covariance matrix estimation from the Jacobian at the solution
//! - Standard errors, reshaped like the parameters they belong to
//! - chi-square, reduced chi-square, AIC and BIC as defined by lmfit

mod covariance;

pub use covariance::{calculate_covariance, standard_errors_from_covariance};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::numeric::Numerical;
use crate::parameters::unpack;

/// Standard errors from a covariance matrix over packed parameters,
/// reshaped per parameter.
pub fn standard_errors(
    covar: &Array2<f64>,
    shapes: &[(String, Vec<usize>)],
) -> Result<Vec<(String, Numerical)>> {
    let errors = standard_errors_from_covariance(covar);
    unpack(errors.view(), shapes)
}

/// Goodness-of-fit statistics of a least-squares solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitStatistics {
    /// Number of residuals
    pub ndata: usize,
    /// Number of varied scalar parameters
    pub nvarys: usize,
    /// Sum of squared residuals
    pub chisqr: f64,
    /// `chisqr / (ndata - nvarys)`, absent without degrees of freedom
    pub redchi: Option<f64>,
    /// Akaike information criterion, absent without data
    pub aic: Option<f64>,
    /// Bayesian information criterion, absent without data
    pub bic: Option<f64>,
}

impl FitStatistics {
    /// Statistics from the final residuals and the number of varied scalars.
    pub fn from_residuals<'a, I>(residuals: I, nvarys: usize) -> Self
    where
        I: IntoIterator<Item = &'a f64>,
    {
        let (ndata, chisqr) = residuals
            .into_iter()
            .fold((0usize, 0.0), |(n, sum), r| (n + 1, sum + r * r));
        Self::new(ndata, nvarys, chisqr)
    }

    pub fn new(ndata: usize, nvarys: usize, chisqr: f64) -> Self {
        let redchi = (ndata > nvarys).then(|| chisqr / (ndata - nvarys) as f64);

        let (aic, bic) = if ndata > 0 {
            let n = ndata as f64;
            let k = nvarys as f64;
            // a perfect fit would give ln(0)
            let neg2_log_likelihood = n * (chisqr.max(1e-250 * n) / n).ln();
            (
                Some(neg2_log_likelihood + 2.0 * k),
                Some(neg2_log_likelihood + n.ln() * k),
            )
        } else {
            (None, None)
        };

        Self {
            ndata,
            nvarys,
            chisqr,
            redchi,
            aic,
            bic,
        }
    }

    /// Named qualifiers: `chisqr` always, `redchi`, `aic` and `bic` when defined.
    pub fn qualifiers(&self) -> BTreeMap<String, f64> {
        let mut qualifiers = BTreeMap::new();
        qualifiers.insert("chisqr".to_string(), self.chisqr);
        for (name, value) in [("redchi", self.redchi), ("aic", self.aic), ("bic", self.bic)] {
            if let Some(value) = value {
                qualifiers.insert(name.to_string(), value);
            }
        }
        qualifiers
    }
}
