//! Outcome of a fit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::numeric::{Bindings, Numerical};

/// Immutable record of what a fit produced.
///
/// Maps are keyed by parameter name. `errors` only holds parameters the
/// optimizer could estimate an uncertainty for. `raw_optimizer_output` is the
/// optimizer's own report, carried along without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    fit_parameters: BTreeMap<String, Numerical>,
    fixed_parameters: BTreeMap<String, Numerical>,
    errors: BTreeMap<String, Numerical>,
    goodness_of_fit_qualifiers: BTreeMap<String, f64>,
    initial_guess: BTreeMap<String, Numerical>,
    raw_optimizer_output: serde_json::Value,
}

impl FitResult {
    pub fn new(
        fit_parameters: BTreeMap<String, Numerical>,
        fixed_parameters: BTreeMap<String, Numerical>,
        errors: BTreeMap<String, Numerical>,
        goodness_of_fit_qualifiers: BTreeMap<String, f64>,
        initial_guess: BTreeMap<String, Numerical>,
        raw_optimizer_output: serde_json::Value,
    ) -> Self {
        Self {
            fit_parameters,
            fixed_parameters,
            errors,
            goodness_of_fit_qualifiers,
            initial_guess,
            raw_optimizer_output,
        }
    }

    /// Fitted values of the free parameters.
    pub fn fit_parameters(&self) -> &BTreeMap<String, Numerical> {
        &self.fit_parameters
    }

    /// Values the fixed parameters were held at.
    pub fn fixed_parameters(&self) -> &BTreeMap<String, Numerical> {
        &self.fixed_parameters
    }

    /// Standard errors of the fitted values.
    pub fn errors(&self) -> &BTreeMap<String, Numerical> {
        &self.errors
    }

    pub fn goodness_of_fit_qualifiers(&self) -> &BTreeMap<String, f64> {
        &self.goodness_of_fit_qualifiers
    }

    /// Starting values of the free parameters.
    pub fn initial_guess(&self) -> &BTreeMap<String, Numerical> {
        &self.initial_guess
    }

    pub fn raw_optimizer_output(&self) -> &serde_json::Value {
        &self.raw_optimizer_output
    }

    /// Fitted and fixed values together: the bindings that, with the
    /// independent data, reproduce the fitted model.
    pub fn parameters(&self) -> Bindings {
        self.fixed_parameters
            .iter()
            .chain(&self.fit_parameters)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result:")?;
        writeln!(f, "  Parameters:")?;
        for (name, value) in &self.fit_parameters {
            match self.errors.get(name) {
                Some(error) => writeln!(f, "    {:<12} {} +/- {}", name, value, error)?,
                None => writeln!(f, "    {:<12} {}", name, value)?,
            }
        }
        if !self.fixed_parameters.is_empty() {
            writeln!(f, "  Fixed:")?;
            for (name, value) in &self.fixed_parameters {
                writeln!(f, "    {:<12} {}", name, value)?;
            }
        }
        writeln!(f, "  Goodness of fit:")?;
        for (name, value) in &self.goodness_of_fit_qualifiers {
            writeln!(f, "    {:<12} {:.6e}", name, value)?;
        }
        Ok(())
    }
}
