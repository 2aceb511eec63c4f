//! A single fit parameter.
//!
//! A parameter is a model symbol together with an initial guess, element-wise
//! bounds and a fixed flag. The guess decides the parameter's shape: a scalar
//! guess makes a scalar parameter, an array guess makes an array parameter
//! that is flattened into several optimizer variables.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::numeric::{scalar, IntoNumerical, Numerical};
use crate::parameters::bounds::{Bounds, BoundsError};
use crate::symbolic::Symbol;

/// A parameter for optimization problems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    symbol: Symbol,

    /// Initial value; also defines the shape
    guess: Numerical,

    bounds: Bounds,

    /// A fixed parameter is held at its guess during a fit
    fixed: bool,
}

impl Parameter {
    /// Create a free, unbounded parameter with a guess of `1.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use smitfit::parameters::Parameter;
    ///
    /// let param = Parameter::new("amplitude");
    /// assert_eq!(param.name(), "amplitude");
    /// assert!(param.shape().is_empty());
    /// assert!(!param.is_fixed());
    /// ```
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            guess: scalar(1.0),
            bounds: Bounds::default(),
            fixed: false,
        }
    }

    pub fn with_guess(mut self, guess: impl IntoNumerical) -> Self {
        self.guess = guess.into_numerical();
        self
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Result<Self, BoundsError> {
        self.set_bounds(min, max)?;
        Ok(self)
    }

    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn name(&self) -> &str {
        self.symbol.name()
    }

    pub fn guess(&self) -> &Numerical {
        &self.guess
    }

    /// Replace the guess. The shape of the parameter follows the new value.
    pub fn set_guess(&mut self, guess: impl IntoNumerical) {
        self.guess = guess.into_numerical();
    }

    /// Shape of the guess; empty for a scalar.
    pub fn shape(&self) -> &[usize] {
        self.guess.shape()
    }

    /// Number of optimizer variables this parameter occupies when free.
    pub fn size(&self) -> usize {
        self.guess.len()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Set the bounds. On error the previous bounds are kept.
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), BoundsError> {
        self.bounds = Bounds::new(min, max)?;
        Ok(())
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn fix(&mut self) {
        self.fixed = true;
    }

    pub fn unfix(&mut self) {
        self.fixed = false;
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parameter(name='{}', guess={}, bounds={}, fixed={})",
            self.name(),
            self.guess,
            self.bounds,
            self.fixed
        )
    }
}
