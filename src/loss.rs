//! Residuals and objectives comparing model outputs to observations.
//!
//! A loss owns a [`Model`] and observations for some of its outputs. Given
//! bindings for the model inputs it yields, per observed output,
//! `model - observed` (broadcast element-wise), and a scalar objective built
//! from those residuals.

use ndarray::Array1;

use crate::error::{Result, SmitFitError};
use crate::model::Model;
use crate::numeric::{zip_with, IntoNumerical, Numerical};
use crate::symbolic::{EvaluationContext, Expr, Expression};

/// Residual computation shared by the fit adapters.
pub trait Loss {
    /// Observed outputs, in declared order.
    fn output_names(&self) -> Vec<&str>;

    /// `model - observed` for every observed output, in declared order.
    fn residuals(&self, bindings: &dyn EvaluationContext) -> Result<Vec<(String, Numerical)>>;

    /// Residuals scaled so that the sum of their squares equals
    /// [`Loss::objective`]. This is what least-squares optimizers minimize.
    fn weighted_residuals(
        &self,
        bindings: &dyn EvaluationContext,
    ) -> Result<Vec<(String, Numerical)>> {
        self.residuals(bindings)
    }

    /// Scalar objective for the given bindings.
    fn objective(&self, bindings: &dyn EvaluationContext) -> Result<f64>;
}

/// Concatenate residual arrays, in order, into one flat vector.
pub fn flat_concat(residuals: &[(String, Numerical)]) -> Array1<f64> {
    residuals
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .collect()
}

/// Model outputs paired with their observations.
#[derive(Debug, Clone)]
struct Observed<E> {
    model: Model<E>,
    data: Vec<(String, Numerical)>,
}

impl<E: Expression> Observed<E> {
    fn new<I, K, V>(model: Model<E>, observed: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoNumerical,
    {
        let mut data: Vec<(String, Numerical)> = Vec::new();
        for (name, values) in observed {
            let name = name.into();
            if model.get(&name).is_none() {
                return Err(SmitFitError::UnknownSymbol(name));
            }
            if data.iter().any(|(existing, _)| *existing == name) {
                return Err(SmitFitError::DuplicateObservation(name));
            }
            data.push((name, values.into_numerical()));
        }
        Ok(Self { model, data })
    }

    fn names(&self) -> Vec<&str> {
        self.data.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn residuals(&self, bindings: &dyn EvaluationContext) -> Result<Vec<(String, Numerical)>> {
        let outputs = self.model.evaluate(bindings)?;

        self.data
            .iter()
            .map(|(name, observed)| -> Result<(String, Numerical)> {
                let predicted = outputs
                    .get(name)
                    .ok_or_else(|| SmitFitError::UnknownSymbol(name.clone()))?;
                let residual = zip_with(predicted, observed, |p, o| p - o)?;
                Ok((name.clone(), residual))
            })
            .collect()
    }
}

/// Sum of squared residuals over every observed output.
#[derive(Debug, Clone)]
pub struct SquaredErrorLoss<E = Expr> {
    inner: Observed<E>,
}

impl<E: Expression> SquaredErrorLoss<E> {
    /// Pair a model with observations keyed by output name.
    ///
    /// Fails with [`SmitFitError::UnknownSymbol`] if a key is not a model output.
    pub fn new<I, K, V>(model: Model<E>, observed: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoNumerical,
    {
        Ok(Self {
            inner: Observed::new(model, observed)?,
        })
    }

    pub fn model(&self) -> &Model<E> {
        &self.inner.model
    }
}

impl<E: Expression> Loss for SquaredErrorLoss<E> {
    fn output_names(&self) -> Vec<&str> {
        self.inner.names()
    }

    fn residuals(&self, bindings: &dyn EvaluationContext) -> Result<Vec<(String, Numerical)>> {
        self.inner.residuals(bindings)
    }

    fn objective(&self, bindings: &dyn EvaluationContext) -> Result<f64> {
        Ok(self
            .residuals(bindings)?
            .iter()
            .map(|(_, r)| r.iter().map(|v| v * v).sum::<f64>())
            .sum())
    }
}

/// Mean of the squared residuals per output, summed over outputs.
///
/// Outputs with many samples do not outweigh outputs with few.
#[derive(Debug, Clone)]
pub struct MeanSquaredErrorLoss<E = Expr> {
    inner: Observed<E>,
}

impl<E: Expression> MeanSquaredErrorLoss<E> {
    /// Pair a model with observations keyed by output name.
    pub fn new<I, K, V>(model: Model<E>, observed: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoNumerical,
    {
        Ok(Self {
            inner: Observed::new(model, observed)?,
        })
    }

    pub fn model(&self) -> &Model<E> {
        &self.inner.model
    }
}

impl<E: Expression> Loss for MeanSquaredErrorLoss<E> {
    fn output_names(&self) -> Vec<&str> {
        self.inner.names()
    }

    fn residuals(&self, bindings: &dyn EvaluationContext) -> Result<Vec<(String, Numerical)>> {
        self.inner.residuals(bindings)
    }

    fn weighted_residuals(
        &self,
        bindings: &dyn EvaluationContext,
    ) -> Result<Vec<(String, Numerical)>> {
        Ok(self
            .residuals(bindings)?
            .into_iter()
            .map(|(name, r)| {
                let scale = (r.len().max(1) as f64).sqrt();
                (name, r / scale)
            })
            .collect())
    }

    fn objective(&self, bindings: &dyn EvaluationContext) -> Result<f64> {
        Ok(self
            .residuals(bindings)?
            .iter()
            .filter(|(_, r)| !r.is_empty())
            .map(|(_, r)| r.iter().map(|v| v * v).sum::<f64>() / r.len() as f64)
            .sum())
    }
}
