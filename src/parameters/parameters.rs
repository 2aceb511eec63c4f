//! Ordered collection of parameters.
//!
//! A [`Parameters`] set keeps its parameters in insertion order with unique
//! names. The free/fixed partition used by the fit adapters is exposed as two
//! [`ParameterView`]s that preserve that order, so packing the free guesses and
//! unpacking an optimizer vector always agree on the layout.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SmitFitError};
use crate::numeric::{IntoNumerical, Numerical};
use crate::parameters::bounds::Bounds;
use crate::parameters::packing::Shapes;
use crate::parameters::parameter::Parameter;
use crate::symbolic::{split_names, Symbol};

/// A list of parameter names.
///
/// A string is split on commas, semicolons and whitespace, so `"a, b"` and
/// `["a", "b"]` name the same parameters.
pub trait NameList {
    fn into_names(self) -> Vec<String>;
}

impl NameList for &str {
    fn into_names(self) -> Vec<String> {
        split_names(self)
    }
}

impl NameList for &String {
    fn into_names(self) -> Vec<String> {
        split_names(self)
    }
}

impl NameList for &[&str] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> NameList for [&str; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl NameList for Vec<&str> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl NameList for Vec<String> {
    fn into_names(self) -> Vec<String> {
        self
    }
}

/// A collection of parameters for optimization problems
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Parameters {
    /// Create a new empty parameters collection
    pub fn new() -> Self {
        Self::default()
    }

    /// One free, unbounded parameter per symbol, each with a guess of `1.0`.
    ///
    /// ```
    /// use smitfit::parameters::Parameters;
    /// use smitfit::symbolic::symbols;
    ///
    /// let params = Parameters::from_symbols(symbols("a b")).unwrap();
    /// assert_eq!(params.names(), vec!["a", "b"]);
    /// ```
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let mut params = Self::new();
        for symbol in symbols {
            params.add(Parameter::new(symbol))?;
        }
        Ok(params)
    }

    /// Append a parameter. Fails if its name is already taken.
    pub fn add(&mut self, param: Parameter) -> Result<()> {
        if self.contains(param.name()) {
            return Err(SmitFitError::DuplicateParameter(param.name().to_string()));
        }
        self.params.push(param);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    fn require_mut(&mut self, name: &str) -> Result<&mut Parameter> {
        self.get_mut(name)
            .ok_or_else(|| SmitFitError::UnknownParameter(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(Parameter::name).collect()
    }

    /// Parameters that the optimizer varies, in set order.
    pub fn free(&self) -> ParameterView<'_> {
        ParameterView {
            params: self.params.iter().filter(|p| !p.is_fixed()).collect(),
        }
    }

    /// Parameters held at their guess, in set order.
    pub fn fixed(&self) -> ParameterView<'_> {
        ParameterView {
            params: self.params.iter().filter(|p| p.is_fixed()).collect(),
        }
    }

    /// Guesses of every parameter, in set order.
    pub fn guess(&self) -> Vec<(String, Numerical)> {
        self.all().guess()
    }

    /// Shapes of every parameter, in set order.
    pub fn shapes(&self) -> Shapes {
        self.all().shapes()
    }

    fn all(&self) -> ParameterView<'_> {
        ParameterView {
            params: self.params.iter().collect(),
        }
    }

    /// Mark parameters as fixed.
    ///
    /// Names are applied in order; on an unknown name the error is returned and
    /// the names before it stay fixed.
    ///
    /// ```
    /// use smitfit::parameters::Parameters;
    /// use smitfit::symbolic::symbols;
    ///
    /// let mut params = Parameters::from_symbols(symbols("a b c")).unwrap();
    /// params.fix("a, c").unwrap();
    /// assert_eq!(params.fixed().names(), vec!["a", "c"]);
    /// assert_eq!(params.free().names(), vec!["b"]);
    /// ```
    pub fn fix(&mut self, names: impl NameList) -> Result<&mut Self> {
        for name in names.into_names() {
            self.require_mut(&name)?.fix();
        }
        Ok(self)
    }

    /// Mark parameters as free. Partial application as for [`Parameters::fix`].
    pub fn unfix(&mut self, names: impl NameList) -> Result<&mut Self> {
        for name in names.into_names() {
            self.require_mut(&name)?.unfix();
        }
        Ok(self)
    }

    /// Set `(min, max)` bounds per name.
    ///
    /// Entries are applied in order. The first unknown name or invalid pair
    /// stops the update and is returned; earlier entries remain applied.
    pub fn set_bounds<I, K>(&mut self, bounds: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, (f64, f64))>,
        K: AsRef<str>,
    {
        for (name, (min, max)) in bounds {
            self.require_mut(name.as_ref())?.set_bounds(min, max)?;
        }
        Ok(self)
    }

    /// Set guesses per name. Partial application as for [`Parameters::set_bounds`].
    pub fn set_guesses<I, K, V>(&mut self, guesses: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoNumerical,
    {
        for (name, value) in guesses {
            self.require_mut(name.as_ref())?.set_guess(value);
        }
        Ok(self)
    }

    /// Save parameters to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load parameters from a JSON string, rejecting repeated names.
    pub fn from_json(json: &str) -> Result<Self> {
        let loaded: Parameters = serde_json::from_str(json)?;
        let mut params = Self::new();
        for param in loaded.params {
            params.add(param)?;
        }
        Ok(params)
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:<24} {:<24} {}", "name", "guess", "bounds", "fixed")?;
        for param in &self.params {
            writeln!(
                f,
                "{:<12} {:<24} {:<24} {}",
                param.name(),
                param.guess().to_string(),
                param.bounds().to_string(),
                param.is_fixed()
            )?;
        }
        Ok(())
    }
}

/// An ordered, read-only subset of a [`Parameters`] set.
#[derive(Debug, Clone)]
pub struct ParameterView<'a> {
    params: Vec<&'a Parameter>,
}

impl<'a> ParameterView<'a> {
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Parameter> + '_ {
        self.params.iter().copied()
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.params.iter().map(|p| p.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name() == name)
    }

    /// Name and guess of each parameter, in order.
    pub fn guess(&self) -> Vec<(String, Numerical)> {
        self.params
            .iter()
            .map(|p| (p.name().to_string(), p.guess().clone()))
            .collect()
    }

    /// Name and shape of each parameter, in order.
    pub fn shapes(&self) -> Shapes {
        self.params
            .iter()
            .map(|p| (p.name().to_string(), p.shape().to_vec()))
            .collect()
    }

    /// Total number of scalar elements.
    pub fn size(&self) -> usize {
        self.params.iter().map(|p| p.size()).sum()
    }

    /// Bounds repeated once per scalar element, matching the packed layout.
    pub fn element_bounds(&self) -> Vec<Bounds> {
        self.params
            .iter()
            .flat_map(|p| std::iter::repeat(p.bounds()).take(p.size()))
            .collect()
    }
}
