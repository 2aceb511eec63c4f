//! Systems of named equations.
//!
//! A [`Model`] maps output symbols to expressions. Expressions may refer to
//! other outputs, so evaluation follows a topological order of the dependency
//! graph among outputs. Every symbol that appears on a right-hand side and is
//! not itself an output is an input that must be bound at evaluation time.
//!
//! # Example
//!
//! ```
//! use smitfit::model::Model;
//! use smitfit::numeric::bindings;
//!
//! let model = Model::parse(["y == a * x + b", "z == 2 * y"]).unwrap();
//! let names: Vec<_> = model.input_symbols().iter().map(|s| s.name()).collect();
//! assert_eq!(names, vec!["a", "b", "x"]);
//!
//! let out = model
//!     .evaluate(&bindings([("x", 2.0), ("a", 3.0), ("b", 1.0)]))
//!     .unwrap();
//! assert_eq!(out["y"].sum(), 7.0);
//! assert_eq!(out["z"].sum(), 14.0);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::debug;

use crate::error::{Result, SmitFitError};
use crate::numeric::Numerical;
use crate::parameters::{Parameter, ParameterSelector, Parameters};
use crate::symbolic::{EvaluationContext, Expr, Expression, Layered, Parsed, Symbol};

/// Output name given to a bare expression with no left-hand side.
pub const DEFAULT_OUTPUT: &str = "y";

/// A system of equations `output == expression`.
#[derive(Debug, Clone)]
pub struct Model<E = Expr> {
    /// Equations in declaration order
    equations: Vec<(Symbol, E)>,
    /// Indices into `equations`, dependencies first
    order: Vec<usize>,
    inputs: BTreeSet<Symbol>,
}

impl<E: Expression> Model<E> {
    /// Build a model from `(output, expression)` pairs.
    ///
    /// Fails with [`SmitFitError::InvalidEquation`] if an output is declared
    /// twice and with [`SmitFitError::CyclicModel`] if outputs depend on each
    /// other in a cycle (an output referring to itself included).
    pub fn new<I, S>(equations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, E)>,
        S: Into<Symbol>,
    {
        let equations: Vec<(Symbol, E)> = equations
            .into_iter()
            .map(|(output, expr)| (output.into(), expr))
            .collect();

        let mut seen = HashSet::new();
        for (output, _) in &equations {
            if !seen.insert(output) {
                return Err(SmitFitError::InvalidEquation(format!(
                    "output '{}' is declared more than once",
                    output
                )));
            }
        }

        let order = topological_order(&equations)?;

        let outputs: BTreeSet<&Symbol> = equations.iter().map(|(output, _)| output).collect();
        let inputs = equations
            .iter()
            .flat_map(|(_, expr)| expr.free_symbols())
            .filter(|symbol| !outputs.contains(symbol))
            .collect();

        let model = Self {
            equations,
            order,
            inputs,
        };
        debug!(
            equations = model.equations.len(),
            inputs = model.inputs.len(),
            "built model with evaluation order {:?}",
            model.evaluation_order().iter().map(|s| s.name()).collect::<Vec<_>>()
        );
        Ok(model)
    }

    /// Build a model from text lines such as `"y == a*x + b"`.
    ///
    /// A line without `==` is a bare expression and defines the output `y`.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut equations = Vec::new();
        for line in lines {
            let line = line.as_ref();
            let parsed = E::parse(line)
                .map_err(|e| SmitFitError::InvalidEquation(format!("'{}': {}", line, e)))?;

            let equation = match parsed {
                Parsed::Expression(expr) => (Symbol::new(DEFAULT_OUTPUT), expr),
                Parsed::Equality { lhs, rhs } => {
                    let output = lhs.as_symbol().ok_or_else(|| {
                        SmitFitError::InvalidEquation(format!(
                            "left-hand side '{}' is not a symbol",
                            lhs
                        ))
                    })?;
                    (output, rhs)
                }
            };
            equations.push(equation);
        }
        Self::new(equations)
    }

    /// Equations in declaration order.
    pub fn equations(&self) -> impl Iterator<Item = (&Symbol, &E)> {
        self.equations.iter().map(|(output, expr)| (output, expr))
    }

    /// The expression defining `output`.
    pub fn get(&self, output: &str) -> Option<&E> {
        self.equations
            .iter()
            .find(|(symbol, _)| symbol.name() == output)
            .map(|(_, expr)| expr)
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    /// Outputs in declaration order.
    pub fn output_symbols(&self) -> Vec<&Symbol> {
        self.equations.iter().map(|(output, _)| output).collect()
    }

    /// Symbols that must be bound to evaluate the model, sorted by name.
    pub fn input_symbols(&self) -> &BTreeSet<Symbol> {
        &self.inputs
    }

    /// Every symbol of the model, inputs and outputs.
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        let mut all = self.inputs.clone();
        all.extend(self.equations.iter().map(|(output, _)| output.clone()));
        all
    }

    /// Outputs ordered so that each comes after every output it depends on.
    /// Independent outputs keep their declaration order.
    pub fn evaluation_order(&self) -> Vec<&Symbol> {
        self.order.iter().map(|&i| &self.equations[i].0).collect()
    }

    /// Evaluate every output.
    ///
    /// All input symbols must be bound; the first missing one (by name) is
    /// reported as [`SmitFitError::UnboundSymbol`] before anything is computed.
    pub fn evaluate<C>(&self, bindings: &C) -> Result<BTreeMap<String, Numerical>>
    where
        C: EvaluationContext + ?Sized,
    {
        if let Some(missing) = self.inputs.iter().find(|s| bindings.get(s.name()).is_none()) {
            return Err(SmitFitError::UnboundSymbol(missing.name().to_string()));
        }

        let mut resolved: BTreeMap<String, Numerical> = BTreeMap::new();
        for &i in &self.order {
            let (output, expr) = &self.equations[i];
            let value = {
                let context = Layered {
                    front: &resolved,
                    back: bindings,
                };
                expr.evaluate(&context)?
            };
            resolved.insert(output.name().to_string(), value);
        }

        Ok(resolved)
    }

    /// Create a parameter set from a selection of input symbols.
    ///
    /// ```
    /// use smitfit::model::Model;
    ///
    /// let model = Model::parse(["y == a * x + b"]).unwrap();
    /// assert_eq!(model.define_parameters("*").unwrap().names(), vec!["a", "b", "x"]);
    /// assert_eq!(model.define_parameters("a b").unwrap().names(), vec!["a", "b"]);
    /// assert!(model.define_parameters("c").is_err());
    /// ```
    pub fn define_parameters(&self, selector: impl Into<ParameterSelector>) -> Result<Parameters> {
        let mut params = Parameters::new();
        for (symbol, guess) in selector.into().resolve(&self.inputs)? {
            let mut param = Parameter::new(symbol);
            if let Some(guess) = guess {
                param.set_guess(guess);
            }
            params.add(param)?;
        }
        Ok(params)
    }

    /// A new model with symbols on the right-hand sides replaced.
    ///
    /// Outputs keep their names; `self` is left unchanged. The result is
    /// checked like any new model, so a substitution that introduces a cycle
    /// is an error.
    ///
    /// ```
    /// use smitfit::model::Model;
    ///
    /// let model = Model::parse(["y == a * x + b"]).unwrap();
    /// let pinned = model.substitute([("a", 5.0)]).unwrap();
    /// assert_eq!(pinned.to_string(), "y == 5 * x + b");
    /// assert_eq!(model.to_string(), "y == a * x + b");
    /// ```
    pub fn substitute<I, K, V>(&self, replacements: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Symbol>,
        V: Into<E>,
    {
        let replacements: HashMap<Symbol, E> = replacements
            .into_iter()
            .map(|(symbol, expr)| (symbol.into(), expr.into()))
            .collect();

        Self::new(
            self.equations
                .iter()
                .map(|(output, expr)| (output.clone(), expr.substitute(&replacements))),
        )
    }
}

impl Model<Expr> {
    /// Parse a model with the built-in expression backend.
    ///
    /// See [`Model::from_lines`].
    pub fn parse<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_lines(lines)
    }
}

impl<E: Expression> fmt::Display for Model<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (output, expr)) in self.equations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} == {}", output, expr)?;
        }
        Ok(())
    }
}

/// Kahn's algorithm over the output dependency graph. Ties are broken by
/// declaration order.
fn topological_order<E: Expression>(equations: &[(Symbol, E)]) -> Result<Vec<usize>> {
    let index: HashMap<&Symbol, usize> = equations
        .iter()
        .enumerate()
        .map(|(i, (output, _))| (output, i))
        .collect();

    let n = equations.len();
    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, (_, expr)) in equations.iter().enumerate() {
        for symbol in expr.free_symbols() {
            if let Some(&dependency) = index.get(&symbol) {
                in_degree[i] += 1;
                dependents[dependency].push(i);
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < n {
        let stuck: Vec<&str> = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| equations[i].0.name())
            .collect();
        return Err(SmitFitError::CyclicModel(format!(
            "outputs depend on each other in a cycle: {}",
            stuck.join(", ")
        )));
    }

    Ok(order)
}
