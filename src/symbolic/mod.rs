//! # Symbolic expressions
//!
//! The model layer only needs three capabilities from an expression: its free
//! symbols, substitution of symbols by other expressions, and evaluation
//! against a set of bound values. Those are captured by the [`Expression`]
//! trait so any algebra backend can be plugged in.
//!
//! The crate ships one backend, [`Expr`], with a `nom` parser for strings such
//! as `"y == a*x + b"`.

pub mod expr;
mod parser;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

use crate::numeric::{BroadcastError, Bindings, Numerical};

pub use expr::{BinaryOp, Expr, UnaryOp};

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    Parse { message: String },

    #[error("Unbound symbol: {name}")]
    UnboundSymbol { name: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Cannot broadcast shapes {left:?} and {right:?}")]
    Broadcast { left: Vec<usize>, right: Vec<usize> },
}

impl From<BroadcastError> for ExpressionError {
    fn from(err: BroadcastError) -> Self {
        ExpressionError::Broadcast {
            left: err.left,
            right: err.right,
        }
    }
}

/// A named symbol. Identity is by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&Symbol> for Symbol {
    fn from(symbol: &Symbol) -> Self {
        symbol.clone()
    }
}

/// Create symbols from a whitespace, comma or semicolon separated list.
///
/// ```
/// use smitfit::symbolic::symbols;
///
/// let s = symbols("x y a b");
/// assert_eq!(s.len(), 4);
/// assert_eq!(s[2].name(), "a");
/// ```
pub fn symbols(names: &str) -> Vec<Symbol> {
    split_names(names).into_iter().map(Symbol::from).collect()
}

/// Split a list of names on commas, semicolons and whitespace.
pub(crate) fn split_names(names: &str) -> Vec<String> {
    names
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Context for expression evaluation, providing variable values
pub trait EvaluationContext {
    /// Get the value bound to a symbol name, if any
    fn get(&self, name: &str) -> Option<&Numerical>;
}

impl EvaluationContext for Bindings {
    fn get(&self, name: &str) -> Option<&Numerical> {
        HashMap::get(self, name)
    }
}

impl EvaluationContext for BTreeMap<String, Numerical> {
    fn get(&self, name: &str) -> Option<&Numerical> {
        BTreeMap::get(self, name)
    }
}

/// Two stacked contexts; `front` shadows `back`.
pub struct Layered<'a, A: ?Sized, B: ?Sized> {
    pub front: &'a A,
    pub back: &'a B,
}

impl<A, B> EvaluationContext for Layered<'_, A, B>
where
    A: EvaluationContext + ?Sized,
    B: EvaluationContext + ?Sized,
{
    fn get(&self, name: &str) -> Option<&Numerical> {
        self.front.get(name).or_else(|| self.back.get(name))
    }
}

/// Outcome of parsing a line of text: a bare expression or an equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<E> {
    Expression(E),
    Equality { lhs: E, rhs: E },
}

/// Capabilities the model layer needs from a symbolic expression backend.
pub trait Expression: Clone + fmt::Debug + fmt::Display + Sized {
    /// Parse an expression or an `lhs == rhs` equality.
    fn parse(text: &str) -> Result<Parsed<Self>, ExpressionError>;

    /// The symbol this expression consists of, if it is a bare symbol.
    fn as_symbol(&self) -> Option<Symbol>;

    /// Every symbol the expression depends on.
    fn free_symbols(&self) -> BTreeSet<Symbol>;

    /// A new expression with symbols replaced. Symbols not in the mapping
    /// are left as they are.
    fn substitute(&self, replacements: &HashMap<Symbol, Self>) -> Self;

    /// Evaluate element-wise against the values in `context`.
    fn evaluate(&self, context: &dyn EvaluationContext) -> Result<Numerical, ExpressionError>;
}
