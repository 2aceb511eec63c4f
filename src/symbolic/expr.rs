//! Default expression backend: a small algebraic AST evaluated over arrays.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::parser;
use super::{EvaluationContext, Expression, ExpressionError, Parsed, Symbol};
use crate::numeric::{fold_with, scalar, zip_with, Numerical};

/// Result type for expression evaluation
type ExprResult<T> = Result<T, ExpressionError>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant number
    Number(f64),

    /// Symbol reference
    Symbol(Symbol),

    /// Unary operations
    Unary(UnaryOp, Box<Expr>),

    /// Binary operations
    Binary(BinaryOp, Box<Expr>, Box<Expr>),

    /// Function call
    Function(String, Vec<Expr>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Power (`^` or `**`)
    Pow,
}

impl BinaryOp {
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Pow => lhs.powf(rhs),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => 4,
        }
    }
}

impl Expr {
    /// Parse a bare expression. Equalities are rejected.
    pub fn parse_expr(input: &str) -> ExprResult<Self> {
        match parser::parse(input)? {
            Parsed::Expression(expr) => Ok(expr),
            Parsed::Equality { .. } => Err(ExpressionError::Parse {
                message: format!("expected an expression, found an equation: '{}'", input),
            }),
        }
    }

    pub fn symbol(name: impl Into<Symbol>) -> Self {
        Expr::Symbol(name.into())
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(op, _, _) => op.precedence(),
            Expr::Unary(..) => 3,
            Expr::Number(n) if *n < 0.0 => 3,
            _ => 5,
        }
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<Symbol>) {
        match self {
            Expr::Number(_) => {}
            Expr::Symbol(symbol) => {
                symbols.insert(symbol.clone());
            }
            Expr::Unary(_, expr) => expr.collect_symbols(symbols),
            Expr::Binary(_, left, right) => {
                left.collect_symbols(symbols);
                right.collect_symbols(symbols);
            }
            Expr::Function(_, args) => {
                for arg in args {
                    arg.collect_symbols(symbols);
                }
            }
        }
    }

    fn call(name: &str, args: Vec<Numerical>) -> ExprResult<Numerical> {
        let unary: Option<fn(f64) -> f64> = match name {
            "sin" => Some(f64::sin),
            "cos" => Some(f64::cos),
            "tan" => Some(f64::tan),
            "exp" => Some(f64::exp),
            "log" | "ln" => Some(f64::ln),
            "log10" => Some(f64::log10),
            "sqrt" => Some(f64::sqrt),
            "abs" => Some(f64::abs),
            _ => None,
        };

        if let Some(f) = unary {
            return match args.as_slice() {
                [arg] => Ok(arg.mapv(f)),
                _ => Err(ExpressionError::InvalidArguments {
                    message: format!("{}() requires 1 argument, got {}", name, args.len()),
                }),
            };
        }

        let fold: fn(f64, f64) -> f64 = match name {
            "max" => f64::max,
            "min" => f64::min,
            _ => {
                return Err(ExpressionError::UndefinedFunction {
                    name: name.to_string(),
                })
            }
        };

        if args.len() < 2 {
            return Err(ExpressionError::InvalidArguments {
                message: format!(
                    "{}() requires at least 2 arguments, got {}",
                    name,
                    args.len()
                ),
            });
        }
        let folded = fold_with(&args, fold)?;
        folded.ok_or_else(|| ExpressionError::InvalidArguments {
            message: format!("{}() received no arguments", name),
        })
    }
}

impl Expression for Expr {
    fn parse(text: &str) -> ExprResult<Parsed<Self>> {
        parser::parse(text)
    }

    fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Expr::Symbol(symbol) => Some(symbol.clone()),
            _ => None,
        }
    }

    fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn substitute(&self, replacements: &HashMap<Symbol, Self>) -> Self {
        match self {
            Expr::Number(_) => self.clone(),
            Expr::Symbol(symbol) => replacements
                .get(symbol)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Expr::Unary(op, expr) => Expr::Unary(*op, Box::new(expr.substitute(replacements))),
            Expr::Binary(op, left, right) => Expr::Binary(
                *op,
                Box::new(left.substitute(replacements)),
                Box::new(right.substitute(replacements)),
            ),
            Expr::Function(name, args) => Expr::Function(
                name.clone(),
                args.iter().map(|arg| arg.substitute(replacements)).collect(),
            ),
        }
    }

    fn evaluate(&self, context: &dyn EvaluationContext) -> ExprResult<Numerical> {
        match self {
            Expr::Number(n) => Ok(scalar(*n)),

            Expr::Symbol(symbol) => {
                context
                    .get(symbol.name())
                    .cloned()
                    .ok_or_else(|| ExpressionError::UnboundSymbol {
                        name: symbol.name().to_string(),
                    })
            }

            Expr::Unary(UnaryOp::Neg, expr) => Ok(expr.evaluate(context)?.mapv(|v| -v)),

            Expr::Binary(op, left, right) => {
                let lhs = left.evaluate(context)?;
                let rhs = right.evaluate(context)?;
                Ok(zip_with(&lhs, &rhs, |a, b| op.apply(a, b))?)
            }

            Expr::Function(name, args) => {
                let evaluated = args
                    .iter()
                    .map(|arg| arg.evaluate(context))
                    .collect::<ExprResult<Vec<_>>>()?;
                Self::call(name, evaluated)
            }
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Number(value)
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::Symbol(symbol)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Symbol(symbol) => write!(f, "{}", symbol),
            Expr::Unary(UnaryOp::Neg, expr) => {
                if expr.precedence() < self.precedence() {
                    write!(f, "-({})", expr)
                } else {
                    write!(f, "-{}", expr)
                }
            }
            Expr::Binary(op, left, right) => {
                let prec = op.precedence();
                // Pow is right-associative, the others are left-associative.
                let (left_needs, right_needs) = if *op == BinaryOp::Pow {
                    (left.precedence() <= prec, right.precedence() < prec)
                } else {
                    (left.precedence() < prec, right.precedence() <= prec)
                };
                if left_needs {
                    write!(f, "({})", left)?;
                } else {
                    write!(f, "{}", left)?;
                }
                write!(f, " {} ", op.symbol())?;
                if right_needs {
                    write!(f, "({})", right)
                } else {
                    write!(f, "{}", right)
                }
            }
            Expr::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
