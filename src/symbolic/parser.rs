//! `nom` parser for the default expression backend.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! line       := expression ("==" expression)?
//! expression := term (("+" | "-") term)*
//! term       := unary (("*" | "/") unary)*
//! unary      := ("-" | "+") unary | power
//! power      := primary (("^" | "**") unary)?
//! primary    := number | identifier "(" args? ")" | identifier | "(" expression ")"
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::recognize,
    multi::many0,
    number::complete::double,
    sequence::pair,
    IResult, Parser,
};

use super::expr::{BinaryOp, Expr, UnaryOp};
use super::{ExpressionError, Parsed, Symbol};

type ParseError<'a> = nom::error::Error<&'a str>;
type PResult<'a, T> = IResult<&'a str, T, ParseError<'a>>;

/// Parse a full line: an expression, or two expressions joined by `==`.
pub(crate) fn parse(input: &str) -> Result<Parsed<Expr>, ExpressionError> {
    let (rest, lhs) = expression(input).map_err(parse_error)?;
    let (rest, _) = ws(rest).map_err(parse_error)?;
    if rest.is_empty() {
        return Ok(Parsed::Expression(lhs));
    }

    let rest = match keyword(rest, "==") {
        Ok((rest, _)) => rest,
        Err(_) => return Err(trailing(rest)),
    };

    let (rest, rhs) = expression(rest).map_err(parse_error)?;
    let (rest, _) = ws(rest).map_err(parse_error)?;
    if !rest.is_empty() {
        return Err(trailing(rest));
    }

    Ok(Parsed::Equality { lhs, rhs })
}

fn parse_error(err: nom::Err<ParseError<'_>>) -> ExpressionError {
    let message = match err {
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) if e.input.is_empty() => {
            "unexpected end of input".to_string()
        }
        nom::Err::Error(e) | nom::Err::Failure(e) => format!("unexpected input at '{}'", e.input),
    };
    ExpressionError::Parse { message }
}

fn trailing(rest: &str) -> ExpressionError {
    ExpressionError::Parse {
        message: format!("Unexpected trailing characters: '{}'", rest),
    }
}

fn ws(input: &str) -> PResult<'_, &str> {
    multispace0(input)
}

fn punct(input: &str, c: char) -> PResult<'_, char> {
    char(c).parse(input)
}

fn keyword<'a>(input: &'a str, word: &'static str) -> PResult<'a, &'a str> {
    tag(word).parse(input)
}

fn number(input: &str) -> PResult<'_, f64> {
    double(input)
}

/// Parse an identifier (symbol or function name)
fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn expression(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut acc) = term(input)?;

    loop {
        let (rest, _) = ws(input)?;
        let (rest, op) = if let Ok((rest, _)) = punct(rest, '+') {
            (rest, BinaryOp::Add)
        } else if let Ok((rest, _)) = punct(rest, '-') {
            (rest, BinaryOp::Sub)
        } else {
            return Ok((input, acc));
        };

        let (rest, rhs) = term(rest)?;
        acc = Expr::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
}

fn term(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut acc) = unary(input)?;

    loop {
        let (rest, _) = ws(input)?;
        if keyword(rest, "**").is_ok() {
            return Ok((input, acc));
        }
        let (rest, op) = if let Ok((rest, _)) = punct(rest, '*') {
            (rest, BinaryOp::Mul)
        } else if let Ok((rest, _)) = punct(rest, '/') {
            (rest, BinaryOp::Div)
        } else {
            return Ok((input, acc));
        };

        let (rest, rhs) = unary(rest)?;
        acc = Expr::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
}

fn unary(input: &str) -> PResult<'_, Expr> {
    let (input, _) = ws(input)?;

    if let Ok((rest, _)) = punct(input, '-') {
        let (rest, expr) = unary(rest)?;
        return Ok((rest, Expr::Unary(UnaryOp::Neg, Box::new(expr))));
    }
    if let Ok((rest, _)) = punct(input, '+') {
        return unary(rest);
    }

    power(input)
}

fn power(input: &str) -> PResult<'_, Expr> {
    let (input, base) = primary(input)?;
    let (rest, _) = ws(input)?;

    let rest = if let Ok((rest, _)) = keyword(rest, "**") {
        rest
    } else if let Ok((rest, _)) = punct(rest, '^') {
        rest
    } else {
        return Ok((input, base));
    };

    let (rest, exponent) = unary(rest)?;
    Ok((
        rest,
        Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
    ))
}

fn primary(input: &str) -> PResult<'_, Expr> {
    let (input, _) = ws(input)?;

    if input.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        let (rest, value) = number(input)?;
        return Ok((rest, Expr::Number(value)));
    }

    if let Ok((rest, _)) = punct(input, '(') {
        let (rest, expr) = expression(rest)?;
        let (rest, _) = ws(rest)?;
        let (rest, _) = punct(rest, ')')?;
        return Ok((rest, expr));
    }

    let (rest, name) = identifier(input)?;
    let (after_ws, _) = ws(rest)?;
    match punct(after_ws, '(') {
        Ok((after_paren, _)) => {
            let (rest, args) = arguments(after_paren)?;
            Ok((rest, Expr::Function(name.to_string(), args)))
        }
        Err(_) => Ok((rest, Expr::Symbol(Symbol::new(name)))),
    }
}

/// Comma-separated call arguments up to and including the closing paren.
fn arguments(input: &str) -> PResult<'_, Vec<Expr>> {
    let (input, _) = ws(input)?;
    if let Ok((rest, _)) = punct(input, ')') {
        return Ok((rest, Vec::new()));
    }

    let (mut input, first) = expression(input)?;
    let mut args = vec![first];
    loop {
        let (rest, _) = ws(input)?;
        if let Ok((rest, _)) = punct(rest, ',') {
            let (rest, arg) = expression(rest)?;
            args.push(arg);
            input = rest;
        } else {
            let (rest, _) = punct(rest, ')')?;
            return Ok((rest, args));
        }
    }
}
