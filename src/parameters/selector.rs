//! Selection of which model inputs become parameters.
//!
//! A selector is resolved against the model's input symbols. Strings are the
//! common case: `"*"` selects every input, a string with a `*` wildcard is a
//! glob pattern, and anything else is a list of names.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{Result, SmitFitError};
use crate::numeric::{IntoNumerical, Numerical};
use crate::symbolic::{split_names, Symbol};

/// Which symbols to turn into parameters, optionally with initial guesses.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterSelector {
    /// Every input symbol.
    All,
    /// Input symbols whose name matches a glob pattern (`*` and `?`).
    Pattern(String),
    /// Exactly these names; each must be an input symbol.
    Names(Vec<String>),
    /// These names with their initial guesses.
    Guesses(Vec<(String, Numerical)>),
}

impl ParameterSelector {
    /// Resolve against the available symbols.
    ///
    /// Returns the selected symbols with their guesses, if any. `All` and
    /// `Pattern` yield symbols in sorted order; `Names` and `Guesses` keep the
    /// caller's order. A name that is not available is an
    /// [`SmitFitError::UnknownSymbol`].
    pub fn resolve(
        &self,
        available: &BTreeSet<Symbol>,
    ) -> Result<Vec<(Symbol, Option<Numerical>)>> {
        let require = |name: &str| -> Result<Symbol> {
            let symbol = Symbol::new(name);
            if available.contains(&symbol) {
                Ok(symbol)
            } else {
                Err(SmitFitError::UnknownSymbol(name.to_string()))
            }
        };

        match self {
            ParameterSelector::All => Ok(available.iter().map(|s| (s.clone(), None)).collect()),
            ParameterSelector::Pattern(pattern) => Ok(available
                .iter()
                .filter(|s| glob_match(pattern, s.name()))
                .map(|s| (s.clone(), None))
                .collect()),
            ParameterSelector::Names(names) => names
                .iter()
                .map(|name| -> Result<_> { Ok((require(name.as_str())?, None)) })
                .collect(),
            ParameterSelector::Guesses(guesses) => guesses
                .iter()
                .map(|(name, guess)| -> Result<_> {
                    Ok((require(name.as_str())?, Some(guess.clone())))
                })
                .collect(),
        }
    }
}

impl From<&str> for ParameterSelector {
    fn from(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed == "*" {
            ParameterSelector::All
        } else if trimmed.contains('*') {
            ParameterSelector::Pattern(trimmed.to_string())
        } else {
            ParameterSelector::Names(split_names(trimmed))
        }
    }
}

impl From<String> for ParameterSelector {
    fn from(text: String) -> Self {
        ParameterSelector::from(text.as_str())
    }
}

impl From<&[&str]> for ParameterSelector {
    fn from(names: &[&str]) -> Self {
        ParameterSelector::Names(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParameterSelector {
    fn from(names: [&str; N]) -> Self {
        ParameterSelector::from(&names[..])
    }
}

impl From<Vec<&str>> for ParameterSelector {
    fn from(names: Vec<&str>) -> Self {
        ParameterSelector::from(names.as_slice())
    }
}

impl From<Vec<String>> for ParameterSelector {
    fn from(names: Vec<String>) -> Self {
        ParameterSelector::Names(names)
    }
}

impl From<&[Symbol]> for ParameterSelector {
    fn from(symbols: &[Symbol]) -> Self {
        ParameterSelector::Names(symbols.iter().map(|s| s.name().to_string()).collect())
    }
}

impl From<Vec<Symbol>> for ParameterSelector {
    fn from(symbols: Vec<Symbol>) -> Self {
        ParameterSelector::from(symbols.as_slice())
    }
}

fn guesses<I, K, V>(pairs: I) -> ParameterSelector
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: IntoNumerical,
{
    ParameterSelector::Guesses(
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into_numerical()))
            .collect(),
    )
}

impl From<Vec<(&str, f64)>> for ParameterSelector {
    fn from(pairs: Vec<(&str, f64)>) -> Self {
        guesses(pairs)
    }
}

impl<const N: usize> From<[(&str, f64); N]> for ParameterSelector {
    fn from(pairs: [(&str, f64); N]) -> Self {
        guesses(pairs)
    }
}

impl From<Vec<(&str, Numerical)>> for ParameterSelector {
    fn from(pairs: Vec<(&str, Numerical)>) -> Self {
        guesses(pairs)
    }
}

impl From<HashMap<String, f64>> for ParameterSelector {
    fn from(pairs: HashMap<String, f64>) -> Self {
        // sorted so the parameter order does not depend on hashing
        guesses(pairs.into_iter().collect::<BTreeMap<_, _>>())
    }
}

impl From<BTreeMap<String, f64>> for ParameterSelector {
    fn from(pairs: BTreeMap<String, f64>) -> Self {
        guesses(pairs)
    }
}

impl From<BTreeMap<String, Numerical>> for ParameterSelector {
    fn from(pairs: BTreeMap<String, Numerical>) -> Self {
        guesses(pairs)
    }
}

/// Shell-style name matching: `*` matches any run of characters, `?` matches
/// exactly one.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    // Position of the last `*` and the name index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, tried)) => {
                    p = star + 1;
                    n = tried + 1;
                    backtrack = Some((star, tried + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
