//! Numeric values shared by every layer of the crate.
//!
//! All values (inputs, parameter guesses, model outputs, observations) are
//! n-dimensional `f64` arrays. A scalar is a zero-dimensional array, so a
//! parameter shape of `[]` means "bare number".

use ndarray::{arr0, Array, Array1, Array2, ArrayD, IxDyn, Zip};
use std::collections::HashMap;
use thiserror::Error;

/// A scalar or array value.
pub type Numerical = ArrayD<f64>;

/// Values bound to symbol names for one evaluation.
pub type Bindings = HashMap<String, Numerical>;

/// Two shapes that cannot be broadcast against each other.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot broadcast shapes {left:?} and {right:?}")]
pub struct BroadcastError {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

/// Conversion of plain numbers and arrays into a [`Numerical`].
pub trait IntoNumerical {
    fn into_numerical(self) -> Numerical;
}

impl IntoNumerical for f64 {
    fn into_numerical(self) -> Numerical {
        scalar(self)
    }
}

impl IntoNumerical for Vec<f64> {
    fn into_numerical(self) -> Numerical {
        Array1::from_vec(self).into_dyn()
    }
}

impl IntoNumerical for &[f64] {
    fn into_numerical(self) -> Numerical {
        Array1::from_vec(self.to_vec()).into_dyn()
    }
}

impl<const N: usize> IntoNumerical for [f64; N] {
    fn into_numerical(self) -> Numerical {
        Array1::from_vec(self.to_vec()).into_dyn()
    }
}

impl IntoNumerical for Array1<f64> {
    fn into_numerical(self) -> Numerical {
        self.into_dyn()
    }
}

impl IntoNumerical for Array2<f64> {
    fn into_numerical(self) -> Numerical {
        self.into_dyn()
    }
}

impl IntoNumerical for Numerical {
    fn into_numerical(self) -> Numerical {
        self
    }
}

impl IntoNumerical for &Numerical {
    fn into_numerical(self) -> Numerical {
        self.clone()
    }
}

/// Build a zero-dimensional array holding `value`.
pub fn scalar(value: f64) -> Numerical {
    arr0(value).into_dyn()
}

/// Return the single element of a one-element value.
pub fn as_scalar(value: &Numerical) -> Option<f64> {
    if value.len() == 1 {
        value.iter().next().copied()
    } else {
        None
    }
}

/// Build a binding set from name/value pairs.
///
/// ```
/// use smitfit::numeric::bindings;
///
/// let b = bindings([("x", 2.0), ("a", 3.0)]);
/// assert_eq!(b.len(), 2);
/// ```
pub fn bindings<I, K, V>(pairs: I) -> Bindings
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: IntoNumerical,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into_numerical()))
        .collect()
}

/// Shape two arrays broadcast to, following numpy rules (trailing axes are
/// aligned; an axis of length 1 stretches).
pub fn broadcast_shape(left: &[usize], right: &[usize]) -> Option<Vec<usize>> {
    let ndim = left.len().max(right.len());
    let mut shape = Vec::with_capacity(ndim);

    for axis in 0..ndim {
        let l = axis
            .checked_sub(ndim - left.len())
            .map_or(1, |i| left[i]);
        let r = axis
            .checked_sub(ndim - right.len())
            .map_or(1, |i| right[i]);

        let len = if l == r || r == 1 {
            l
        } else if l == 1 {
            r
        } else {
            return None;
        };
        shape.push(len);
    }

    Some(shape)
}

/// Apply `f` element-wise to two broadcast-compatible arrays.
pub fn zip_with<F>(
    left: &Numerical,
    right: &Numerical,
    f: F,
) -> Result<Numerical, BroadcastError>
where
    F: Fn(f64, f64) -> f64,
{
    let error = || BroadcastError {
        left: left.shape().to_vec(),
        right: right.shape().to_vec(),
    };

    let shape = broadcast_shape(left.shape(), right.shape()).ok_or_else(error)?;
    let l = left.broadcast(IxDyn(&shape)).ok_or_else(error)?;
    let r = right.broadcast(IxDyn(&shape)).ok_or_else(error)?;

    Ok(Zip::from(&l).and(&r).map_collect(|&a, &b| f(a, b)))
}

/// Element-wise reduction of several arrays, broadcasting as it goes.
pub fn fold_with<F>(values: &[Numerical], f: F) -> Result<Option<Numerical>, BroadcastError>
where
    F: Fn(f64, f64) -> f64,
{
    let mut iter = values.iter();
    let mut acc = match iter.next() {
        Some(first) => first.clone(),
        None => return Ok(None),
    };
    for value in iter {
        acc = zip_with(&acc, value, &f)?;
    }
    Ok(Some(acc))
}

/// Reshape a flat run of numbers; an empty shape yields a scalar.
pub(crate) fn from_shape(shape: &[usize], data: Vec<f64>) -> Option<Numerical> {
    Array::from_shape_vec(IxDyn(shape), data).ok()
}
