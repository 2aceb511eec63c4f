//! Conversion between named, shaped values and the flat vector an optimizer
//! works on.
//!
//! Values are laid out one after another in the order given, each one
//! flattened in row-major order. [`unpack`] reverses [`pack`] exactly.

use ndarray::{Array1, ArrayView1};

use crate::error::{Result, SmitFitError};
use crate::numeric::{from_shape, Numerical};

/// Ordered names and shapes of packed values.
pub type Shapes = Vec<(String, Vec<usize>)>;

/// Number of elements in an array of the given shape. A scalar (`[]`) has one.
pub fn shape_size(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Concatenate values into one flat vector.
///
/// ```
/// use smitfit::numeric::scalar;
/// use smitfit::parameters::pack;
/// use ndarray::array;
///
/// let values = [scalar(1.0), array![2.0, 3.0].into_dyn()];
/// assert_eq!(pack(&values), array![1.0, 2.0, 3.0]);
/// ```
pub fn pack<'a, I>(values: I) -> Array1<f64>
where
    I: IntoIterator<Item = &'a Numerical>,
{
    values
        .into_iter()
        .flat_map(|value| value.iter().copied())
        .collect()
}

/// Split a flat vector back into named values with the given shapes.
///
/// Fails with [`SmitFitError::ShapeMismatch`] if the vector length is not the
/// total size of `shapes`.
pub fn unpack(
    flat: ArrayView1<'_, f64>,
    shapes: &[(String, Vec<usize>)],
) -> Result<Vec<(String, Numerical)>> {
    let expected: usize = shapes.iter().map(|(_, shape)| shape_size(shape)).sum();
    if flat.len() != expected {
        return Err(SmitFitError::ShapeMismatch(format!(
            "expected {} values, got {}",
            expected,
            flat.len()
        )));
    }

    let mut offset = 0;
    let mut values = Vec::with_capacity(shapes.len());
    for (name, shape) in shapes {
        let size = shape_size(shape);
        let data = flat.slice(ndarray::s![offset..offset + size]).to_vec();
        let value = from_shape(shape, data).ok_or_else(|| {
            SmitFitError::ShapeMismatch(format!("cannot reshape '{}' to {:?}", name, shape))
        })?;
        values.push((name.clone(), value));
        offset += size;
    }

    Ok(values)
}
