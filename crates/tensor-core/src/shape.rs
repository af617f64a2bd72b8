// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use crate::{Order, TensorError};
use std::fmt;

/// Describes the extents of a tensor's axes.
///
/// Shapes are immutable once created and provide the mapping between
/// multi-indices and linear positions for both total orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.size(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// A scalar shape holds one element; any zero extent gives zero.
    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Number of axes with extent 1.
    pub fn unit_dim_count(&self) -> usize {
        self.dims.iter().filter(|&&d| d == 1).count()
    }

    /// Computes the canonical dense strides for this shape in `order`.
    ///
    /// The stride for dimension `i` is the number of elements to skip
    /// in the flat buffer to advance one step along that dimension.
    pub fn strides(&self, order: Order) -> Vec<usize> {
        let rank = self.dims.len();
        let mut strides = vec![1usize; rank];
        match order {
            Order::RowMajor => {
                for i in (0..rank.saturating_sub(1)).rev() {
                    strides[i] = strides[i + 1] * self.dims[i + 1];
                }
            }
            Order::ColMajor => {
                for i in 1..rank {
                    strides[i] = strides[i - 1] * self.dims[i - 1];
                }
            }
        }
        strides
    }

    /// Linear position of `index` when the shape is traversed in `order`.
    pub fn position(&self, order: Order, index: &[usize]) -> usize {
        self.strides(order)
            .iter()
            .zip(index)
            .map(|(s, i)| s * i)
            .sum()
    }

    /// Multi-index of the element at linear `position` in `order`.
    pub fn index(&self, order: Order, mut position: usize) -> Vec<usize> {
        let mut index = vec![0usize; self.rank()];
        let axes: Box<dyn Iterator<Item = usize>> = match order {
            Order::RowMajor => Box::new((0..self.rank()).rev()),
            Order::ColMajor => Box::new(0..self.rank()),
        };
        for axis in axes {
            let d = self.dims[axis];
            if d == 0 {
                continue;
            }
            index[axis] = position % d;
            position /= d;
        }
        index
    }

    /// Returns `true` if the shapes are compatible for a matrix multiply:
    /// `self` is `[M, K]` and `other` is `[K, N]`.
    pub fn is_matmul_compatible(&self, other: &Shape) -> bool {
        self.rank() == 2 && other.rank() == 2 && self.dims[1] == other.dims[0]
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![2, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[2, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::new(dims.to_vec())
    }
}

/// Signed dimensions, as read from user input; negative extents are rejected.
impl TryFrom<&[i64]> for Shape {
    type Error = TensorError;

    fn try_from(dims: &[i64]) -> Result<Self, Self::Error> {
        dims.iter()
            .enumerate()
            .map(|(axis, &d)| {
                usize::try_from(d).map_err(|_| {
                    TensorError::invalid("shape", format!("dimension {axis} is negative: {d}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Shape::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::scalar();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.size(), 1);
        assert!(s.strides(Order::RowMajor).is_empty());
    }

    #[test]
    fn test_vector_shape() {
        let s = Shape::vector(5);
        assert_eq!(s.rank(), 1);
        assert_eq!(s.size(), 5);
        assert_eq!(s.strides(Order::RowMajor), vec![1]);
        assert_eq!(s.strides(Order::ColMajor), vec![1]);
    }

    #[test]
    fn test_zero_extent() {
        let s = Shape::new(vec![3, 0, 2]);
        assert_eq!(s.size(), 0);
    }

    #[test]
    fn test_3d_strides() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(s.strides(Order::RowMajor), vec![12, 4, 1]);
        assert_eq!(s.strides(Order::ColMajor), vec![1, 2, 6]);
    }

    #[test]
    fn test_position_and_index() {
        let s = Shape::new(vec![2, 3, 4]);
        for order in [Order::RowMajor, Order::ColMajor] {
            for p in 0..s.size() {
                let idx = s.index(order, p);
                assert_eq!(s.position(order, &idx), p);
            }
        }
        assert_eq!(s.index(Order::RowMajor, 5), vec![0, 1, 1]);
        assert_eq!(s.index(Order::ColMajor, 5), vec![1, 2, 0]);
    }

    #[test]
    fn test_unit_dim_count() {
        assert_eq!(Shape::new(vec![1, 3, 1, 2]).unit_dim_count(), 2);
        assert_eq!(Shape::scalar().unit_dim_count(), 0);
    }

    #[test]
    fn test_matmul_compatible() {
        let a = Shape::matrix(3, 4);
        let b = Shape::matrix(4, 5);
        assert!(a.is_matmul_compatible(&b));

        let c = Shape::matrix(5, 5);
        assert!(!a.is_matmul_compatible(&c));
        assert!(!Shape::vector(4).is_matmul_compatible(&b));
    }

    #[test]
    fn test_display() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(format!("{s}"), "[2, 3, 4]");
    }

    #[test]
    fn test_from_conversions() {
        let s1: Shape = vec![2, 3].into();
        let s2: Shape = (&[2, 3][..]).into();
        let s3: Shape = [2, 3].into();
        assert_eq!(s1, s2);
        assert_eq!(s2, s3);
    }

    #[test]
    fn test_negative_dims_rejected() {
        let ok = Shape::try_from(&[2i64, 3][..]).unwrap();
        assert_eq!(ok, Shape::matrix(2, 3));
        let err = Shape::try_from(&[2i64, -1][..]).unwrap_err();
        assert!(matches!(err, TensorError::InvalidArgument { .. }));
    }
}
