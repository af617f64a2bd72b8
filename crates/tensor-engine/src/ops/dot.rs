// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Vector dot products.

use super::with_operands;
use crate::Tensor;
use tensor_core::{Scalar, TensorError, MAX_LANES};

/// Strided dot product of `n` elements.
///
/// Products are accumulated into `T::LANES` partial sums, reduced in lane
/// order, then the tail is added one element at a time. The summation order
/// depends only on `n`, so equal inputs give bit-identical results.
pub(crate) fn dot_kernel<T: Scalar>(
    a: &[T],
    a_offset: usize,
    a_step: usize,
    b: &[T],
    b_offset: usize,
    b_step: usize,
    n: usize,
) -> T {
    let lanes = T::LANES;
    let full = n - n % lanes;
    let mut acc = [T::zero(); MAX_LANES];
    let mut i = 0;
    while i < full {
        for (l, slot) in acc[..lanes].iter_mut().enumerate() {
            *slot += a[a_offset + (i + l) * a_step] * b[b_offset + (i + l) * b_step];
        }
        i += lanes;
    }
    let mut sum = T::zero();
    for &partial in &acc[..lanes] {
        sum += partial;
    }
    for i in full..n {
        sum += a[a_offset + i * a_step] * b[b_offset + i * b_step];
    }
    sum
}

impl<T: Scalar> Tensor<T> {
    /// Dot product of two vectors of equal length. Empty vectors give zero.
    pub fn vdot(&self, other: &Tensor<T>) -> Result<T, TensorError> {
        let n = self.check_vector_pair("vdot", other)?;
        Ok(self.dot_span(other, 0, n))
    }

    /// Dot product restricted to positions `[start, end)`.
    pub fn vdot_range(
        &self,
        other: &Tensor<T>,
        start: usize,
        end: usize,
    ) -> Result<T, TensorError> {
        let n = self.check_vector_pair("vdot_range", other)?;
        if start >= end || end > n {
            return Err(TensorError::invalid(
                "vdot_range",
                format!("range [{start}, {end}) is invalid for length {n}"),
            ));
        }
        Ok(self.dot_span(other, start, end))
    }

    fn check_vector_pair(&self, op: &'static str, other: &Tensor<T>) -> Result<usize, TensorError> {
        if self.rank() != 1 || other.rank() != 1 || self.shape() != other.shape() {
            return Err(TensorError::ShapeMismatch {
                op,
                lhs: self.shape().clone(),
                rhs: other.shape().clone(),
            });
        }
        Ok(self.layout().dim(0))
    }

    fn dot_span(&self, other: &Tensor<T>, start: usize, end: usize) -> T {
        if start >= end {
            return T::zero();
        }
        let (a, b) = (self.layout(), other.layout());
        let (a_step, b_step) = (a.stride(0), b.stride(0));
        with_operands(self, other, |a_data, b_data| {
            dot_kernel(
                a_data,
                a.offset() + start * a_step,
                a_step,
                b_data,
                b.offset() + start * b_step,
                b_step,
                end - start,
            )
        })
    }
}
