// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor operators, each module adding an `impl Tensor<T>` block.

mod copy;
mod dot;
mod elementwise;
mod matmul;
mod reshape;
mod views;

pub use elementwise::{BinaryOp, UnaryOp};

use crate::Tensor;
use tensor_core::Scalar;

/// Runs `f` over the buffers of both operands under read guards.
///
/// Operands sharing one buffer get a single guard, so a queued writer cannot
/// wedge between two reads of the same lock. Distinct buffers are locked in
/// address order.
pub(crate) fn with_operands<T: Scalar, R>(
    a: &Tensor<T>,
    b: &Tensor<T>,
    f: impl FnOnce(&[T], &[T]) -> R,
) -> R {
    if a.shares_storage(b) {
        let guard = a.storage().read();
        return f(guard.as_slice(), guard.as_slice());
    }
    let (a_guard, b_guard) = a.storage().read_with(b.storage());
    f(a_guard.as_slice(), b_guard.as_slice())
}
