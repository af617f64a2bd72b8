// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Matrix-vector and tiled parallel matrix-matrix products.
//!
//! Rows of the left operand and columns of the right operand are addressed as
//! `(offset, step)` pairs into the existing buffers; nothing is copied before
//! the multiply.

use super::dot::dot_kernel;
use super::with_operands;
use crate::{DisjointWriter, Tensor};
use tensor_core::{AskOrder, Order, Scalar, Shape, StrideLayout, TensorError};

// ── Tiling ─────────────────────────────────────────────────────

/// One square-ish block of output cells owned by a single task.
#[derive(Debug, Clone, Copy)]
struct Tile {
    rows: (usize, usize),
    cols: (usize, usize),
}

fn tiles(m: usize, n: usize, edge: usize) -> Vec<Tile> {
    let mut out = Vec::with_capacity(m.div_ceil(edge) * n.div_ceil(edge));
    for r in (0..m).step_by(edge) {
        for c in (0..n).step_by(edge) {
            out.push(Tile {
                rows: (r, (r + edge).min(m)),
                cols: (c, (c + edge).min(n)),
            });
        }
    }
    out
}

/// Strided view of one rank-2 operand: `offset + i·s0 + j·s1`.
#[derive(Debug, Clone, Copy)]
struct Operand {
    offset: usize,
    s0: usize,
    s1: usize,
}

impl Operand {
    fn of(layout: &StrideLayout) -> Self {
        Self {
            offset: layout.offset(),
            s0: layout.stride(0),
            s1: layout.stride(1),
        }
    }
}

impl<T: Scalar> Tensor<T> {
    /// Matrix-vector product, returned as a vector.
    pub fn mv(&self, vector: &Tensor<T>) -> Result<Tensor<T>, TensorError> {
        if self.rank() != 2 || vector.rank() != 1 || self.dim(1) != vector.dim(0) {
            return Err(TensorError::ShapeMismatch {
                op: "mv",
                lhs: self.shape().clone(),
                rhs: vector.shape().clone(),
            });
        }
        let (rows, k) = (self.layout().dim(0), self.layout().dim(1));
        let a = Operand::of(self.layout());
        let (v_offset, v_step) = (vector.layout().offset(), vector.layout().stride(0));
        let data: Vec<T> = with_operands(self, vector, |a_data, v_data| {
            (0..rows)
                .map(|i| dot_kernel(a_data, a.offset + i * a.s0, a.s1, v_data, v_offset, v_step, k))
                .collect()
        });
        let layout = StrideLayout::of_dense(Shape::vector(rows), 0, self.engine().default_order());
        Ok(Tensor::from_parts(self.engine().clone(), layout, data))
    }

    /// Matrix product stored in `ask` order, which must be a total order.
    ///
    /// The output is cut into tiles of `inner_tile × inner_tile` cells and each
    /// tile is computed by one pool task. A task walks the reduction axis in
    /// `vector_chunk` slices and adds one dot-kernel partial sum per cell and
    /// slice, so every cell is summed in the same order whatever the thread
    /// count.
    pub fn mm(&self, other: &Tensor<T>, ask: AskOrder) -> Result<Tensor<T>, TensorError> {
        if !self.shape().is_matmul_compatible(other.shape()) {
            return Err(TensorError::ShapeMismatch {
                op: "mm",
                lhs: self.shape().clone(),
                rhs: other.shape().clone(),
            });
        }
        let order: Order = ask.require_total("mm")?;
        let (m, k, n) = (self.layout().dim(0), self.layout().dim(1), other.layout().dim(1));
        let out_layout = StrideLayout::of_dense(Shape::matrix(m, n), 0, order);
        let mut out = vec![T::zero(); m * n];
        if m * n == 0 {
            return Ok(Tensor::from_parts(self.engine().clone(), out_layout, out));
        }

        let blocking = self.engine().blocking().matmul::<T>();
        let edge = blocking.inner_tile;
        let vector_chunk = blocking.vector_chunk;
        let grid = tiles(m, n, edge);
        tracing::debug!(
            "mm: [{m}, {k}] x [{k}, {n}] in {} tiles of {edge}, reduction chunk {vector_chunk}",
            grid.len()
        );

        let a = Operand::of(self.layout());
        let b = Operand::of(other.layout());
        let dst = Operand::of(&out_layout);
        let engine = self.engine().clone();
        with_operands(self, other, |a_data, b_data| {
            let writer = DisjointWriter::new(&mut out);
            let writer = &writer;
            let tasks: Vec<_> = grid
                .into_iter()
                .map(|tile| {
                    move || {
                        let (r0, r1) = tile.rows;
                        let (c0, c1) = tile.cols;
                        let width = c1 - c0;
                        let mut acc = vec![T::zero(); (r1 - r0) * width];
                        let mut k0 = 0;
                        while k0 < k {
                            let len = vector_chunk.min(k - k0);
                            for i in r0..r1 {
                                let row = a.offset + i * a.s0 + k0 * a.s1;
                                for j in c0..c1 {
                                    let col = b.offset + k0 * b.s0 + j * b.s1;
                                    acc[(i - r0) * width + (j - c0)] +=
                                        dot_kernel(a_data, row, a.s1, b_data, col, b.s0, len);
                                }
                            }
                            k0 += len;
                        }
                        for i in r0..r1 {
                            for j in c0..c1 {
                                let value = acc[(i - r0) * width + (j - c0)];
                                let q = dst.offset + i * dst.s0 + j * dst.s1;
                                // SAFETY: tiles partition the output cells and
                                // the dense output layout maps cells one to one
                                // onto buffer positions below m·n.
                                unsafe { writer.write(q, value) };
                            }
                        }
                        Ok::<(), TensorError>(())
                    }
                })
                .collect();
            engine.pool().run_all("mm", tasks)
        })?;
        Ok(Tensor::from_parts(engine, out_layout, out))
    }
}
