// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element copies between tensors of one shape.
//!
//! [`Tensor::copy`] allocates a dense buffer and fills it with
//! [`Tensor::copy_to`], which picks one of three paths per call:
//! - **same layout**: the source is ordered and the destination contiguous in
//!   the target order, so source runs are written one after another;
//! - **tiled**: a large copy is cut into cache-sized blocks, one pool task
//!   per block;
//! - **direct**: matched pointers are walked on the caller's thread.

use crate::blocking::copy_slices;
use crate::{DisjointWriter, Tensor};
use tensor_core::{
    AskOrder, Order, PointerIterator, Scalar, StrideChunkDescriptor, StrideLayout, TensorError,
};

impl<T: Scalar> Tensor<T> {
    /// A dense copy stored in `ask` order (`Storage` keeps the source's fast
    /// order, else uses the engine default).
    pub fn copy(&self, ask: AskOrder) -> Result<Tensor<T>, TensorError> {
        let order = self.resolve_order(ask);
        let layout = StrideLayout::of_dense(self.shape().clone(), 0, order);
        let data = vec![T::zero(); self.size()];
        let out = Tensor::from_parts(self.engine().clone(), layout, data);
        self.copy_to(&out, AskOrder::from(order))?;
        Ok(out)
    }

    /// Writes every element into the same logical position of `dst`.
    ///
    /// `ask` picks the order both tensors are walked in. Shapes must match.
    /// When `dst` shares this tensor's buffer the source values are read
    /// before any is written.
    pub fn copy_to(&self, dst: &Tensor<T>, ask: AskOrder) -> Result<(), TensorError> {
        if self.shape() != dst.shape() {
            return Err(TensorError::ShapeMismatch {
                op: "copy_to",
                lhs: self.shape().clone(),
                rhs: dst.shape().clone(),
            });
        }
        let order = self.resolve_order(ask);
        let walk = AskOrder::from(order);
        let size = self.size();
        if size == 0 {
            return Ok(());
        }

        if self.shares_storage(dst) {
            tracing::debug!("copy: {size} elements, aliased ({order})");
            let values = self.to_vec(walk);
            let mut data = dst.storage().write();
            for (q, v) in dst.ptr_iterator(walk).zip(values) {
                data[q] = v;
            }
            return Ok(());
        }

        let limit = self.engine().blocking().copy_limit::<T>();
        let (mut out, src) = dst.storage().write_with(self.storage());
        if self.layout().is_ordered(order) && is_contiguous(dst.layout(), order) {
            tracing::debug!("copy: {size} elements, same layout ({order})");
            let start = dst.layout().offset();
            self.copy_runs(src.as_slice(), order, &mut out[start..start + size]);
        } else if self.engine().parallel_copy() && size > limit && is_injective(dst.layout()) {
            tracing::debug!("copy: {size} elements, tiled to {limit} ({order})");
            self.copy_tiled(src.as_slice(), dst.layout(), out.as_mut_slice(), order, limit)?;
        } else {
            tracing::debug!("copy: {size} elements, direct ({order})");
            for (p, q) in self.ptr_iterator(walk).zip(dst.ptr_iterator(walk)) {
                out[q] = src[p];
            }
        }
        Ok(())
    }

    /// Writes every run of this tensor in `order` into `out`, back to back.
    fn copy_runs(&self, src: &[T], order: Order, out: &mut [T]) {
        let descriptor = StrideChunkDescriptor::of(self.layout(), AskOrder::from(order));
        let step = descriptor.loop_step();
        let len = descriptor.loop_size();
        let lanes = T::LANES;
        let table = descriptor.lane_indexes(lanes);
        let full = len - len % lanes;

        let mut last = 0;
        for &start in descriptor.chunk_offsets() {
            if step == 1 {
                out[last..last + len].copy_from_slice(&src[start..start + len]);
                last += len;
                continue;
            }
            let mut i = 0;
            while i < full {
                let base = start + i * step;
                for (slot, &ix) in out[last..last + lanes].iter_mut().zip(&table) {
                    *slot = src[base + ix];
                }
                last += lanes;
                i += lanes;
            }
            for i in full..len {
                out[last] = src[start + i * step];
                last += 1;
            }
        }
    }

    /// Copies block by block on the worker pool.
    fn copy_tiled(
        &self,
        src: &[T],
        dst_layout: &StrideLayout,
        out: &mut [T],
        order: Order,
        limit: usize,
    ) -> Result<(), TensorError> {
        let dims = self.shape().dims();
        let slices = copy_slices(dims, limit);
        // pairs are walked in the source's fast order so reads stay sequential
        let walk = AskOrder::from(self.layout().storage_fast_order().unwrap_or(order));

        let writer = DisjointWriter::new(out);
        let writer = &writer;
        let tasks = block_grid(dims, &slices)
            .iter()
            .map(|(starts, ends)| {
                let src_block = self.layout().narrow_all(true, starts, ends)?;
                let dst_block = dst_layout.narrow_all(true, starts, ends)?;
                Ok(move || {
                    let pairs = PointerIterator::new(&src_block, walk)
                        .zip(PointerIterator::new(&dst_block, walk));
                    for (p, q) in pairs {
                        // SAFETY: blocks partition the index space and the
                        // destination layout maps indices one to one.
                        unsafe { writer.write(q, src[p]) };
                    }
                    Ok::<(), TensorError>(())
                })
            })
            .collect::<Result<Vec<_>, TensorError>>()?;
        self.engine().pool().run_all("copy", tasks)
    }
}

/// Whether `layout` covers `offset..offset + size` exactly, in `order`.
fn is_contiguous(layout: &StrideLayout, order: Order) -> bool {
    if !layout.is_ordered(order) {
        return false;
    }
    match (order, layout.rank()) {
        (_, 0) => true,
        (Order::RowMajor, rank) => layout.stride(rank - 1) == 1,
        (Order::ColMajor, _) => layout.stride(0) == 1,
    }
}

/// Whether no two indices of `layout` share a storage position.
///
/// Holds when, taking non-unit axes by increasing stride, each stride is at
/// least the span of the axes before it.
fn is_injective(layout: &StrideLayout) -> bool {
    let mut axes: Vec<(usize, usize)> = layout
        .strides()
        .iter()
        .copied()
        .zip(layout.dims().iter().copied())
        .filter(|&(_, dim)| dim > 1)
        .collect();
    axes.sort_unstable();
    let mut span = 1;
    for (stride, dim) in axes {
        if stride < span {
            return false;
        }
        span = stride * dim;
    }
    true
}

/// `(starts, ends)` of every block of a grid with block edges `slices`,
/// last axis varying fastest.
fn block_grid(dims: &[usize], slices: &[usize]) -> Vec<(Vec<usize>, Vec<usize>)> {
    let counts: Vec<usize> = dims
        .iter()
        .zip(slices)
        .map(|(&d, &s)| d.div_ceil(s))
        .collect();
    let total: usize = counts.iter().product();
    let mut cursor = vec![0usize; dims.len()];
    let mut blocks = Vec::with_capacity(total);
    for _ in 0..total {
        let starts: Vec<usize> = cursor.iter().zip(slices).map(|(&c, &s)| c * s).collect();
        let ends: Vec<usize> = starts
            .iter()
            .zip(slices)
            .zip(dims)
            .map(|((&start, &s), &d)| (start + s).min(d))
            .collect();
        blocks.push((starts, ends));
        for axis in (0..dims.len()).rev() {
            cursor[axis] += 1;
            if cursor[axis] < counts[axis] {
                break;
            }
            cursor[axis] = 0;
        }
    }
    blocks
}
