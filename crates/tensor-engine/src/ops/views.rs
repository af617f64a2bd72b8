// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Zero-copy axis transforms and the slicing helpers built on them.
//!
//! Every method here returns views sharing the receiver's storage, except
//! [`Tensor::t`], [`Tensor::repeat`] and the copying fallback of
//! [`Tensor::take`].

use crate::Tensor;
use tensor_core::{AskOrder, Scalar, Shape, StrideLayout, TensorError};

impl<T: Scalar> Tensor<T> {
    // ── Axis transforms ────────────────────────────────────────

    /// Drops every unit axis.
    pub fn squeeze(&self) -> Tensor<T> {
        self.view(self.layout().squeeze())
    }

    /// Drops `axis` when its extent is 1.
    pub fn squeeze_axis(&self, axis: usize) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout().squeeze_axis(axis)?))
    }

    /// Inserts a unit axis at `axis`.
    pub fn unsqueeze(&self, axis: usize) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout().unsqueeze(axis)?))
    }

    pub fn move_axis(&self, src: usize, dst: usize) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout().move_axis(src, dst)?))
    }

    pub fn swap_axis(&self, a: usize, b: usize) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout().swap_axis(a, b)?))
    }

    /// New axis `i` is old axis `perm[i]`.
    pub fn permute(&self, perm: &[usize]) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout().permute(perm)?))
    }

    /// Transposed view (all axes reversed).
    pub fn t_(&self) -> Tensor<T> {
        self.view(self.layout().revert())
    }

    /// Transposed copy stored in `ask` order.
    pub fn t(&self, ask: AskOrder) -> Result<Tensor<T>, TensorError> {
        self.t_().copy(ask)
    }

    // ── Slicing ────────────────────────────────────────────────

    pub fn narrow(
        &self,
        axis: usize,
        keepdim: bool,
        start: usize,
        end: usize,
    ) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout().narrow(axis, keepdim, start, end)?))
    }

    pub fn narrow_all(
        &self,
        keepdim: bool,
        starts: &[usize],
        ends: &[usize],
    ) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout().narrow_all(keepdim, starts, ends)?))
    }

    /// Splits `axis` into segments starting at each of `indexes`.
    ///
    /// Segment `i` covers `[indexes[i], indexes[i + 1])`; the last one runs to
    /// the end of the axis.
    pub fn split(
        &self,
        axis: usize,
        keepdim: bool,
        indexes: &[usize],
    ) -> Result<Vec<Tensor<T>>, TensorError> {
        let dim = self.axis_dim("split", axis)?;
        segments(indexes, dim)
            .map(|(start, end)| self.narrow(axis, keepdim, start, end))
            .collect()
    }

    /// Splits every axis at once; `indexes[a]` holds the segment starts of
    /// axis `a`. Blocks are listed with the last axis varying fastest.
    pub fn split_all(
        &self,
        keepdim: bool,
        indexes: &[Vec<usize>],
    ) -> Result<Vec<Tensor<T>>, TensorError> {
        let rank = self.rank();
        if indexes.len() != rank {
            return Err(TensorError::invalid(
                "split_all",
                format!("{} index lists given for rank {rank}", indexes.len()),
            ));
        }
        let ranges: Vec<Vec<(usize, usize)>> = indexes
            .iter()
            .zip(self.shape().dims())
            .map(|(idx, &dim)| segments(idx, dim).collect())
            .collect();
        if ranges.iter().any(Vec::is_empty) {
            return Ok(Vec::new());
        }

        let total: usize = ranges.iter().map(Vec::len).product();
        let mut out = Vec::with_capacity(total);
        let mut cursor = vec![0usize; rank];
        let mut starts = vec![0usize; rank];
        let mut ends = vec![0usize; rank];
        for _ in 0..total {
            for axis in 0..rank {
                (starts[axis], ends[axis]) = ranges[axis][cursor[axis]];
            }
            out.push(self.narrow_all(keepdim, &starts, &ends)?);
            for axis in (0..rank).rev() {
                cursor[axis] += 1;
                if cursor[axis] < ranges[axis].len() {
                    break;
                }
                cursor[axis] = 0;
            }
        }
        Ok(out)
    }

    /// Splits `axis` into pieces of `step` elements; the last may be shorter.
    pub fn chunk(
        &self,
        axis: usize,
        keepdim: bool,
        step: usize,
    ) -> Result<Vec<Tensor<T>>, TensorError> {
        let dim = self.axis_dim("chunk", axis)?;
        if step == 0 {
            return Err(TensorError::invalid("chunk", "step must be positive"));
        }
        let indexes: Vec<usize> = (0..dim).step_by(step).collect();
        self.split(axis, keepdim, &indexes)
    }

    /// Chunks every axis; `steps[a]` is the piece length along axis `a`.
    pub fn chunk_all(
        &self,
        keepdim: bool,
        steps: &[usize],
    ) -> Result<Vec<Tensor<T>>, TensorError> {
        if steps.len() != self.rank() {
            return Err(TensorError::invalid(
                "chunk_all",
                format!("{} steps given for rank {}", steps.len(), self.rank()),
            ));
        }
        if steps.contains(&0) {
            return Err(TensorError::invalid("chunk_all", "steps must be positive"));
        }
        let indexes: Vec<Vec<usize>> = steps
            .iter()
            .zip(self.shape().dims())
            .map(|(&step, &dim)| (0..dim).step_by(step).collect())
            .collect();
        self.split_all(keepdim, &indexes)
    }

    // ── Selection ──────────────────────────────────────────────

    /// Selects `indices` along `axis`.
    ///
    /// A single index or a strictly increasing arithmetic progression is
    /// served as a view. Any other selection is copied, in the order asked,
    /// into a new tensor stored in `ask` order.
    pub fn take(
        &self,
        ask: AskOrder,
        axis: usize,
        indices: &[usize],
    ) -> Result<Tensor<T>, TensorError> {
        let dim = self.axis_dim("take", axis)?;
        let (&first, rest) = indices
            .split_first()
            .ok_or_else(|| TensorError::invalid("take", "no indices given"))?;
        if let Some(&index) = indices.iter().find(|&&i| i >= dim) {
            return Err(TensorError::IndexOutOfRange { axis, index, dim });
        }
        if rest.is_empty() {
            return self.narrow(axis, true, first, first + 1);
        }

        let step = rest[0].saturating_sub(first);
        let progression = rest[0] > first
            && indices.windows(2).all(|w| w[1] > w[0] && w[1] - w[0] == step);
        if progression {
            let layout = self.layout();
            let mut dims = layout.dims().to_vec();
            let mut strides = layout.strides().to_vec();
            dims[axis] = indices.len();
            let offset = layout.offset() + first * strides[axis];
            strides[axis] *= step;
            return Ok(self.view(StrideLayout::of(Shape::new(dims), offset, strides)?));
        }

        let slices = indices
            .iter()
            .map(|&i| self.narrow(axis, true, i, i + 1))
            .collect::<Result<Vec<_>, _>>()?;
        self.engine().concat(ask, axis, &slices)
    }

    /// [`take`](Self::take), dropping `axis` when a single index is taken.
    pub fn takesq(
        &self,
        ask: AskOrder,
        axis: usize,
        indices: &[usize],
    ) -> Result<Tensor<T>, TensorError> {
        self.take(ask, axis, indices)?.squeeze_axis(axis)
    }

    /// Takes every position of `axis` not listed in `indices`.
    pub fn remove(
        &self,
        ask: AskOrder,
        axis: usize,
        indices: &[usize],
    ) -> Result<Tensor<T>, TensorError> {
        let dim = self.axis_dim("remove", axis)?;
        let mut keep = vec![true; dim];
        for &index in indices {
            let slot = keep
                .get_mut(index)
                .ok_or(TensorError::IndexOutOfRange { axis, index, dim })?;
            *slot = false;
        }
        let kept: Vec<usize> = (0..dim).filter(|&i| keep[i]).collect();
        self.take(ask, axis, &kept)
    }

    /// [`remove`](Self::remove), dropping `axis` when one position remains.
    pub fn removesq(
        &self,
        ask: AskOrder,
        axis: usize,
        indices: &[usize],
    ) -> Result<Tensor<T>, TensorError> {
        self.remove(ask, axis, indices)?.squeeze_axis(axis)
    }

    /// `count` copies of this tensor, stacked along a new `axis` or
    /// concatenated along an existing one. Stored in the engine default order.
    pub fn repeat(&self, axis: usize, count: usize, stack: bool) -> Result<Tensor<T>, TensorError> {
        let copies = vec![self.clone(); count];
        let ask = AskOrder::from(self.engine().default_order());
        if stack {
            self.engine().stack(ask, axis, &copies)
        } else {
            self.engine().concat(ask, axis, &copies)
        }
    }

    fn axis_dim(&self, op: &'static str, axis: usize) -> Result<usize, TensorError> {
        self.dim(axis).ok_or_else(|| {
            TensorError::invalid(
                op,
                format!("axis {axis} is out of bounds for rank {}", self.rank()),
            )
        })
    }
}

/// `[start, end)` pairs of consecutive split points, the last one closed by `dim`.
fn segments(indexes: &[usize], dim: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    indexes
        .iter()
        .enumerate()
        .map(move |(i, &start)| (start, indexes.get(i + 1).copied().unwrap_or(dim)))
}

#[cfg(test)]
mod tests {
    use crate::{Engine, EngineConfig};
    use tensor_core::{AskOrder, Shape, TensorError};

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            cpu_threads: Some(2),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_transpose_view_aliases() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(2, 3), AskOrder::RowMajor);
        let tt = t.t_();
        assert_eq!(tt.shape(), &Shape::matrix(3, 2));
        assert!(tt.shares_storage(&t));
        tt.set(&[2, 1], -1.0).unwrap();
        assert_eq!(t.get(&[1, 2]).unwrap(), -1.0);

        let copied = t.t(AskOrder::RowMajor).unwrap();
        assert!(!copied.shares_storage(&t));
        assert!(copied.layout().is_c_ordered());
        assert_eq!(copied.to_vec(AskOrder::RowMajor), tt.to_vec(AskOrder::RowMajor));
    }

    #[test]
    fn test_squeeze_unsqueeze() {
        let e = engine();
        let t = e.zeros::<f32>(Shape::new(vec![1, 3, 1]), AskOrder::RowMajor);
        assert_eq!(t.squeeze().shape(), &Shape::vector(3));
        assert_eq!(t.squeeze_axis(2).unwrap().shape(), &Shape::matrix(1, 3));
        assert_eq!(t.squeeze_axis(1).unwrap().shape(), t.shape());
        let u = t.squeeze().unsqueeze(0).unwrap();
        assert_eq!(u.shape(), &Shape::matrix(1, 3));
        assert!(t.unsqueeze(4).is_err());
    }

    #[test]
    fn test_move_axis_matches_swaps() {
        let e = engine();
        let t = e.seq::<f64>(Shape::new(vec![2, 3, 4]), AskOrder::RowMajor);
        let moved = t.move_axis(0, 2).unwrap();
        let swapped = t.swap_axis(0, 1).unwrap().swap_axis(1, 2).unwrap();
        assert_eq!(moved.shape(), &Shape::new(vec![3, 4, 2]));
        assert_eq!(moved.layout(), swapped.layout());
        let permuted = t.permute(&[1, 2, 0]).unwrap();
        assert_eq!(permuted.layout(), moved.layout());
    }

    #[test]
    fn test_split_segments() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(5, 2), AskOrder::RowMajor);
        let parts = t.split(0, true, &[0, 2, 3]).unwrap();
        let dims: Vec<usize> = parts.iter().map(|p| p.layout().dim(0)).collect();
        assert_eq!(dims, vec![2, 1, 2]);
        assert_eq!(parts[2].get(&[0, 0]).unwrap(), 6.0);

        let squeezed = t.split(0, false, &[0, 2, 3]).unwrap();
        assert_eq!(squeezed[1].shape(), &Shape::vector(2));
        assert!(t.split(2, true, &[0]).is_err());
    }

    #[test]
    fn test_split_all_last_axis_fastest() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(4, 4), AskOrder::RowMajor);
        let blocks = t.split_all(true, &[vec![0, 2], vec![0, 1]]).unwrap();
        assert_eq!(blocks.len(), 4);
        let firsts: Vec<f64> = blocks.iter().map(|b| b.get(&[0, 0]).unwrap()).collect();
        assert_eq!(firsts, vec![0.0, 1.0, 8.0, 9.0]);
        assert_eq!(blocks[1].shape(), &Shape::matrix(2, 3));
        assert!(t.split_all(true, &[vec![0]]).is_err());
    }

    #[test]
    fn test_chunk() {
        let e = engine();
        let t = e.seq::<f64>(Shape::vector(7), AskOrder::RowMajor);
        let pieces = t.chunk(0, true, 3).unwrap();
        let sizes: Vec<usize> = pieces.iter().map(|p| p.size()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert!(matches!(
            t.chunk(0, true, 0),
            Err(TensorError::InvalidArgument { op: "chunk", .. })
        ));

        let m = e.seq::<f64>(Shape::matrix(3, 4), AskOrder::RowMajor);
        let tiles = m.chunk_all(true, &[2, 2]).unwrap();
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[3].shape(), &Shape::matrix(1, 2));
    }

    #[test]
    fn test_take_progression_is_view() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(6, 2), AskOrder::RowMajor);
        let taken = t.take(AskOrder::RowMajor, 0, &[1, 3, 5]).unwrap();
        assert!(taken.shares_storage(&t));
        assert_eq!(taken.shape(), &Shape::matrix(3, 2));
        assert_eq!(
            taken.to_vec(AskOrder::RowMajor),
            vec![2.0, 3.0, 6.0, 7.0, 10.0, 11.0]
        );
    }

    #[test]
    fn test_take_irregular_copies_in_order() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(2, 4), AskOrder::RowMajor);
        let taken = t.take(AskOrder::ColMajor, 1, &[3, 0, 3]).unwrap();
        assert!(!taken.shares_storage(&t));
        assert!(taken.layout().is_f_ordered());
        assert_eq!(
            taken.to_vec(AskOrder::RowMajor),
            vec![3.0, 0.0, 3.0, 7.0, 4.0, 7.0]
        );
    }

    #[test]
    fn test_take_errors() {
        let e = engine();
        let t = e.zeros::<f64>(Shape::matrix(2, 2), AskOrder::RowMajor);
        assert!(matches!(
            t.take(AskOrder::Storage, 0, &[]),
            Err(TensorError::InvalidArgument { .. })
        ));
        assert!(matches!(
            t.take(AskOrder::Storage, 1, &[0, 2]),
            Err(TensorError::IndexOutOfRange { axis: 1, index: 2, dim: 2 })
        ));
        assert!(t.take(AskOrder::Storage, 2, &[0]).is_err());
    }

    #[test]
    fn test_takesq_and_remove() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(3, 3), AskOrder::RowMajor);
        let row = t.takesq(AskOrder::Storage, 0, &[1]).unwrap();
        assert_eq!(row.shape(), &Shape::vector(3));
        assert_eq!(row.to_vec(AskOrder::RowMajor), vec![3.0, 4.0, 5.0]);

        let kept = t.remove(AskOrder::RowMajor, 1, &[1]).unwrap();
        assert!(kept.shares_storage(&t));
        assert_eq!(kept.to_vec(AskOrder::RowMajor), vec![0.0, 2.0, 3.0, 5.0, 6.0, 8.0]);

        let col = t.removesq(AskOrder::RowMajor, 1, &[0, 2]).unwrap();
        assert_eq!(col.to_vec(AskOrder::RowMajor), vec![1.0, 4.0, 7.0]);
        assert!(t.remove(AskOrder::RowMajor, 0, &[0, 1, 2]).is_err());
        assert!(t.remove(AskOrder::RowMajor, 0, &[3]).is_err());
    }

    #[test]
    fn test_repeat() {
        let e = engine();
        let t = e.seq::<f64>(Shape::vector(2), AskOrder::RowMajor);
        let stacked = t.repeat(0, 3, true).unwrap();
        assert_eq!(stacked.shape(), &Shape::matrix(3, 2));
        let joined = t.repeat(0, 3, false).unwrap();
        assert_eq!(
            joined.to_vec(AskOrder::RowMajor),
            vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]
        );
    }
}
