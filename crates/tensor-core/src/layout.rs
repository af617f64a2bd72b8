// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Strided layouts over flat storage.
//!
//! A [`StrideLayout`] maps multi-indices of a [`Shape`] to positions in a flat
//! buffer: `pointer(idx) = offset + Σ idx[i]·strides[i]`. Every axis transform
//! (squeeze, narrow, transpose, ...) produces a new layout in O(rank) without
//! touching storage, which is how tensor views are built.

use crate::{AskOrder, Order, Shape, TensorError};
use std::fmt;

/// Offset plus per-axis strides over a flat buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "LayoutParts", into = "LayoutParts")]
pub struct StrideLayout {
    shape: Shape,
    offset: usize,
    strides: Vec<usize>,
    c_ordered: bool,
    f_ordered: bool,
}

/// Wire form: `(dims, offset, strides)`.
type LayoutParts = (Vec<usize>, usize, Vec<usize>);

impl TryFrom<LayoutParts> for StrideLayout {
    type Error = TensorError;

    fn try_from((dims, offset, strides): LayoutParts) -> Result<Self, Self::Error> {
        StrideLayout::of(Shape::new(dims), offset, strides)
    }
}

impl From<StrideLayout> for LayoutParts {
    fn from(layout: StrideLayout) -> Self {
        (layout.shape.dims().to_vec(), layout.offset, layout.strides)
    }
}

fn check_axis(op: &'static str, axis: usize, rank: usize) -> Result<(), TensorError> {
    if axis >= rank {
        return Err(TensorError::invalid(
            op,
            format!("axis {axis} is out of bounds for rank {rank}"),
        ));
    }
    Ok(())
}

impl StrideLayout {
    /// Builds a layout from explicit strides.
    ///
    /// Fails with `InvalidArgument` when `strides.len() != shape.rank()`.
    pub fn of(shape: Shape, offset: usize, strides: Vec<usize>) -> Result<Self, TensorError> {
        if strides.len() != shape.rank() {
            return Err(TensorError::invalid(
                "layout",
                format!(
                    "{} strides given for shape {shape} of rank {}",
                    strides.len(),
                    shape.rank()
                ),
            ));
        }
        Ok(Self::from_parts(shape, offset, strides))
    }

    /// Builds the canonical dense layout of `shape` in `order`.
    pub fn of_dense(shape: Shape, offset: usize, order: Order) -> Self {
        let strides = shape.strides(order);
        Self::from_parts(shape, offset, strides)
    }

    fn from_parts(shape: Shape, offset: usize, strides: Vec<usize>) -> Self {
        let dims = shape.dims();
        let rank = dims.len();
        let c_ordered =
            (0..rank.saturating_sub(1)).all(|i| strides[i] == strides[i + 1] * dims[i + 1]);
        let f_ordered = (1..rank).all(|i| strides[i] == strides[i - 1] * dims[i - 1]);
        Self {
            shape,
            offset,
            strides,
            c_ordered,
            f_ordered,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn size(&self) -> usize {
        self.shape.size()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Extent of `axis`. Panics if the axis is out of bounds.
    pub fn dim(&self, axis: usize) -> usize {
        self.shape.dims()[axis]
    }

    /// Stride of `axis`. Panics if the axis is out of bounds.
    pub fn stride(&self, axis: usize) -> usize {
        self.strides[axis]
    }

    /// Strides match the row-major canonical strides. Rank < 2 is always ordered.
    pub fn is_c_ordered(&self) -> bool {
        self.c_ordered
    }

    /// Strides match the column-major canonical strides. Rank < 2 is always ordered.
    pub fn is_f_ordered(&self) -> bool {
        self.f_ordered
    }

    /// Ordered in either total order and contiguous along the fastest axis.
    pub fn is_dense(&self) -> bool {
        if self.rank() == 0 {
            return true;
        }
        (self.c_ordered && self.strides[self.rank() - 1] == 1)
            || (self.f_ordered && self.strides[0] == 1)
    }

    /// Whether the layout is ordered in `order`.
    pub fn is_ordered(&self, order: Order) -> bool {
        match order {
            Order::RowMajor => self.c_ordered,
            Order::ColMajor => self.f_ordered,
        }
    }

    /// The total order in which the storage is walked with a single affine
    /// step. `None` for unordered layouts and for rank < 2, where every order
    /// is equally fast and the caller's default applies.
    pub fn storage_fast_order(&self) -> Option<Order> {
        if self.rank() < 2 {
            return None;
        }
        if self.f_ordered {
            Some(Order::ColMajor)
        } else if self.c_ordered {
            Some(Order::RowMajor)
        } else {
            None
        }
    }

    /// Storage position of the element at `indices`.
    pub fn pointer(&self, indices: &[usize]) -> Result<usize, TensorError> {
        if indices.len() != self.rank() {
            return Err(TensorError::invalid(
                "pointer",
                format!("{} indices given for rank {}", indices.len(), self.rank()),
            ));
        }
        let mut pointer = self.offset;
        for (axis, (&index, (&dim, &stride))) in indices
            .iter()
            .zip(self.dims().iter().zip(&self.strides))
            .enumerate()
        {
            if index >= dim {
                return Err(TensorError::IndexOutOfRange { axis, index, dim });
            }
            pointer += index * stride;
        }
        Ok(pointer)
    }

    /// Largest storage position addressed by this layout, or `None` when empty.
    pub fn max_pointer(&self) -> Option<usize> {
        if self.size() == 0 {
            return None;
        }
        Some(
            self.offset
                + self
                    .dims()
                    .iter()
                    .zip(&self.strides)
                    .map(|(d, s)| (d - 1) * s)
                    .sum::<usize>(),
        )
    }

    /// Drops every unit axis.
    pub fn squeeze(&self) -> Self {
        if self.shape.unit_dim_count() == 0 {
            return self.clone();
        }
        let (dims, strides): (Vec<_>, Vec<_>) = self
            .dims()
            .iter()
            .zip(&self.strides)
            .filter(|(&d, _)| d != 1)
            .map(|(&d, &s)| (d, s))
            .unzip();
        Self::from_parts(Shape::new(dims), self.offset, strides)
    }

    /// Drops `axis` if its extent is 1, else returns the layout unchanged.
    pub fn squeeze_axis(&self, axis: usize) -> Result<Self, TensorError> {
        check_axis("squeeze", axis, self.rank())?;
        if self.dim(axis) != 1 {
            return Ok(self.clone());
        }
        let mut dims = self.dims().to_vec();
        let mut strides = self.strides.clone();
        dims.remove(axis);
        strides.remove(axis);
        Ok(Self::from_parts(Shape::new(dims), self.offset, strides))
    }

    /// Inserts a unit axis at position `axis` (`axis <= rank`).
    ///
    /// The stride of the new axis never moves the pointer; it is chosen so
    /// the layout keeps its C or F ordering flag.
    pub fn unsqueeze(&self, axis: usize) -> Result<Self, TensorError> {
        let rank = self.rank();
        if axis > rank {
            return Err(TensorError::invalid(
                "unsqueeze",
                format!("axis {axis} is out of bounds for rank {rank}"),
            ));
        }
        let stride = if rank == 0 {
            1
        } else if self.c_ordered {
            if axis < rank {
                self.strides[axis] * self.dim(axis)
            } else {
                self.strides[rank - 1]
            }
        } else if self.f_ordered {
            if axis > 0 {
                self.strides[axis - 1] * self.dim(axis - 1)
            } else {
                self.strides[0]
            }
        } else {
            1
        };
        let mut dims = self.dims().to_vec();
        let mut strides = self.strides.clone();
        dims.insert(axis, 1);
        strides.insert(axis, stride);
        Ok(Self::from_parts(Shape::new(dims), self.offset, strides))
    }

    /// Moves axis `src` to position `dst`, shifting the axes in between.
    pub fn move_axis(&self, src: usize, dst: usize) -> Result<Self, TensorError> {
        check_axis("move_axis", src, self.rank())?;
        check_axis("move_axis", dst, self.rank())?;
        if src == dst {
            return Ok(self.clone());
        }
        let mut dims = self.dims().to_vec();
        let mut strides = self.strides.clone();
        let d = dims.remove(src);
        let s = strides.remove(src);
        dims.insert(dst, d);
        strides.insert(dst, s);
        Ok(Self::from_parts(Shape::new(dims), self.offset, strides))
    }

    /// Exchanges axes `a` and `b`.
    pub fn swap_axis(&self, a: usize, b: usize) -> Result<Self, TensorError> {
        check_axis("swap_axis", a, self.rank())?;
        check_axis("swap_axis", b, self.rank())?;
        let mut dims = self.dims().to_vec();
        let mut strides = self.strides.clone();
        dims.swap(a, b);
        strides.swap(a, b);
        Ok(Self::from_parts(Shape::new(dims), self.offset, strides))
    }

    /// Reverses the axis order (transpose).
    pub fn revert(&self) -> Self {
        let dims: Vec<usize> = self.dims().iter().rev().copied().collect();
        let strides: Vec<usize> = self.strides.iter().rev().copied().collect();
        Self::from_parts(Shape::new(dims), self.offset, strides)
    }

    /// Reorders axes so that new axis `i` is old axis `perm[i]`.
    pub fn permute(&self, perm: &[usize]) -> Result<Self, TensorError> {
        let rank = self.rank();
        if perm.len() != rank {
            return Err(TensorError::invalid(
                "permute",
                format!("{} axes given for rank {rank}", perm.len()),
            ));
        }
        let mut seen = vec![false; rank];
        for &axis in perm {
            if axis >= rank || std::mem::replace(&mut seen[axis], true) {
                return Err(TensorError::invalid(
                    "permute",
                    format!("{perm:?} is not a permutation of 0..{rank}"),
                ));
            }
        }
        let dims = perm.iter().map(|&a| self.dim(a)).collect();
        let strides = perm.iter().map(|&a| self.strides[a]).collect();
        Ok(Self::from_parts(Shape::new(dims), self.offset, strides))
    }

    /// Restricts `axis` to `[start, end)`.
    ///
    /// With `keepdim == false` the axis is dropped when the result has extent 1.
    pub fn narrow(
        &self,
        axis: usize,
        keepdim: bool,
        start: usize,
        end: usize,
    ) -> Result<Self, TensorError> {
        check_axis("narrow", axis, self.rank())?;
        if start > end || end > self.dim(axis) {
            return Err(TensorError::invalid(
                "narrow",
                format!(
                    "range [{start}, {end}) is invalid for axis {axis} with dimension {}",
                    self.dim(axis)
                ),
            ));
        }
        let mut dims = self.dims().to_vec();
        dims[axis] = end - start;
        let offset = self.offset + start * self.strides[axis];
        let narrowed = Self::from_parts(Shape::new(dims), offset, self.strides.clone());
        if keepdim {
            Ok(narrowed)
        } else {
            narrowed.squeeze_axis(axis)
        }
    }

    /// Restricts every axis to `[starts[i], ends[i])`.
    ///
    /// With `keepdim == false` every axis of extent 1 is dropped.
    pub fn narrow_all(
        &self,
        keepdim: bool,
        starts: &[usize],
        ends: &[usize],
    ) -> Result<Self, TensorError> {
        let rank = self.rank();
        if starts.len() != rank || ends.len() != rank {
            return Err(TensorError::invalid(
                "narrow_all",
                format!(
                    "{} starts and {} ends given for rank {rank}",
                    starts.len(),
                    ends.len()
                ),
            ));
        }
        let mut dims = Vec::with_capacity(rank);
        let mut offset = self.offset;
        for axis in 0..rank {
            let (start, end) = (starts[axis], ends[axis]);
            if start > end || end > self.dim(axis) {
                return Err(TensorError::invalid(
                    "narrow_all",
                    format!(
                        "range [{start}, {end}) is invalid for axis {axis} with dimension {}",
                        self.dim(axis)
                    ),
                ));
            }
            dims.push(end - start);
            offset += start * self.strides[axis];
        }
        let narrowed = Self::from_parts(Shape::new(dims), offset, self.strides.clone());
        Ok(if keepdim { narrowed } else { narrowed.squeeze() })
    }

    /// Reorders the axes fastest-first for `ask`.
    ///
    /// `RowMajor` reverses the axes, `ColMajor` keeps them and `Storage`
    /// sorts them by `(stride, dim)`. With `compact`, unit axes are dropped
    /// and each axis that continues its predecessor
    /// (`dims[k-1]·strides[k-1] == strides[k]`) is merged into it, so a layout
    /// dense in `ask` collapses to rank 1 with stride 1.
    pub fn compute_fortran_layout(&self, ask: AskOrder, compact: bool) -> Self {
        let mut axes: Vec<usize> = (0..self.rank()).collect();
        match ask {
            AskOrder::ColMajor => {}
            AskOrder::RowMajor => axes.reverse(),
            AskOrder::Storage => axes.sort_by_key(|&a| (self.strides[a], self.dim(a))),
        }
        let mut dims: Vec<usize> = axes.iter().map(|&a| self.dim(a)).collect();
        let mut strides: Vec<usize> = axes.iter().map(|&a| self.strides[a]).collect();
        if compact {
            compact_fortran(&mut dims, &mut strides);
        }
        Self::from_parts(Shape::new(dims), self.offset, strides)
    }
}

fn compact_fortran(dims: &mut Vec<usize>, strides: &mut Vec<usize>) {
    let mut len = 0;
    for i in 0..dims.len() {
        if dims[i] == 1 {
            continue;
        }
        if len > 0 && dims[len - 1] * strides[len - 1] == strides[i] {
            dims[len - 1] *= dims[i];
            continue;
        }
        dims[len] = dims[i];
        strides[len] = strides[i];
        len += 1;
    }
    dims.truncate(len);
    strides.truncate(len);
}

impl fmt::Display for StrideLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StrideLayout{{shape={}, offset={}, strides={:?}",
            self.shape, self.offset, self.strides
        )?;
        match (self.c_ordered, self.f_ordered) {
            (true, true) => write!(f, ", flags=[C, F]}}"),
            (true, false) => write!(f, ", flags=[C]}}"),
            (false, true) => write!(f, ", flags=[F]}}"),
            (false, false) => write!(f, ", flags=[]}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(dims: &[usize], order: Order) -> StrideLayout {
        StrideLayout::of_dense(Shape::from(dims), 0, order)
    }

    #[test]
    fn test_dense_flags() {
        let c = dense(&[2, 3, 4], Order::RowMajor);
        assert_eq!(c.strides(), &[12, 4, 1]);
        assert!(c.is_c_ordered() && !c.is_f_ordered() && c.is_dense());
        assert_eq!(c.storage_fast_order(), Some(Order::RowMajor));

        let f = dense(&[2, 3, 4], Order::ColMajor);
        assert_eq!(f.strides(), &[1, 2, 6]);
        assert!(f.is_f_ordered() && !f.is_c_ordered() && f.is_dense());
        assert_eq!(f.storage_fast_order(), Some(Order::ColMajor));
    }

    #[test]
    fn test_low_rank_is_both_orders() {
        let v = StrideLayout::of(Shape::vector(5), 3, vec![2]).unwrap();
        assert!(v.is_c_ordered() && v.is_f_ordered());
        assert!(!v.is_dense());
        assert_eq!(v.storage_fast_order(), None);
        assert!(StrideLayout::of_dense(Shape::scalar(), 0, Order::RowMajor).is_dense());
    }

    #[test]
    fn test_unordered() {
        let l = StrideLayout::of(Shape::new(vec![2, 3, 4]), 0, vec![4, 8, 1]).unwrap();
        assert!(!l.is_c_ordered() && !l.is_f_ordered());
        assert_eq!(l.storage_fast_order(), None);
    }

    #[test]
    fn test_strides_rank_mismatch() {
        let err = StrideLayout::of(Shape::matrix(2, 3), 0, vec![1]).unwrap_err();
        assert!(matches!(err, TensorError::InvalidArgument { op: "layout", .. }));
    }

    #[test]
    fn test_pointer() {
        let l = StrideLayout::of(Shape::matrix(2, 3), 10, vec![3, 1]).unwrap();
        assert_eq!(l.pointer(&[1, 2]).unwrap(), 15);
        assert!(matches!(
            l.pointer(&[2, 0]),
            Err(TensorError::IndexOutOfRange {
                axis: 0,
                index: 2,
                dim: 2
            })
        ));
        assert!(matches!(
            l.pointer(&[0]),
            Err(TensorError::InvalidArgument { .. })
        ));
        assert_eq!(l.max_pointer(), Some(15));
    }

    #[test]
    fn test_squeeze() {
        let l = dense(&[1, 3, 1, 2], Order::RowMajor);
        let s = l.squeeze();
        assert_eq!(s.dims(), &[3, 2]);
        assert_eq!(s.strides(), &[2, 1]);

        assert_eq!(l.squeeze_axis(2).unwrap().dims(), &[1, 3, 2]);
        assert_eq!(l.squeeze_axis(1).unwrap(), l);
        assert!(l.squeeze_axis(4).is_err());
    }

    #[test]
    fn test_unsqueeze_keeps_order() {
        let c = dense(&[2, 3], Order::RowMajor);
        for axis in 0..=2 {
            let u = c.unsqueeze(axis).unwrap();
            assert_eq!(u.rank(), 3);
            assert_eq!(u.dim(axis), 1);
            assert!(u.is_c_ordered(), "axis {axis}: {u}");
        }
        let f = dense(&[2, 3], Order::ColMajor);
        for axis in 0..=2 {
            assert!(f.unsqueeze(axis).unwrap().is_f_ordered());
        }
        assert!(c.unsqueeze(3).is_err());
    }

    #[test]
    fn test_unsqueeze_then_squeeze() {
        let l = dense(&[4, 5], Order::RowMajor);
        let u = l.unsqueeze(1).unwrap();
        assert_eq!(u.squeeze_axis(1).unwrap(), l);
    }

    #[test]
    fn test_move_axis_both_directions() {
        let l = dense(&[2, 3, 4], Order::RowMajor);
        let fwd = l.move_axis(0, 2).unwrap();
        assert_eq!(fwd.dims(), &[3, 4, 2]);
        assert_eq!(fwd.strides(), &[4, 1, 12]);
        let back = l.move_axis(2, 0).unwrap();
        assert_eq!(back.dims(), &[4, 2, 3]);
        assert_eq!(back.strides(), &[1, 12, 4]);
        assert_eq!(fwd.move_axis(2, 0).unwrap(), l);
    }

    #[test]
    fn test_move_axis_equals_two_swaps() {
        let l = dense(&[2, 3, 4], Order::ColMajor);
        let moved = l.move_axis(0, 2).unwrap();
        let swapped = l.swap_axis(0, 1).unwrap().swap_axis(1, 2).unwrap();
        assert_eq!(moved, swapped);
    }

    #[test]
    fn test_revert_twice() {
        let l = StrideLayout::of(Shape::new(vec![2, 3, 4]), 1, vec![4, 8, 1]).unwrap();
        assert_eq!(l.revert().revert(), l);
        assert!(dense(&[2, 3], Order::RowMajor).revert().is_f_ordered());
    }

    #[test]
    fn test_permute() {
        let l = dense(&[2, 3, 4], Order::RowMajor);
        let p = l.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.dims(), &[4, 2, 3]);
        assert_eq!(p.strides(), &[1, 12, 4]);
        assert!(l.permute(&[0, 0, 1]).is_err());
        assert!(l.permute(&[0, 1]).is_err());
        assert!(l.permute(&[0, 1, 3]).is_err());
    }

    #[test]
    fn test_narrow() {
        let l = dense(&[4, 5], Order::RowMajor);
        let n = l.narrow(1, true, 1, 4).unwrap();
        assert_eq!(n.dims(), &[4, 3]);
        assert_eq!(n.offset(), 1);
        assert!(!n.is_c_ordered());

        let row = l.narrow(0, false, 2, 3).unwrap();
        assert_eq!(row.dims(), &[5]);
        assert_eq!(row.offset(), 10);

        assert!(l.narrow(0, true, 3, 5).is_err());
        assert!(l.narrow(0, true, 3, 2).is_err());
        assert_eq!(l.narrow(0, true, 2, 2).unwrap().size(), 0);
    }

    #[test]
    fn test_narrow_all() {
        let l = dense(&[4, 5, 6], Order::RowMajor);
        let n = l.narrow_all(true, &[1, 0, 2], &[3, 1, 6]).unwrap();
        assert_eq!(n.dims(), &[2, 1, 4]);
        assert_eq!(n.offset(), 30 + 2);
        let sq = l.narrow_all(false, &[1, 0, 2], &[3, 1, 6]).unwrap();
        assert_eq!(sq.dims(), &[2, 4]);
        assert!(l.narrow_all(true, &[0, 0], &[1, 1]).is_err());
    }

    #[test]
    fn test_fortran_layout_orders() {
        let l = dense(&[2, 3, 4], Order::RowMajor);
        let c = l.compute_fortran_layout(AskOrder::RowMajor, false);
        assert_eq!(c.dims(), &[4, 3, 2]);
        assert_eq!(c.strides(), &[1, 4, 12]);
        let f = l.compute_fortran_layout(AskOrder::ColMajor, false);
        assert_eq!(f.dims(), &[2, 3, 4]);
        let s = l.compute_fortran_layout(AskOrder::Storage, false);
        assert_eq!(s, c);
    }

    #[test]
    fn test_compact_merges_dense() {
        let l = dense(&[2, 3, 4], Order::RowMajor);
        let c = l.compute_fortran_layout(AskOrder::RowMajor, true);
        assert_eq!(c.dims(), &[24]);
        assert_eq!(c.strides(), &[1]);
        let f = l.compute_fortran_layout(AskOrder::ColMajor, true);
        assert_eq!(f.rank(), 3);
    }

    #[test]
    fn test_compact_partial_merge_and_units() {
        // a narrowed row-major [4, 5] viewed as [4, 1, 3]: rows not contiguous
        let l = StrideLayout::of(Shape::new(vec![4, 1, 3]), 1, vec![5, 99, 1]).unwrap();
        let c = l.compute_fortran_layout(AskOrder::RowMajor, true);
        assert_eq!(c.dims(), &[3, 4]);
        assert_eq!(c.strides(), &[1, 5]);

        let all_units = dense(&[1, 1], Order::RowMajor);
        assert_eq!(all_units.compute_fortran_layout(AskOrder::Storage, true).rank(), 0);
    }

    #[test]
    fn test_serde_wire_tuple() {
        let l = StrideLayout::of(Shape::matrix(2, 3), 4, vec![1, 2]).unwrap();
        let text = toml::to_string(&Wrapper { layout: l.clone() }).unwrap();
        let back: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(back.layout, l);
        assert!(back.layout.is_f_ordered());

        let bad: Result<Wrapper, _> = toml::from_str("layout = [[2, 3], 0, [1]]");
        assert!(bad.is_err());
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Wrapper {
        layout: StrideLayout,
    }
}
