// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Strided tensors over shared storage.
//!
//! A [`Tensor`] is a [`StrideLayout`] over a [`Storage`] buffer plus the
//! [`Engine`] that runs its parallel operations. Views produced by axis
//! transforms share the buffer: a write through one view is visible through
//! every other.
//!
//! # Locking
//! Each operation takes the storage guards it needs for its own duration
//! only. Operations whose operands share one buffer take a single guard.

use crate::{Engine, Storage};
use tensor_core::{
    AskOrder, ChunkIterator, DType, Order, PointerIterator, Scalar, Shape, StrideLayout,
    TensorError,
};

/// A strided N-dimensional tensor of `T`.
pub struct Tensor<T: Scalar> {
    layout: StrideLayout,
    storage: Storage<T>,
    engine: Engine,
}

impl<T: Scalar> Tensor<T> {
    /// Wraps `storage` in `layout` after checking every addressed pointer
    /// lies inside the buffer.
    pub(crate) fn try_new(
        engine: Engine,
        layout: StrideLayout,
        storage: Storage<T>,
    ) -> Result<Self, TensorError> {
        if let Some(max) = layout.max_pointer() {
            let len = storage.len();
            if max >= len {
                return Err(TensorError::invalid(
                    "stride",
                    format!("{layout} addresses position {max} of a buffer with {len} elements"),
                ));
            }
        }
        Ok(Self {
            layout,
            storage,
            engine,
        })
    }

    /// Wraps a buffer built for `layout`; the caller guarantees it fits.
    pub(crate) fn from_parts(engine: Engine, layout: StrideLayout, data: Vec<T>) -> Self {
        debug_assert!(layout.max_pointer().map_or(true, |m| m < data.len()));
        Self {
            layout,
            storage: Storage::new(data),
            engine,
        }
    }

    /// Another tensor over the same storage.
    pub(crate) fn view(&self, layout: StrideLayout) -> Self {
        Self {
            layout,
            storage: self.storage.clone(),
            engine: self.engine.clone(),
        }
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Extent of `axis`, or `None` if out of bounds.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.layout.shape().dim(axis)
    }

    pub fn layout(&self) -> &StrideLayout {
        &self.layout
    }

    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Whether both tensors view the same buffer.
    pub fn shares_storage(&self, other: &Tensor<T>) -> bool {
        self.storage.same_buffer(&other.storage)
    }

    /// Resolves `ask` against this layout's fast order and the engine default.
    pub fn resolve_order(&self, ask: AskOrder) -> Order {
        ask.resolve(self.layout.storage_fast_order(), self.engine.default_order())
    }

    /// The order two operands are walked in when paired with this receiver.
    pub(crate) fn common_order(&self) -> Order {
        self.layout
            .storage_fast_order()
            .unwrap_or(self.engine.default_order())
    }

    pub fn get(&self, indices: &[usize]) -> Result<T, TensorError> {
        let pointer = self.layout.pointer(indices)?;
        Ok(self.storage.read()[pointer])
    }

    pub fn set(&self, indices: &[usize], value: T) -> Result<(), TensorError> {
        let pointer = self.layout.pointer(indices)?;
        self.storage.write()[pointer] = value;
        Ok(())
    }

    /// Reads the element at a raw storage position.
    pub fn ptr_get(&self, pointer: usize) -> Result<T, TensorError> {
        let data = self.storage.read();
        data.get(pointer)
            .copied()
            .ok_or(TensorError::IndexOutOfRange {
                axis: 0,
                index: pointer,
                dim: data.len(),
            })
    }

    /// Writes the element at a raw storage position.
    pub fn ptr_set(&self, pointer: usize, value: T) -> Result<(), TensorError> {
        let mut data = self.storage.write();
        let len = data.len();
        let slot = data.get_mut(pointer).ok_or(TensorError::IndexOutOfRange {
            axis: 0,
            index: pointer,
            dim: len,
        })?;
        *slot = value;
        Ok(())
    }

    /// Storage positions of every element in `ask` order.
    pub fn ptr_iterator(&self, ask: AskOrder) -> PointerIterator {
        PointerIterator::new(&self.layout, ask)
    }

    /// Run starts of the chunk decomposition in `ask` order.
    pub fn chunk_iterator(&self, ask: AskOrder) -> ChunkIterator {
        ChunkIterator::new(&self.layout, ask)
    }

    /// Lazily reads the elements in `ask` order, one guard per element.
    pub fn iter(&self, ask: AskOrder) -> TensorIter<'_, T> {
        TensorIter {
            storage: &self.storage,
            pointers: self.ptr_iterator(ask),
        }
    }

    /// Collects the elements in `ask` order under a single read guard.
    pub fn to_vec(&self, ask: AskOrder) -> Vec<T> {
        let data = self.storage.read();
        self.ptr_iterator(ask).map(|p| data[p]).collect()
    }
}

/// Shares the layout and storage; use [`Tensor::copy`] for a deep copy.
impl<T: Scalar> Clone for Tensor<T> {
    fn clone(&self) -> Self {
        self.view(self.layout.clone())
    }
}

impl<T: Scalar> std::fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &T::DTYPE)
            .field("layout", &self.layout)
            .field("storage", &self.storage)
            .finish()
    }
}

/// Value iterator returned by [`Tensor::iter`].
pub struct TensorIter<'a, T> {
    storage: &'a Storage<T>,
    pointers: PointerIterator,
}

impl<T: Copy> Iterator for TensorIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let pointer = self.pointers.next()?;
        Some(self.storage.read()[pointer])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pointers.size_hint()
    }
}

impl<T: Copy> ExactSizeIterator for TensorIter<'_, T> {}
