// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Flat element buffers shared by a tensor and its views.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// A fixed-length buffer behind a shared read/write lock.
///
/// Cloning a `Storage` clones the handle, not the elements. The buffer is
/// freed when the last handle drops.
pub struct Storage<T> {
    data: Arc<RwLock<Vec<T>>>,
}

impl<T> Storage<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared access for the duration of one operation.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.data.read()
    }

    /// Exclusive access for the duration of one operation.
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.data.write()
    }

    /// Exclusive access to this buffer and shared access to a distinct one.
    ///
    /// Both guards are taken in buffer address order, whichever buffer is
    /// written.
    pub fn write_with<'a>(
        &'a self,
        other: &'a Storage<T>,
    ) -> (RwLockWriteGuard<'a, Vec<T>>, RwLockReadGuard<'a, Vec<T>>) {
        debug_assert!(!self.same_buffer(other));
        if self.address() < other.address() {
            let dst = self.write();
            (dst, other.read())
        } else {
            let src = other.read();
            (self.write(), src)
        }
    }

    /// Shared access to two distinct buffers, taken in address order.
    pub fn read_with<'a>(
        &'a self,
        other: &'a Storage<T>,
    ) -> (RwLockReadGuard<'a, Vec<T>>, RwLockReadGuard<'a, Vec<T>>) {
        debug_assert!(!self.same_buffer(other));
        if self.address() < other.address() {
            let first = self.read();
            (first, other.read())
        } else {
            let second = other.read();
            (self.read(), second)
        }
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.data) as usize
    }

    /// Whether both handles refer to the same buffer.
    pub fn same_buffer(&self, other: &Storage<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of handles (tensors and views) referring to this buffer.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

impl<T: Clone> Storage<T> {
    /// Copies the whole buffer out.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.read().clone()
    }
}

impl<T> Clone for Storage<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T> From<Vec<T>> for Storage<T> {
    fn from(data: Vec<T>) -> Self {
        Self::new(data)
    }
}

impl<T> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.len())
            .field("holders", &self.holders())
            .finish()
    }
}
