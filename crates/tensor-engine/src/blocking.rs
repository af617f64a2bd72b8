// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Cache-derived block sizes for matmul and tiled copies.
//!
//! The heuristics only affect speed; any positive block size gives the same
//! result.

use tensor_core::Scalar;

/// Block sizes for one matrix multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatmulBlocking {
    /// Base block edge derived from the per-thread cache share.
    pub chunk: usize,
    /// Reduction-axis chunk handed to one dot-range call.
    pub vector_chunk: usize,
    /// Edge of a square output tile; one task per tile.
    pub inner_tile: usize,
}

/// Cache budget shared by the worker threads of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheBlocking {
    l2_bytes: usize,
    threads: usize,
}

impl CacheBlocking {
    pub fn new(l2_bytes: usize, threads: usize) -> Self {
        Self {
            l2_bytes: l2_bytes.max(1),
            threads: threads.max(1),
        }
    }

    pub fn l2_bytes(&self) -> usize {
        self.l2_bytes
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Block sizes for multiplying matrices of `T`.
    ///
    /// `chunk = ⌊√(L2 / 2 / threads / bytes)⌋`, rounded down to a multiple of
    /// the lane width when at least one lane group wide.
    pub fn matmul<T: Scalar>(&self) -> MatmulBlocking {
        let bytes = std::mem::size_of::<T>();
        let share = self.l2_bytes as f64 / 2.0 / self.threads as f64 / bytes as f64;
        let mut chunk = share.sqrt().floor() as usize;
        if chunk >= T::LANES {
            chunk -= chunk % T::LANES;
        }
        let chunk = chunk.max(1);
        let vector_chunk = if chunk > 64 { chunk * 4 } else { chunk };
        let inner_tile = if chunk > 64 {
            (chunk as f64 / 4.0).sqrt().ceil() as usize
        } else {
            (chunk as f64).sqrt().ceil() as usize
        };
        MatmulBlocking {
            chunk,
            vector_chunk,
            inner_tile: inner_tile.max(1),
        }
    }

    /// Element count above which a reordering copy of `T` is tiled.
    pub fn copy_limit<T: Scalar>(&self) -> usize {
        let bytes = std::mem::size_of::<T>();
        (self.l2_bytes / (bytes * 2 * self.threads * 8)).max(1)
    }
}

/// Halves the largest slice until the block holds at most `limit` elements.
pub fn copy_slices(dims: &[usize], limit: usize) -> Vec<usize> {
    let limit = limit.max(1);
    let mut slices: Vec<usize> = dims.iter().map(|&d| d.max(1)).collect();
    let mut size: usize = slices.iter().product();
    while size > limit {
        let Some((axis, _)) = slices
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
        else {
            break;
        };
        size = size / slices[axis] * (slices[axis] / 2);
        slices[axis] /= 2;
    }
    slices
}
