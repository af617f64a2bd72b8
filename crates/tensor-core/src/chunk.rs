// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Decomposition of a strided layout into fixed-step runs.

use crate::{AskOrder, StrideLayout};

/// The runs that cover a layout in a requested order.
///
/// Every run starts at one of `chunk_offsets` and visits `loop_size`
/// elements spaced `loop_step` apart. Runs are listed in traversal order,
/// so walking them run by run visits the elements in the requested order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrideChunkDescriptor {
    chunk_offsets: Vec<usize>,
    loop_step: usize,
    loop_size: usize,
}

impl StrideChunkDescriptor {
    /// Builds the descriptor of `layout` walked in `ask` order.
    ///
    /// A layout that is dense in `ask` yields a single run with
    /// `loop_step == 1`. Otherwise the fastest compacted axis becomes the run
    /// and the remaining axes are enumerated odometer-style.
    pub fn of(layout: &StrideLayout, ask: AskOrder) -> Self {
        if layout.size() == 0 {
            return Self {
                chunk_offsets: Vec::new(),
                loop_step: 1,
                loop_size: 0,
            };
        }
        let compact = layout.compute_fortran_layout(ask, true);
        if compact.rank() == 0 {
            return Self {
                chunk_offsets: vec![layout.offset()],
                loop_step: 1,
                loop_size: 1,
            };
        }

        let dims = compact.dims();
        let strides = compact.strides();
        let outer: usize = dims[1..].iter().product();
        let mut chunk_offsets = Vec::with_capacity(outer);
        let mut index = vec![0usize; dims.len()];
        let mut pointer = compact.offset();
        for _ in 0..outer {
            chunk_offsets.push(pointer);
            for axis in 1..dims.len() {
                index[axis] += 1;
                pointer += strides[axis];
                if index[axis] < dims[axis] {
                    break;
                }
                pointer -= strides[axis] * dims[axis];
                index[axis] = 0;
            }
        }
        Self {
            chunk_offsets,
            loop_step: strides[0],
            loop_size: dims[0],
        }
    }

    pub fn chunk_offsets(&self) -> &[usize] {
        &self.chunk_offsets
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_offsets.len()
    }

    pub fn chunk_offset(&self, i: usize) -> usize {
        self.chunk_offsets[i]
    }

    pub fn loop_step(&self) -> usize {
        self.loop_step
    }

    pub fn loop_size(&self) -> usize {
        self.loop_size
    }

    /// Storage span of one run: `loop_step · loop_size`.
    pub fn loop_length(&self) -> usize {
        self.loop_step * self.loop_size
    }

    /// Whether every run is contiguous.
    pub fn is_unit_step(&self) -> bool {
        self.loop_step == 1
    }

    /// Gather table for one lane group: `{0, step, 2·step, …}`.
    pub fn lane_indexes(&self, lanes: usize) -> Vec<usize> {
        (0..lanes).map(|i| i * self.loop_step).collect()
    }
}
