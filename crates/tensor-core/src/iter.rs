// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sequential cursors over storage positions.
//!
//! Both iterators are forward-only and single-pass. Calling
//! [`PointerIterator::next_pointer`] or [`ChunkIterator::next_chunk`] after
//! exhaustion fails with [`TensorError::IteratorExhausted`].

use crate::{AskOrder, StrideChunkDescriptor, StrideLayout, TensorError};

/// Yields the storage position of every element in a requested order.
#[derive(Debug, Clone)]
pub enum PointerIterator {
    /// Single affine counter over a layout that is ordered in the request.
    Dense {
        start: usize,
        step: usize,
        size: usize,
        position: usize,
    },
    /// Odometer over the compact Fortran layout, axis 0 fastest.
    Strided {
        dims: Vec<usize>,
        strides: Vec<usize>,
        index: Vec<usize>,
        pointer: usize,
        size: usize,
        position: usize,
    },
}

impl PointerIterator {
    /// Builds the cheapest iterator that walks `layout` in `ask` order.
    pub fn new(layout: &StrideLayout, ask: AskOrder) -> Self {
        let size = layout.size();
        let rank = layout.rank();
        if rank == 0 {
            return PointerIterator::Dense {
                start: layout.offset(),
                step: 1,
                size,
                position: 0,
            };
        }
        if layout.is_c_ordered() && ask != AskOrder::ColMajor {
            return PointerIterator::Dense {
                start: layout.offset(),
                step: layout.stride(rank - 1),
                size,
                position: 0,
            };
        }
        if layout.is_f_ordered() && ask != AskOrder::RowMajor {
            return PointerIterator::Dense {
                start: layout.offset(),
                step: layout.stride(0),
                size,
                position: 0,
            };
        }
        let compact = layout.compute_fortran_layout(ask, true);
        PointerIterator::Strided {
            index: vec![0; compact.rank()],
            dims: compact.dims().to_vec(),
            strides: compact.strides().to_vec(),
            pointer: compact.offset(),
            size,
            position: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        match self {
            PointerIterator::Dense { size, position, .. }
            | PointerIterator::Strided { size, position, .. } => position < size,
        }
    }

    /// Number of positions already yielded.
    pub fn position(&self) -> usize {
        match self {
            PointerIterator::Dense { position, .. } | PointerIterator::Strided { position, .. } => {
                *position
            }
        }
    }

    /// Returns the next storage position.
    pub fn next_pointer(&mut self) -> Result<usize, TensorError> {
        self.next().ok_or(TensorError::IteratorExhausted)
    }
}

impl Iterator for PointerIterator {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            PointerIterator::Dense {
                start,
                step,
                size,
                position,
            } => {
                if *position >= *size {
                    return None;
                }
                let pointer = *start + *position * *step;
                *position += 1;
                Some(pointer)
            }
            PointerIterator::Strided {
                dims,
                strides,
                index,
                pointer,
                size,
                position,
            } => {
                if *position >= *size {
                    return None;
                }
                let current = *pointer;
                *position += 1;
                for axis in 0..dims.len() {
                    index[axis] += 1;
                    *pointer += strides[axis];
                    if index[axis] < dims[axis] {
                        break;
                    }
                    *pointer -= strides[axis] * dims[axis];
                    index[axis] = 0;
                }
                Some(current)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self {
            PointerIterator::Dense { size, position, .. }
            | PointerIterator::Strided { size, position, .. } => size - position,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PointerIterator {}

/// Yields the start pointer of every run of a [`StrideChunkDescriptor`].
#[derive(Debug, Clone)]
pub struct ChunkIterator {
    descriptor: StrideChunkDescriptor,
    position: usize,
}

impl ChunkIterator {
    pub fn new(layout: &StrideLayout, ask: AskOrder) -> Self {
        Self {
            descriptor: StrideChunkDescriptor::of(layout, ask),
            position: 0,
        }
    }

    pub fn descriptor(&self) -> &StrideChunkDescriptor {
        &self.descriptor
    }

    pub fn loop_step(&self) -> usize {
        self.descriptor.loop_step()
    }

    pub fn loop_size(&self) -> usize {
        self.descriptor.loop_size()
    }

    /// Storage span of one run.
    pub fn loop_bound(&self) -> usize {
        self.descriptor.loop_length()
    }

    pub fn chunk_count(&self) -> usize {
        self.descriptor.chunk_count()
    }

    pub fn has_next(&self) -> bool {
        self.position < self.descriptor.chunk_count()
    }

    pub fn next_chunk(&mut self) -> Result<usize, TensorError> {
        self.next().ok_or(TensorError::IteratorExhausted)
    }
}

impl Iterator for ChunkIterator {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let offset = self.descriptor.chunk_offsets().get(self.position).copied()?;
        self.position += 1;
        Some(offset)
    }
}
