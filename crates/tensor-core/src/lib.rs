// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Value types describing strided N-dimensional tensors.
//!
//! This crate provides:
//! - [`Shape`] — axis extents and position/index mapping.
//! - [`Order`] and [`AskOrder`] — total traversal orders and order requests.
//! - [`StrideLayout`] — offset plus strides over flat storage, with every
//!   zero-copy axis transform.
//! - [`StrideChunkDescriptor`] — fixed-step runs that drive vectorized loops.
//! - [`PointerIterator`] and [`ChunkIterator`] — sequential storage cursors.
//! - [`Scalar`] and [`DType`] — supported element types and lane widths.
//!
//! Nothing here owns storage or spawns threads; see `tensor-engine` for that.

mod chunk;
mod dtype;
mod error;
mod iter;
mod layout;
mod order;
mod shape;

pub use chunk::StrideChunkDescriptor;
pub use dtype::{DType, Scalar, MAX_LANES, VECTOR_BYTES};
pub use error::{TaskCause, TensorError, WorkerPanic};
pub use iter::{ChunkIterator, PointerIterator};
pub use layout::StrideLayout;
pub use order::{AskOrder, Order};
pub use shape::Shape;
