// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-engine
//!
//! Strided tensors over shared storage and the operators that run on them.
//!
//! The engine takes:
//! - An [`EngineConfig`] (thread count, L2 budget, default order), usually
//!   loaded from TOML.
//! - The host [`CpuTopology`] probed from sysfs to fill in what the config
//!   leaves open.
//!
//! And provides an [`Engine`] handle that builds [`Tensor`]s and runs their
//! parallel operations on one fixed [`WorkerPool`].
//!
//! # Views and copies
//! Axis transforms, `narrow`, `split`, and dense `reshape`/`ravel` return
//! views sharing the same [`Storage`]. `copy`, `flatten`, matmul outputs and
//! every copy-returning operator allocate.
//!
//! # Parallelism
//! Only `mm` and large reordering copies use the pool. Each task writes a
//! disjoint region of a freshly allocated buffer through a
//! [`DisjointWriter`]; the caller blocks until all tasks have joined.

mod blocking;
mod config;
mod engine;
mod error;
mod hardware;
mod ops;
mod parallel;
mod storage;
mod tensor;

pub use blocking::{copy_slices, CacheBlocking, MatmulBlocking};
pub use config::{CacheSize, EngineConfig, FALLBACK_L2_CACHE};
pub use engine::Engine;
pub use error::EngineError;
pub use hardware::CpuTopology;
pub use ops::{BinaryOp, UnaryOp};
pub use parallel::{DisjointWriter, WorkerPool};
pub use storage::Storage;
pub use tensor::{Tensor, TensorIter};

pub use tensor_core::{AskOrder, DType, Order, Scalar, Shape, StrideLayout, TensorError};
