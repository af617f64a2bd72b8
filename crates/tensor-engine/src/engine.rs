// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The engine handle: resolved configuration, worker pool and tensor factory.
//!
//! An [`Engine`] is cheap to clone; every clone shares one worker pool,
//! started once in [`Engine::new`]. Tensors keep a handle to the engine that
//! created them and run their parallel operations on its pool.

use crate::{
    CacheBlocking, CacheSize, CpuTopology, EngineConfig, EngineError, Storage, Tensor, WorkerPool,
};
use std::sync::Arc;
use tensor_core::{AskOrder, Order, Scalar, Shape, StrideLayout, TensorError};

// ── Engine ─────────────────────────────────────────────────────

struct EngineInner {
    config: EngineConfig,
    l2_cache: CacheSize,
    blocking: CacheBlocking,
    pool: WorkerPool,
}

/// Shared handle to a configured tensor engine.
///
/// # Example
/// ```no_run
/// use tensor_engine::{Engine, EngineConfig};
/// use tensor_core::{AskOrder, Shape};
///
/// let engine = Engine::new(EngineConfig::default())?;
/// let a = engine.seq::<f64>(Shape::matrix(3, 4), AskOrder::RowMajor);
/// let b = engine.eye::<f64>(4, AskOrder::RowMajor);
/// let c = a.mm(&b, AskOrder::RowMajor)?;
/// assert_eq!(c.shape(), a.shape());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Validates `config`, probes the host and starts the worker pool.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let topology = CpuTopology::read();
        let threads = config.resolve_threads_with(&topology);
        let l2_cache = config.resolve_l2_cache_with(&topology)?;
        let pool = WorkerPool::new(threads)?;
        let blocking = CacheBlocking::new(l2_cache.as_bytes(), threads);
        tracing::info!(
            "tensor engine started: {threads} threads, L2 {l2_cache}, default order {}, parallel copy {}",
            config.default_order,
            if config.parallel_copy { "on" } else { "off" }
        );
        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                l2_cache,
                blocking,
                pool,
            }),
        })
    }

    /// An engine with the default configuration.
    pub fn with_defaults() -> Result<Self, EngineError> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn threads(&self) -> usize {
        self.inner.pool.threads()
    }

    pub fn l2_cache(&self) -> CacheSize {
        self.inner.l2_cache
    }

    pub fn blocking(&self) -> &CacheBlocking {
        &self.inner.blocking
    }

    pub fn default_order(&self) -> Order {
        self.inner.config.default_order
    }

    pub fn parallel_copy(&self) -> bool {
        self.inner.config.parallel_copy
    }

    pub(crate) fn pool(&self) -> &WorkerPool {
        &self.inner.pool
    }

    /// Whether both handles refer to the same engine.
    pub fn same_engine(&self, other: &Engine) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn storage_order(&self, ask: AskOrder) -> Order {
        ask.resolve(None, self.default_order())
    }

    // ── Factory ────────────────────────────────────────────────

    /// A tensor filled with `value`, dense in `ask` (`Storage` → default order).
    pub fn full<T: Scalar>(&self, shape: impl Into<Shape>, value: T, ask: AskOrder) -> Tensor<T> {
        let shape = shape.into();
        let data = vec![value; shape.size()];
        let layout = StrideLayout::of_dense(shape, 0, self.storage_order(ask));
        Tensor::from_parts(self.clone(), layout, data)
    }

    pub fn zeros<T: Scalar>(&self, shape: impl Into<Shape>, ask: AskOrder) -> Tensor<T> {
        self.full(shape, T::zero(), ask)
    }

    /// The `n × n` identity matrix.
    pub fn eye<T: Scalar>(&self, n: usize, ask: AskOrder) -> Tensor<T> {
        let mut data = vec![T::zero(); n * n];
        // the diagonal sits at the same positions in both orders
        for i in 0..n {
            data[i * (n + 1)] = T::one();
        }
        let layout = StrideLayout::of_dense(Shape::matrix(n, n), 0, self.storage_order(ask));
        Tensor::from_parts(self.clone(), layout, data)
    }

    /// Element at multi-index `idx` holds its row-major position, whatever
    /// the storage order.
    pub fn seq<T: Scalar>(&self, shape: impl Into<Shape>, ask: AskOrder) -> Tensor<T> {
        let shape = shape.into();
        let layout = StrideLayout::of_dense(shape.clone(), 0, self.storage_order(ask));
        let mut data = vec![T::zero(); shape.size()];
        let pointers = tensor_core::PointerIterator::new(&layout, AskOrder::RowMajor);
        for (position, pointer) in pointers.enumerate() {
            data[pointer] = T::from_usize(position);
        }
        Tensor::from_parts(self.clone(), layout, data)
    }

    /// Uniform samples from `[0, 1)`.
    pub fn random<T: Scalar, R: rand::Rng + ?Sized>(
        &self,
        shape: impl Into<Shape>,
        rng: &mut R,
        ask: AskOrder,
    ) -> Tensor<T> {
        let shape = shape.into();
        let data = (0..shape.size())
            .map(|_| T::from_f64(rng.gen::<f64>()))
            .collect();
        let layout = StrideLayout::of_dense(shape, 0, self.storage_order(ask));
        Tensor::from_parts(self.clone(), layout, data)
    }

    /// A rank-0 tensor.
    pub fn scalar<T: Scalar>(&self, value: T) -> Tensor<T> {
        let layout = StrideLayout::of_dense(Shape::scalar(), 0, Order::RowMajor);
        Tensor::from_parts(self.clone(), layout, vec![value])
    }

    /// Wraps `data` without copying.
    ///
    /// Fails with `InvalidArgument` when the strides do not match the rank or
    /// an addressed position falls outside `data`.
    pub fn stride<T: Scalar>(
        &self,
        shape: impl Into<Shape>,
        offset: usize,
        strides: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Tensor<T>, TensorError> {
        let layout = StrideLayout::of(shape.into(), offset, strides)?;
        Tensor::try_new(self.clone(), layout, Storage::new(data))
    }

    /// Wraps `data` as a dense tensor in `ask` order, starting at `offset`.
    pub fn stride_dense<T: Scalar>(
        &self,
        shape: impl Into<Shape>,
        offset: usize,
        ask: AskOrder,
        data: Vec<T>,
    ) -> Result<Tensor<T>, TensorError> {
        let layout = StrideLayout::of_dense(shape.into(), offset, self.storage_order(ask));
        Tensor::try_new(self.clone(), layout, Storage::new(data))
    }

    /// A tensor viewing an existing buffer through `layout`.
    pub fn from_storage<T: Scalar>(
        &self,
        layout: StrideLayout,
        storage: Storage<T>,
    ) -> Result<Tensor<T>, TensorError> {
        Tensor::try_new(self.clone(), layout, storage)
    }

    /// Stacks equally shaped tensors along a new axis inserted at `axis`.
    pub fn stack<T: Scalar>(
        &self,
        ask: AskOrder,
        axis: usize,
        tensors: &[Tensor<T>],
    ) -> Result<Tensor<T>, TensorError> {
        let first = tensors
            .first()
            .ok_or_else(|| TensorError::invalid("stack", "no tensors given"))?;
        for t in &tensors[1..] {
            if t.shape() != first.shape() {
                return Err(TensorError::ShapeMismatch {
                    op: "stack",
                    lhs: first.shape().clone(),
                    rhs: t.shape().clone(),
                });
            }
        }
        if axis > first.rank() {
            return Err(TensorError::invalid(
                "stack",
                format!("axis {axis} is out of bounds for rank {}", first.rank()),
            ));
        }
        let mut dims = first.shape().dims().to_vec();
        dims.insert(axis, tensors.len());
        let out = self.zeros::<T>(Shape::new(dims), ask);
        for (i, t) in tensors.iter().enumerate() {
            t.copy_to(&out.narrow(axis, false, i, i + 1)?, AskOrder::Storage)?;
        }
        Ok(out)
    }

    /// Concatenates tensors along an existing `axis`; every other extent
    /// must agree.
    pub fn concat<T: Scalar>(
        &self,
        ask: AskOrder,
        axis: usize,
        tensors: &[Tensor<T>],
    ) -> Result<Tensor<T>, TensorError> {
        let first = tensors
            .first()
            .ok_or_else(|| TensorError::invalid("concat", "no tensors given"))?;
        if axis >= first.rank() {
            return Err(TensorError::invalid(
                "concat",
                format!("axis {axis} is out of bounds for rank {}", first.rank()),
            ));
        }
        let mut total = 0;
        for t in tensors {
            let compatible = t.rank() == first.rank()
                && t
                    .shape()
                    .dims()
                    .iter()
                    .zip(first.shape().dims())
                    .enumerate()
                    .all(|(i, (a, b))| i == axis || a == b);
            if !compatible {
                return Err(TensorError::ShapeMismatch {
                    op: "concat",
                    lhs: first.shape().clone(),
                    rhs: t.shape().clone(),
                });
            }
            total += t.layout().dim(axis);
        }
        let mut dims = first.shape().dims().to_vec();
        dims[axis] = total;
        let out = self.zeros::<T>(Shape::new(dims), ask);
        let mut start = 0;
        for t in tensors {
            let end = start + t.layout().dim(axis);
            t.copy_to(&out.narrow(axis, true, start, end)?, AskOrder::Storage)?;
            start = end;
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("threads", &self.threads())
            .field("l2_cache", &self.inner.l2_cache)
            .field("default_order", &self.default_order())
            .field("parallel_copy", &self.parallel_copy())
            .finish()
    }
}
