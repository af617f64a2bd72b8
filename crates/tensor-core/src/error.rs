// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.

use crate::Shape;

/// Boxed cause carried by [`TensorError::ParallelTaskFailure`].
pub type TaskCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during tensor operations.
///
/// Every failure is raised synchronously by the call that violates a
/// precondition. Nothing is clamped or coerced.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// Two tensors have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// An argument is outside the domain accepted by the operation.
    #[error("invalid argument for {op}: {detail}")]
    InvalidArgument { op: &'static str, detail: String },

    /// An index is outside `[0, dim)` for its axis.
    #[error("index {index} is out of range for axis {axis} with dimension {dim}")]
    IndexOutOfRange {
        axis: usize,
        index: usize,
        dim: usize,
    },

    /// `next` was called on a spent iterator.
    #[error("iterator exhausted")]
    IteratorExhausted,

    /// A worker task of a parallel operation failed. Reported after every
    /// sibling task has been drained.
    #[error("parallel task failed in {op}: {source}")]
    ParallelTaskFailure {
        op: &'static str,
        #[source]
        source: TaskCause,
    },
}

impl TensorError {
    /// Shorthand for [`TensorError::InvalidArgument`].
    pub fn invalid(op: &'static str, detail: impl Into<String>) -> Self {
        TensorError::InvalidArgument {
            op,
            detail: detail.into(),
        }
    }
}

/// A panic captured inside a worker task.
#[derive(Debug, thiserror::Error)]
#[error("worker panicked: {message}")]
pub struct WorkerPanic {
    pub message: String,
}

impl WorkerPanic {
    /// Extracts the message from a panic payload returned by `catch_unwind`.
    pub fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self { message }
    }
}
