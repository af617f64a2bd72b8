// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for engine construction.

use std::path::PathBuf;

/// Errors that can occur while configuring or building an [`Engine`](crate::Engine).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A hardware description file could not be parsed.
    #[error("cannot parse '{}': {detail}", path.display())]
    Probe { path: PathBuf, detail: String },

    /// A tensor operation failed.
    #[error(transparent)]
    Tensor(#[from] tensor_core::TensorError),
}
