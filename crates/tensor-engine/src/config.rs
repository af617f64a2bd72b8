// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Engine configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! cpu_threads = 4
//! l2_cache = "1M"
//! default_order = "row-major"
//! parallel_copy = true
//! ```

use crate::{CpuTopology, EngineError};
use std::fmt;
use std::path::Path;
use tensor_core::Order;

/// L2 size assumed when neither the configuration nor the host reports one.
pub const FALLBACK_L2_CACHE: usize = 256 * 1024;

/// A cache size in bytes.
///
/// # Parsing
/// Supports human-readable strings:
/// - `"512K"` or `"512KB"` → 512 × 1024 bytes
/// - `"1M"` or `"1MB"` → 1024² bytes
/// - `"1G"` or `"1GB"` → 1024³ bytes
/// - `"262144"` → raw byte count
///
/// # Examples
/// ```
/// use tensor_engine::CacheSize;
///
/// let c = CacheSize::parse("1M").unwrap();
/// assert_eq!(c.as_bytes(), 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct CacheSize {
    bytes: usize,
}

impl CacheSize {
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Parses a human-readable size string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EngineError::Config("empty cache size".into()));
        }

        let s_upper = s.to_uppercase();
        let (num_str, multiplier) = if s_upper.ends_with("GB") {
            (&s[..s.len() - 2], 1024 * 1024 * 1024)
        } else if s_upper.ends_with('G') {
            (&s[..s.len() - 1], 1024 * 1024 * 1024)
        } else if s_upper.ends_with("MB") {
            (&s[..s.len() - 2], 1024 * 1024)
        } else if s_upper.ends_with('M') {
            (&s[..s.len() - 1], 1024 * 1024)
        } else if s_upper.ends_with("KB") {
            (&s[..s.len() - 2], 1024)
        } else if s_upper.ends_with('K') {
            (&s[..s.len() - 1], 1024)
        } else if s_upper.ends_with('B') {
            (&s[..s.len() - 1], 1)
        } else {
            (s, 1)
        };

        let value: usize = num_str.trim().parse().map_err(|_| {
            EngineError::Config(format!(
                "invalid cache size '{s}'; expected a number with an optional K, M or G suffix"
            ))
        })?;
        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| EngineError::Config(format!("cache size overflow: '{s}'")))?;
        if bytes == 0 {
            return Err(EngineError::Config("cache size must be positive".into()));
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for CacheSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes >= 1024 * 1024 && self.bytes % (1024 * 1024) == 0 {
            write!(f, "{} MB", self.bytes / (1024 * 1024))
        } else if self.bytes >= 1024 && self.bytes % 1024 == 0 {
            write!(f, "{} KB", self.bytes / 1024)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}

/// Configuration for a tensor [`Engine`](crate::Engine).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Number of worker threads (defaults to the number of online cores).
    pub cpu_threads: Option<usize>,
    /// L2 cache size per core (human-readable, e.g. `"1M"`; defaults to the probed value).
    pub l2_cache: Option<String>,
    /// Order used when a request does not pin one and the layout has no fast order.
    #[serde(default)]
    pub default_order: Order,
    /// Whether large reordering copies may be tiled across the worker pool.
    #[serde(default = "default_true")]
    pub parallel_copy: bool,
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| EngineError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("TOML serialise error: {e}")))
    }

    /// Rejects values no engine can run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.cpu_threads == Some(0) {
            return Err(EngineError::Config("cpu_threads must be at least 1".into()));
        }
        if let Some(l2) = &self.l2_cache {
            CacheSize::parse(l2)?;
        }
        Ok(())
    }

    /// Resolves the number of worker threads.
    pub fn resolve_threads(&self) -> usize {
        self.resolve_threads_with(&CpuTopology::read())
    }

    /// Resolves the L2 cache size: configured, else probed, else 256 KiB.
    pub fn resolve_l2_cache(&self) -> Result<CacheSize, EngineError> {
        self.resolve_l2_cache_with(&CpuTopology::read())
    }

    pub(crate) fn resolve_threads_with(&self, topology: &CpuTopology) -> usize {
        self.cpu_threads.unwrap_or(topology.online_cores).max(1)
    }

    pub(crate) fn resolve_l2_cache_with(
        &self,
        topology: &CpuTopology,
    ) -> Result<CacheSize, EngineError> {
        match &self.l2_cache {
            Some(s) => CacheSize::parse(s),
            None => Ok(topology
                .l2_cache
                .unwrap_or(CacheSize::from_bytes(FALLBACK_L2_CACHE))),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cpu_threads: None,
            l2_cache: None,
            default_order: Order::RowMajor,
            parallel_copy: true,
        }
    }
}
