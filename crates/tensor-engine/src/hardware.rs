// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CPU topology probing via `/sys/devices/system/cpu/`.
//!
//! Reads:
//! - `online` — online core range list (e.g. `"0-3,6"`).
//! - `cpu0/cache/index*/{level,size}` — per-level cache sizes of core 0.
//!
//! Missing files degrade to fallbacks: `available_parallelism()` for the core
//! count and `None` for the L2 size.

use crate::{CacheSize, EngineError};
use std::path::{Path, PathBuf};

/// Base sysfs path for CPU information.
const CPU_BASE: &str = "/sys/devices/system/cpu";

/// What the engine needs to know about the host CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CpuTopology {
    /// Number of online cores, at least 1.
    pub online_cores: usize,
    /// Size of the L2 cache of core 0, when reported.
    pub l2_cache: Option<CacheSize>,
}

impl CpuTopology {
    /// Probes the host.
    pub fn read() -> Self {
        Self::read_from(Path::new(CPU_BASE))
    }

    /// Probes a sysfs-like tree rooted at `base`.
    pub(crate) fn read_from(base: &Path) -> Self {
        let online_cores = match read_online_cores(base) {
            Ok(Some(count)) => count,
            Ok(None) => fallback_cores(),
            Err(e) => {
                tracing::warn!("{e}; falling back to available parallelism");
                fallback_cores()
            }
        };
        let l2_cache = match read_cache_size(base, 2) {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!("{e}; L2 cache size unknown");
                None
            }
        };
        Self {
            online_cores,
            l2_cache,
        }
    }
}

fn fallback_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Reads a sysfs file and returns its trimmed content, or `None` if absent.
fn read_sysfs_file(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}

fn read_online_cores(base: &Path) -> Result<Option<usize>, EngineError> {
    let path = base.join("online");
    let Some(content) = read_sysfs_file(&path) else {
        return Ok(None);
    };
    parse_cpu_range(&content)
        .map(Some)
        .ok_or_else(|| EngineError::Probe {
            path,
            detail: format!("expected a cpu range list, got '{content}'"),
        })
}

/// Scans `cpu0/cache/index*` for the entry whose `level` equals `level`.
fn read_cache_size(base: &Path, level: u32) -> Result<Option<CacheSize>, EngineError> {
    let cache_dir = base.join("cpu0").join("cache");
    let Ok(entries) = std::fs::read_dir(&cache_dir) else {
        return Ok(None);
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with("index"))
                .unwrap_or(false)
        })
        .collect();
    dirs.sort();

    for dir in dirs {
        let level_path = dir.join("level");
        let Some(level_str) = read_sysfs_file(&level_path) else {
            continue;
        };
        let found: u32 = level_str.parse().map_err(|_| EngineError::Probe {
            path: level_path.clone(),
            detail: format!("expected integer cache level, got '{level_str}'"),
        })?;
        if found != level {
            continue;
        }
        let size_path = dir.join("size");
        let Some(size_str) = read_sysfs_file(&size_path) else {
            continue;
        };
        let size = CacheSize::parse(&size_str).map_err(|e| EngineError::Probe {
            path: size_path,
            detail: e.to_string(),
        })?;
        return Ok(Some(size));
    }
    Ok(None)
}

/// Parses a CPU range string like `"0-3"` → 4, `"0"` → 1, `"0,2-3"` → 3.
fn parse_cpu_range(s: &str) -> Option<usize> {
    let mut total = 0usize;
    for part in s.split(',') {
        let part = part.trim();
        if let Some((start_s, end_s)) = part.split_once('-') {
            let start: usize = start_s.trim().parse().ok()?;
            let end: usize = end_s.trim().parse().ok()?;
            total += end.checked_sub(start)? + 1;
        } else {
            let _: usize = part.parse().ok()?;
            total += 1;
        }
    }
    (total > 0).then_some(total)
}
