// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tensor-rt status` command: host topology, resolved engine settings and
//! the block sizes they produce.
//!
//! Topology comes from sysfs; on hosts that do not expose it the command
//! still works and shows the fallbacks.

use tensor_engine::{CpuTopology, Engine, EngineConfig, FALLBACK_L2_CACHE};

pub fn execute(config: EngineConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           tensor-rt · Engine Status                 ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let topology = CpuTopology::read();

    // ── Host ───────────────────────────────────────────────────
    println!("  Host");
    println!("   Online cores: {}", topology.online_cores);
    match topology.l2_cache {
        Some(l2) => println!("   L2 cache:     {l2}"),
        None => println!("   L2 cache:     not reported (fallback {FALLBACK_L2_CACHE} bytes)"),
    }
    println!();

    let engine = Engine::new(config)?;

    // ── Engine ─────────────────────────────────────────────────
    println!("  Engine");
    println!("   Threads:      {}", engine.threads());
    println!("   L2 cache:     {}", engine.l2_cache());
    println!("   Order:        {}", engine.default_order());
    println!("   Tiled copy:   {}", if engine.parallel_copy() { "on" } else { "off" });
    println!();

    // ── Blocking ───────────────────────────────────────────────
    let blocking = engine.blocking();
    println!(
        "  {:<8} {:>8} {:>14} {:>8} {:>12}",
        "Type", "Chunk", "Vector chunk", "Tile", "Copy limit",
    );
    println!("  {}", "-".repeat(54));
    let f32_mm = blocking.matmul::<f32>();
    println!(
        "  {:<8} {:>8} {:>14} {:>8} {:>12}",
        "f32",
        f32_mm.chunk,
        f32_mm.vector_chunk,
        f32_mm.inner_tile,
        blocking.copy_limit::<f32>(),
    );
    let f64_mm = blocking.matmul::<f64>();
    println!(
        "  {:<8} {:>8} {:>14} {:>8} {:>12}",
        "f64",
        f64_mm.chunk,
        f64_mm.vector_chunk,
        f64_mm.inner_tile,
        blocking.copy_limit::<f64>(),
    );
    println!();

    // ── Configuration ──────────────────────────────────────────
    println!("  Configuration (TOML)");
    for line in engine.config().to_toml()?.lines() {
        println!("   {line}");
    }
    println!();

    Ok(())
}
