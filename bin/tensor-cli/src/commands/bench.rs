// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tensor-rt bench` command: wall-clock timings of the matmul and copy
//! kernels on one configured engine.

use super::parse_list;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tensor_engine::{AskOrder, Engine, EngineConfig, Shape, Tensor};

pub fn execute_mm(
    mut config: EngineConfig,
    sizes: &str,
    threads: Option<usize>,
    repeats: usize,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           tensor-rt · Matmul Benchmark              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let sizes = parse_list(sizes, "size")?;
    if sizes.is_empty() {
        anyhow::bail!("no matrix sizes given");
    }
    if threads.is_some() {
        config.cpu_threads = threads;
    }
    let engine = Engine::new(config)?;
    let blocking = engine.blocking().matmul::<f64>();

    println!("  Threads:    {}", engine.threads());
    println!("  L2 cache:   {}", engine.l2_cache());
    println!(
        "  Blocking:   tile {}, reduction chunk {}",
        blocking.inner_tile, blocking.vector_chunk,
    );
    println!();

    // ── Results Table ──────────────────────────────────────────
    println!("  {:>8} {:>12} {:>12}", "Size", "Best ms", "GFLOP/s");
    println!("  {}", "-".repeat(34));

    let mut rng = StdRng::seed_from_u64(0x5eed);
    for &n in &sizes {
        let a = engine.random::<f64, _>(Shape::matrix(n, n), &mut rng, AskOrder::RowMajor);
        let b = engine.random::<f64, _>(Shape::matrix(n, n), &mut rng, AskOrder::ColMajor);

        // warm-up fills the pool and the caches
        a.mm(&b, AskOrder::RowMajor)?;
        let best = best_of(repeats, || a.mm(&b, AskOrder::RowMajor).map(drop))?;

        let secs = best.as_secs_f64();
        let flops = 2.0 * (n as f64).powi(3);
        let gflops = if secs > 0.0 { flops / secs / 1e9 } else { 0.0 };
        println!("  {:>8} {:>12.3} {:>12.2}", n, secs * 1000.0, gflops);
    }
    println!();

    Ok(())
}

pub fn execute_copy(config: EngineConfig, shape: &str, repeats: usize) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           tensor-rt · Copy Benchmark                ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let shape = Shape::new(parse_list(shape, "dimension")?);
    let tiled = Engine::new(EngineConfig {
        parallel_copy: true,
        ..config.clone()
    })?;
    let direct = Engine::new(EngineConfig {
        parallel_copy: false,
        ..config
    })?;
    let bytes = shape.size() * std::mem::size_of::<f64>();

    println!("  Shape:      {shape}");
    println!("  Threads:    {}", tiled.threads());
    println!(
        "  Tile limit: {} elements",
        tiled.blocking().copy_limit::<f64>(),
    );
    println!();

    // ── Results Table ──────────────────────────────────────────
    println!("  {:<16} {:>12} {:>12}", "Path", "Best ms", "GB/s");
    println!("  {}", "-".repeat(42));

    let src = tiled.seq::<f64>(shape.clone(), AskOrder::RowMajor);
    let runs: [(&str, Tensor<f64>, AskOrder); 3] = [
        ("same-layout", src.clone(), AskOrder::RowMajor),
        ("tiled", src.clone(), AskOrder::ColMajor),
        (
            "direct",
            direct.seq::<f64>(shape.clone(), AskOrder::RowMajor),
            AskOrder::ColMajor,
        ),
    ];
    for (label, tensor, ask) in &runs {
        tensor.copy(*ask)?;
        let best = best_of(repeats, || tensor.copy(*ask).map(drop))?;
        let secs = best.as_secs_f64();
        let rate = if secs > 0.0 {
            bytes as f64 / secs / 1e9
        } else {
            0.0
        };
        println!("  {:<16} {:>12.3} {:>12.2}", label, secs * 1000.0, rate);
    }
    println!();

    Ok(())
}

/// Fastest of `repeats` timed runs (at least one).
fn best_of<E>(repeats: usize, mut run: impl FnMut() -> Result<(), E>) -> Result<Duration, E> {
    let mut best = Duration::MAX;
    for _ in 0..repeats.max(1) {
        let start = Instant::now();
        run()?;
        best = best.min(start.elapsed());
    }
    Ok(best)
}
