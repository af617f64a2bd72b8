// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the tiled matrix multiply and dot kernel.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tensor_engine::{AskOrder, Engine, EngineConfig, Shape};

fn bench_mm(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let mut group = c.benchmark_group("mm");
    for n in [64usize, 128, 256] {
        let a = engine.random::<f64, _>(Shape::matrix(n, n), &mut rng, AskOrder::RowMajor);
        let b = engine.random::<f64, _>(Shape::matrix(n, n), &mut rng, AskOrder::ColMajor);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
            bench.iter(|| a.mm(black_box(&b), AskOrder::RowMajor).unwrap())
        });
    }
    group.finish();
}

fn bench_vdot(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let x = engine.seq::<f32>(Shape::vector(1 << 16), AskOrder::RowMajor);
    let y = engine.full(Shape::vector(1 << 16), 0.5f32, AskOrder::RowMajor);
    c.bench_function("vdot_65536_f32", |b| {
        b.iter(|| x.vdot(black_box(&y)).unwrap())
    });
}

criterion_group!(benches, bench_mm, bench_vdot);
criterion_main!(benches);
