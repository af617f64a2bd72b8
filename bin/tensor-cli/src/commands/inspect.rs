// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tensor-rt inspect` command: show how a strided layout is classified and
//! which runs the kernels walk for each order.

use super::parse_list;
use tensor_core::{AskOrder, Order, Shape, StrideChunkDescriptor, StrideLayout};

/// Run starts printed per order before eliding the rest.
const SHOWN_CHUNKS: usize = 8;

pub fn execute(shape: &str, strides: Option<&str>, offset: usize) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           tensor-rt · Layout Inspection             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let layout = build_layout(shape, strides, offset)?;

    // ── Layout ─────────────────────────────────────────────────
    println!("  Layout");
    println!("   Shape:        {}", layout.shape());
    println!("   Strides:      {:?}", layout.strides());
    println!("   Offset:       {}", layout.offset());
    println!("   Size:         {}", layout.size());
    match layout.max_pointer() {
        Some(p) => println!("   Storage need: {} elements", p + 1),
        None => println!("   Storage need: 0 elements (empty)"),
    }
    println!();

    // ── Flags ──────────────────────────────────────────────────
    println!("  Flags");
    println!("   C-ordered:    {}", yes_no(layout.is_c_ordered()));
    println!("   F-ordered:    {}", yes_no(layout.is_f_ordered()));
    println!("   Dense:        {}", yes_no(layout.is_dense()));
    match layout.storage_fast_order() {
        Some(order) => println!("   Fast order:   {order}"),
        None => println!("   Fast order:   none (engine default applies)"),
    }
    println!();

    // ── Runs ───────────────────────────────────────────────────
    println!(
        "  {:<12} {:>8} {:>8} {:>8}   {}",
        "Order", "Runs", "Step", "Length", "Run starts",
    );
    println!("  {}", "-".repeat(60));
    for ask in [AskOrder::RowMajor, AskOrder::ColMajor, AskOrder::Storage] {
        let descriptor = StrideChunkDescriptor::of(&layout, ask);
        println!(
            "  {:<12} {:>8} {:>8} {:>8}   {}",
            ask.to_string(),
            descriptor.chunk_count(),
            descriptor.loop_step(),
            descriptor.loop_size(),
            starts(descriptor.chunk_offsets()),
        );
    }
    println!();

    let compact = layout.compute_fortran_layout(AskOrder::from(Order::RowMajor), true);
    println!("  Compacted (row-major): {compact}");
    println!();

    Ok(())
}

fn build_layout(shape: &str, strides: Option<&str>, offset: usize) -> anyhow::Result<StrideLayout> {
    let shape = Shape::new(parse_list(shape, "dimension")?);
    let layout = match strides {
        Some(strides) => StrideLayout::of(shape, offset, parse_list(strides, "stride")?)?,
        None => StrideLayout::of_dense(shape, offset, Order::RowMajor),
    };
    Ok(layout)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn starts(offsets: &[usize]) -> String {
    let shown: Vec<String> = offsets
        .iter()
        .take(SHOWN_CHUNKS)
        .map(usize::to_string)
        .collect();
    let mut text = shown.join(", ");
    if offsets.len() > SHOWN_CHUNKS {
        text.push_str(&format!(", … ({} more)", offsets.len() - SHOWN_CHUNKS));
    }
    text
}
