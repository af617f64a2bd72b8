// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-rt
//!
//! Command-line interface for the strided tensor engine.
//!
//! ## Usage
//! ```bash
//! # Time tiled matrix products
//! tensor-rt bench mm --sizes 128,256,512 --threads 4
//!
//! # Time the copy paths on a 3-D tensor
//! tensor-rt bench copy --shape 512,512,8
//!
//! # Show how a layout is walked
//! tensor-rt inspect --shape 2,3,4 --strides 1,8,2
//!
//! # Show the resolved engine configuration
//! tensor-rt --config engine.toml status
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tensor-rt",
    about = "Strided N-dimensional tensor engine tools",
    version,
    author
)]
struct Cli {
    /// Path to a TOML engine configuration file.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Time engine kernels.
    Bench {
        #[command(subcommand)]
        target: BenchTarget,
    },

    /// Print the flags, fast order and run structure of a layout.
    Inspect {
        /// Comma-separated dimensions (e.g., "2,3,4").
        #[arg(short, long)]
        shape: String,

        /// Comma-separated strides; dense row-major when omitted.
        #[arg(long)]
        strides: Option<String>,

        /// Offset of the first element.
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Display the host topology and the resolved engine configuration.
    Status,
}

#[derive(Subcommand)]
enum BenchTarget {
    /// Square matrix products of each size.
    Mm {
        /// Comma-separated matrix edges.
        #[arg(long, default_value = "128,256")]
        sizes: String,

        /// Worker threads (overrides the configuration).
        #[arg(short, long)]
        threads: Option<usize>,

        /// Timed runs per size; the best is reported.
        #[arg(short, long, default_value_t = 3)]
        repeats: usize,
    },

    /// Same-layout, tiled and direct copies of one tensor.
    Copy {
        /// Comma-separated dimensions.
        #[arg(short, long, default_value = "512,512,8")]
        shape: String,

        /// Timed runs per path; the best is reported.
        #[arg(short, long, default_value_t = 3)]
        repeats: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Bench { target } => match target {
            BenchTarget::Mm {
                sizes,
                threads,
                repeats,
            } => commands::bench::execute_mm(config, &sizes, threads, repeats),
            BenchTarget::Copy { shape, repeats } => {
                commands::bench::execute_copy(config, &shape, repeats)
            }
        },
        Commands::Inspect {
            shape,
            strides,
            offset,
        } => commands::inspect::execute(&shape, strides.as_deref(), offset),
        Commands::Status => commands::status::execute(config),
    }
}
