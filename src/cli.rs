// SPDX-License-Identifier: Apache-2.0

//! Command-line surface (spec §6): `compile` and `run`, each taking a
//! plate path plus the discovery/config inputs needed to reach it, plus
//! `schema` for exporting the global config document's JSON Schema. The
//! spec's literal minimum (`--well-filter`, `--config`, `--workers`) is
//! supplemented with `--pipeline FILE`, since nothing else on the CLI
//! names where the step list itself comes from.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "openhcs", about = "High-content microscopy pipeline compiler and execution engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile a pipeline against a plate and print a JSON summary.
    Compile {
        /// Path to the plate root.
        path: PathBuf,
        /// Path to the pipeline definition (YAML or JSON).
        #[arg(long)]
        pipeline: PathBuf,
        /// Path to the global config document (YAML or JSON).
        #[arg(long)]
        config: PathBuf,
        /// Restrict compilation to these units (e.g. well ids), comma-separated.
        #[arg(long, value_delimiter = ',')]
        well_filter: Option<Vec<String>>,
    },
    /// Compile a pipeline against a plate, then execute it.
    Run {
        /// Path to the plate root.
        path: PathBuf,
        /// Path to the pipeline definition (YAML or JSON).
        #[arg(long)]
        pipeline: PathBuf,
        /// Path to the global config document (YAML or JSON).
        #[arg(long)]
        config: PathBuf,
        /// Restrict execution to these units (e.g. well ids), comma-separated.
        #[arg(long, value_delimiter = ',')]
        well_filter: Option<Vec<String>>,
        /// Overrides the config's `num_workers`.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print the JSON Schema for the global config document.
    Schema,
}
