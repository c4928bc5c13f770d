// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! CLI definition and handler
//!
//! Defines the command-line interface for read2vec.

pub mod run;

use clap::Parser;
use std::path::PathBuf;

use crate::config::{IntersectTool, Overrides};

/// Resumable gMSV to encoding pipeline
///
/// Converts one sample's gMSV report to BED, intersects it with a reference
/// panel and writes the encoding input. Completed stages are detected and
/// skipped, so an interrupted run can simply be started again.
#[derive(Parser, Debug)]
#[clap(
    name = "read2vec",
    version,
    about = "Resumable gMSV to BED to encoding pipeline for one sample",
    long_about = None,
    after_help = "Examples:\n\
        read2vec /data/run1 S01 1kg_panel               Run or resume sample S01\n\
        read2vec --dry-run /data/run1 S01 1kg_panel     Show what would run\n\
        read2vec --intersect-tool builtin /data/run1 S01 panels/custom.bed\n\n\
        Outputs are written to <INPUT_ROOT>/08.read2vec/."
)]
pub struct Cli {
    /// Input root holding the sample directories
    #[clap(value_name = "INPUT_ROOT")]
    pub input_root: PathBuf,

    /// Sample identifier (used as the file name stem)
    #[clap(value_name = "SAMPLE_ID")]
    pub sample_id: String,

    /// Reference panel name or path to a panel BED file
    #[clap(value_name = "REFERENCE_PANEL")]
    pub reference_panel: String,

    /// Settings file (YAML or TOML)
    #[clap(short, long, env = "READ2VEC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Lines an artifact needs to count as complete
    #[clap(long, value_name = "N")]
    pub min_lines: Option<usize>,

    /// Intersection implementation
    #[clap(long, value_name = "TOOL", value_parser = ["bedtools", "builtin"])]
    pub intersect_tool: Option<String>,

    /// Path to the bedtools binary
    #[clap(long, env = "READ2VEC_BEDTOOLS", value_name = "PATH")]
    pub bedtools: Option<PathBuf>,

    /// Regenerate outputs even when they look complete
    #[clap(long)]
    pub force: bool,

    /// Show what each stage would do without writing anything
    #[clap(long)]
    pub dry_run: bool,

    /// Print the run report as JSON instead of narration
    #[clap(long)]
    pub json: bool,

    /// Enable verbose output
    #[clap(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Settings overrides carried by the flags
    pub fn overrides(&self) -> Overrides {
        Overrides {
            min_lines: self.min_lines,
            intersect_tool: self
                .intersect_tool
                .as_deref()
                .and_then(|t| t.parse::<IntersectTool>().ok()),
            bedtools: self.bedtools.clone(),
        }
    }
}
