// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! # read2vec - resumable methylation-variant encoding pipeline
//!
//! `read2vec` turns one sample's gMSV report into the positional encoding
//! consumed by downstream imputation models:
//!
//! ```text
//! <root>/<sample>/07.gMSV/<sample>.gMSV
//!   -> <root>/08.read2vec/<sample>.gMSV2bed.bed      (ConvertToBed)
//!   -> <root>/08.read2vec/<sample>.intersected.bed   (IntersectWithPanel)
//!   -> <root>/08.read2vec/<sample>.Encoding.txt      (EncodeIntersected)
//! ```
//!
//! Before each stage the output and its input are checked on disk. Complete
//! outputs are skipped, truncated ones are regenerated, and a stage whose
//! input is incomplete stops the run with a diagnostic naming that input.
//! Re-running after a crash is therefore always safe.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run (or resume) sample S01 against the 1kg panel
//! read2vec /data/run1 S01 1kg
//!
//! # See what would happen
//! read2vec --dry-run /data/run1 S01 1kg
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod executors;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use errors::{Read2vecError, Read2vecResult};
pub use pipeline::{PipelineDriver, PipelineReport, PipelineStage, SessionContext, Verdict};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
