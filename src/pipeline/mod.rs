// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Resumable pipeline
//!
//! This module holds the session context, the fixed stage definitions, the
//! artifact validator, the per-stage runner and the driver that sequences
//! them.

mod context;
mod driver;
mod reporter;
mod runner;
mod stage;
mod validator;

pub use context::SessionContext;
pub use driver::{PipelineDriver, PipelineReport, PipelineState};
pub use reporter::{ConsoleReporter, ProgressEvent, ProgressReporter, TracingReporter};
pub use runner::{Decision, RunOptions, StageOutcome, StageRunner, StageStatus};
pub use stage::{Artifact, PipelineStage};
pub use validator::{count_lines, StageValidator, Verdict};

#[cfg(test)]
pub(crate) use reporter::RecordingReporter;
