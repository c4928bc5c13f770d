// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Stage transformations
//!
//! This module provides the executor trait and the three transformations
//! (gMSV to BED, panel intersection, BED to encoding). Each executor reads
//! its predecessor artifact from the session context and writes exactly one
//! output artifact. Output is written to `<artifact>.tmp` and renamed over
//! the artifact only once complete, so a killed run never leaves a long but
//! truncated artifact behind.

mod bed;
mod encoding;
mod gmsv;
mod intersect;

pub use bed::BedRecord;
pub use encoding::{chrom_code, encode_record, BedToEncoding};
pub use gmsv::{cpg_count, GmsvRecord, GmsvToBed};
pub use intersect::{BedtoolsIntersect, BuiltinIntersect, PanelIndex};

#[cfg(all(test, unix))]
pub(crate) use intersect::fake_bedtools;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{IntersectSettings, IntersectTool};
use crate::errors::{Read2vecError, Read2vecResult};
use crate::pipeline::{PipelineStage, SessionContext};

/// Result of a transformation
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Artifact that was written
    pub output: PathBuf,

    /// Records written to it
    pub records: usize,

    /// Execution duration
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn new(output: PathBuf, records: usize, duration: Duration) -> Self {
        Self {
            output,
            records,
            duration,
        }
    }
}

/// Trait for stage transformations
#[async_trait]
pub trait Executor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Read the predecessor artifact and (over)write the output artifact
    async fn execute(&self, ctx: &SessionContext) -> Read2vecResult<ExecutionResult>;
}

/// Locate the reference panel BED for a session
///
/// A panel id naming an existing file is used as-is; otherwise
/// `<panel_dir>/<panel_id>.bed`, with a relative `panel_dir` taken from the
/// input root.
pub fn resolve_panel(ctx: &SessionContext, panel_dir: &Path) -> Read2vecResult<PathBuf> {
    let direct = PathBuf::from(ctx.panel_id());
    if direct.is_file() {
        return Ok(direct);
    }

    let dir = if panel_dir.is_absolute() {
        panel_dir.to_path_buf()
    } else {
        ctx.input_root().join(panel_dir)
    };

    let candidate = dir.join(format!("{}.bed", ctx.panel_id()));
    if candidate.is_file() {
        tracing::debug!(path = %candidate.display(), "resolved reference panel");
        Ok(candidate)
    } else {
        Err(Read2vecError::PanelNotFound {
            panel: ctx.panel_id().to_string(),
            path: candidate,
        })
    }
}

/// Map an I/O failure inside a transformation to a stage error
pub(crate) fn io_failure(stage: PipelineStage, path: &Path, e: std::io::Error) -> Read2vecError {
    Read2vecError::transformation(stage.name(), format!("{}: {}", path.display(), e))
}

/// Scratch file an executor writes before its artifact is complete
pub(crate) fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    output.with_file_name(name)
}

/// Rename a finished scratch file over its artifact, or remove it on failure
pub(crate) async fn finish<T>(
    stage: PipelineStage,
    partial: &Path,
    output: &Path,
    written: Read2vecResult<T>,
) -> Read2vecResult<T> {
    match written {
        Ok(value) => {
            tokio::fs::rename(partial, output)
                .await
                .map_err(|e| io_failure(stage, output, e))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = tokio::fs::remove_file(partial).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %partial.display(), error = %e, "could not remove scratch file");
                }
            }
            Err(err)
        }
    }
}

/// Run synchronous file work off the async runtime
pub(crate) async fn run_blocking<T, F>(stage: PipelineStage, work: F) -> Read2vecResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Read2vecResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Read2vecError::transformation(stage.name(), format!("worker task failed: {}", e)))?
}

/// Create the executors for every artifact stage
pub fn create_default_executors(
    intersect: &IntersectSettings,
) -> Vec<(PipelineStage, Box<dyn Executor>)> {
    let intersect_executor: Box<dyn Executor> = match intersect.tool {
        IntersectTool::Bedtools => Box::new(BedtoolsIntersect::new(intersect)),
        IntersectTool::Builtin => Box::new(BuiltinIntersect::new(intersect)),
    };

    vec![
        (PipelineStage::ConvertToBed, Box::new(GmsvToBed::new())),
        (PipelineStage::IntersectWithPanel, intersect_executor),
        (PipelineStage::EncodeIntersected, Box::new(BedToEncoding::new())),
    ]
}
