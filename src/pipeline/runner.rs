// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Stage runner
//!
//! Decides, for one stage, whether to skip, (re)run or fail, based on the
//! verdicts of its output and predecessor artifacts.
//!
//! | output verdict          | predecessor  | result                        |
//! |-------------------------|--------------|-------------------------------|
//! | sufficient              | not checked  | already done                  |
//! | insufficient            | sufficient   | resume (overwrite output)     |
//! | missing / unreadable    | sufficient   | start fresh                   |
//! | anything but sufficient | insufficient, missing, unreadable | fail     |
//!
//! The predecessor is gated in every branch that runs a transformation, so a
//! fresh run with no input fails with a diagnostic that names the input.

use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::{
    Artifact, PipelineStage, ProgressEvent, ProgressReporter, SessionContext, StageValidator,
    Verdict,
};
use crate::errors::{Read2vecError, Read2vecResult};
use crate::executors::Executor;

/// What a stage will do, given its output verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Output is complete; nothing to do
    AlreadyDone,
    /// Output exists but is short; a previous run was interrupted
    Resume,
    /// Output does not exist (or cannot be read)
    StartFresh,
    /// Output is complete but regeneration was requested
    Regenerate,
}

impl Decision {
    /// Map an output verdict to a decision
    pub fn for_output(verdict: Verdict, force: bool) -> Self {
        match verdict {
            Verdict::Sufficient if force => Self::Regenerate,
            Verdict::Sufficient => Self::AlreadyDone,
            Verdict::Insufficient => Self::Resume,
            Verdict::Missing | Verdict::Unreadable => Self::StartFresh,
        }
    }

    pub fn runs_transformation(&self) -> bool {
        !matches!(self, Self::AlreadyDone)
    }
}

/// Final status of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    DirectoryCreated,
    DirectoryExisted,
    AlreadyDone,
    Resumed,
    Created,
    Regenerated,
    /// Dry run: the decision that would have been acted on
    Planned(Decision),
}

/// Result of running one stage
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: PipelineStage,
    pub status: StageStatus,
    pub output: Option<PathBuf>,
    pub records: Option<usize>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

pub(super) fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Per-run switches
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Regenerate outputs that are already complete
    pub force: bool,
    /// Evaluate decisions without writing anything
    pub dry_run: bool,
}

/// Composes the validator and a transformation for a single stage
pub struct StageRunner<'a> {
    validator: &'a StageValidator,
    reporter: &'a dyn ProgressReporter,
    options: &'a RunOptions,
}

impl<'a> StageRunner<'a> {
    pub fn new(
        validator: &'a StageValidator,
        reporter: &'a dyn ProgressReporter,
        options: &'a RunOptions,
    ) -> Self {
        Self {
            validator,
            reporter,
            options,
        }
    }

    /// Run a stage that produces an artifact
    ///
    /// `planned` lists artifacts a dry run has already scheduled for
    /// production; they stand in for a sufficient predecessor.
    pub async fn run(
        &self,
        stage: PipelineStage,
        ctx: &SessionContext,
        executor: &dyn Executor,
        planned: &[Artifact],
    ) -> Read2vecResult<StageOutcome> {
        let (Some(output), Some(predecessor)) = (stage.output(), stage.predecessor()) else {
            return Err(Read2vecError::transformation(
                stage.name(),
                "stage has no artifacts to run",
            ));
        };

        let start = Instant::now();
        let output_path = ctx.artifact_path(output);
        let verdict = self.validator.validity(output, ctx).await;
        let decision = Decision::for_output(verdict, self.options.force);

        if !decision.runs_transformation() {
            self.reporter.report(&ProgressEvent::AlreadyDone {
                stage,
                output: output_path.clone(),
            });
            return Ok(StageOutcome {
                stage,
                status: StageStatus::AlreadyDone,
                output: Some(output_path),
                records: None,
                duration: start.elapsed(),
            });
        }

        let predecessor_verdict = if planned.contains(&predecessor) {
            Verdict::Sufficient
        } else {
            self.validator.validity(predecessor, ctx).await
        };

        if !predecessor_verdict.is_sufficient() {
            let err = Read2vecError::predecessor_invalid(
                stage.name(),
                ctx.artifact_path(predecessor),
                predecessor_verdict,
            );
            self.reporter.report(&ProgressEvent::StageFailed {
                stage,
                message: err.to_string(),
            });
            return Err(err);
        }

        self.reporter.report(&ProgressEvent::Decided {
            stage,
            decision,
            output: output_path.clone(),
        });

        if self.options.dry_run {
            return Ok(StageOutcome {
                stage,
                status: StageStatus::Planned(decision),
                output: Some(output_path),
                records: None,
                duration: start.elapsed(),
            });
        }

        self.reporter.report(&ProgressEvent::TransformStarted { stage });

        let result = match executor.execute(ctx).await {
            Ok(result) => result,
            Err(err) => {
                self.reporter.report(&ProgressEvent::StageFailed {
                    stage,
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        self.reporter.report(&ProgressEvent::StageCompleted {
            stage,
            records: result.records,
            duration: result.duration,
        });

        let status = match decision {
            Decision::Resume => StageStatus::Resumed,
            Decision::Regenerate => StageStatus::Regenerated,
            _ => StageStatus::Created,
        };

        Ok(StageOutcome {
            stage,
            status,
            output: Some(result.output),
            records: Some(result.records),
            duration: start.elapsed(),
        })
    }
}
