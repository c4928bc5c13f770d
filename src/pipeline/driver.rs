// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Pipeline driver
//!
//! Runs the four stages for one sample, in order, stopping at the first
//! failure. Nothing is rolled back: whatever a failed stage left on disk is
//! kept for inspection, and the next invocation classifies it through the
//! validator.

use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::runner::as_millis;
use super::{
    Artifact, PipelineStage, ProgressEvent, ProgressReporter, RunOptions, SessionContext,
    StageOutcome, StageRunner, StageStatus, StageValidator, TracingReporter,
};
use crate::errors::{Read2vecError, Read2vecResult};
use crate::executors::Executor;

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    DirReady,
    BedReady,
    IntersectReady,
    EncodingReady,
    Done,
    Failed,
}

impl PipelineState {
    /// State reached once `stage` has succeeded
    pub fn after(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::PrepareOutputDir => Self::DirReady,
            PipelineStage::ConvertToBed => Self::BedReady,
            PipelineStage::IntersectWithPanel => Self::IntersectReady,
            PipelineStage::EncodeIntersected => Self::EncodingReady,
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub sample: String,
    pub panel: String,
    pub state: PipelineState,
    pub dry_run: bool,
    pub stages: Vec<StageOutcome>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

impl PipelineReport {
    /// Outcome of a given stage, if it ran
    pub fn outcome(&self, stage: PipelineStage) -> Option<&StageOutcome> {
        self.stages.iter().find(|o| o.stage == stage)
    }

    /// Whether every artifact stage reported "already done"
    pub fn all_already_done(&self) -> bool {
        self.stages
            .iter()
            .filter(|o| o.stage != PipelineStage::PrepareOutputDir)
            .all(|o| o.status == StageStatus::AlreadyDone)
    }
}

/// Sequences the stages for a single sample
pub struct PipelineDriver {
    validator: StageValidator,
    executors: HashMap<PipelineStage, Box<dyn Executor>>,
    reporter: Box<dyn ProgressReporter>,
    options: RunOptions,
    state: PipelineState,
}

impl PipelineDriver {
    /// Create a driver with no executors registered
    pub fn new(validator: StageValidator, options: RunOptions) -> Self {
        Self {
            validator,
            executors: HashMap::new(),
            reporter: Box::new(TracingReporter),
            options,
            state: PipelineState::Init,
        }
    }

    /// Register the transformation for an artifact stage
    pub fn register_executor(&mut self, stage: PipelineStage, executor: Box<dyn Executor>) {
        self.executors.insert(stage, executor);
    }

    /// Set the progress reporter
    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run every stage for the session
    pub async fn execute(&mut self, ctx: &SessionContext) -> Read2vecResult<PipelineReport> {
        let start = Instant::now();
        self.state = PipelineState::Init;

        self.reporter.report(&ProgressEvent::PipelineStarted {
            sample: ctx.sample_id().to_string(),
            panel: ctx.panel_id().to_string(),
        });

        let mut stages = Vec::with_capacity(PipelineStage::ALL.len());
        let mut planned: Vec<Artifact> = Vec::new();

        for stage in PipelineStage::ALL {
            self.reporter.report(&ProgressEvent::StageStarted {
                stage,
                headline: stage.headline(ctx.sample_id(), ctx.panel_id()),
            });

            let outcome = match self.run_stage(stage, ctx, &planned).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.state = PipelineState::Failed;
                    self.reporter.report(&ProgressEvent::PipelineFinished {
                        state: self.state,
                        duration: start.elapsed(),
                    });
                    return Err(err);
                }
            };

            if let (StageStatus::Planned(_), Some(output)) = (outcome.status, stage.output()) {
                planned.push(output);
            }

            self.state = PipelineState::after(stage);
            tracing::debug!(state = ?self.state, "state transition");
            stages.push(outcome);
        }

        if !self.options.dry_run {
            self.state = PipelineState::Done;
        }

        let duration = start.elapsed();
        self.reporter.report(&ProgressEvent::PipelineFinished {
            state: self.state,
            duration,
        });

        Ok(PipelineReport {
            sample: ctx.sample_id().to_string(),
            panel: ctx.panel_id().to_string(),
            state: self.state,
            dry_run: self.options.dry_run,
            stages,
            duration,
        })
    }

    async fn run_stage(
        &self,
        stage: PipelineStage,
        ctx: &SessionContext,
        planned: &[Artifact],
    ) -> Read2vecResult<StageOutcome> {
        if stage == PipelineStage::PrepareOutputDir {
            return self.make_dir(ctx).await;
        }

        let executor = self.executors.get(&stage).ok_or_else(|| {
            Read2vecError::transformation(stage.name(), "no transformation registered")
        })?;

        StageRunner::new(&self.validator, self.reporter.as_ref(), &self.options)
            .run(stage, ctx, executor.as_ref(), planned)
            .await
    }

    /// Create the output directory if it does not exist yet
    async fn make_dir(&self, ctx: &SessionContext) -> Read2vecResult<StageOutcome> {
        let start = Instant::now();
        let path = ctx.output_dir().to_path_buf();

        let existed = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => true,
            Ok(_) => {
                let err = Read2vecError::DirectoryCreation {
                    path: path.clone(),
                    error: "a file with this name already exists".into(),
                };
                self.reporter.report(&ProgressEvent::StageFailed {
                    stage: PipelineStage::PrepareOutputDir,
                    message: err.to_string(),
                });
                return Err(err);
            }
            Err(_) => false,
        };

        let status = if existed {
            StageStatus::DirectoryExisted
        } else if self.options.dry_run {
            StageStatus::Planned(super::Decision::StartFresh)
        } else {
            if let Err(e) = tokio::fs::create_dir_all(&path).await {
                let err = Read2vecError::DirectoryCreation {
                    path: path.clone(),
                    error: e.to_string(),
                };
                self.reporter.report(&ProgressEvent::StageFailed {
                    stage: PipelineStage::PrepareOutputDir,
                    message: err.to_string(),
                });
                return Err(err);
            }
            StageStatus::DirectoryCreated
        };

        if !matches!(status, StageStatus::Planned(_)) {
            self.reporter.report(&ProgressEvent::DirectoryReady {
                path: path.clone(),
                created: !existed,
            });
        }

        Ok(StageOutcome {
            stage: PipelineStage::PrepareOutputDir,
            status,
            output: Some(path),
            records: None,
            duration: start.elapsed(),
        })
    }
}
