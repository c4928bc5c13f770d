// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Progress reporting
//!
//! The driver and stage runner never print directly. They emit
//! [`ProgressEvent`]s to an injected [`ProgressReporter`], so narration can
//! go to a terminal, to the log only, or into a test recorder.

use colored::Colorize;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use super::{Decision, PipelineStage, PipelineState};
use crate::utils::{self, create_spinner};

/// Something that happened during a run
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    PipelineStarted {
        sample: String,
        panel: String,
    },
    StageStarted {
        stage: PipelineStage,
        headline: String,
    },
    DirectoryReady {
        path: PathBuf,
        created: bool,
    },
    AlreadyDone {
        stage: PipelineStage,
        output: PathBuf,
    },
    Decided {
        stage: PipelineStage,
        decision: Decision,
        output: PathBuf,
    },
    TransformStarted {
        stage: PipelineStage,
    },
    StageCompleted {
        stage: PipelineStage,
        records: usize,
        duration: Duration,
    },
    StageFailed {
        stage: PipelineStage,
        message: String,
    },
    PipelineFinished {
        state: PipelineState,
        duration: Duration,
    },
}

/// Observer for pipeline progress
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Sends every event to `tracing` only
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: &ProgressEvent) {
        log_event(event);
    }
}

fn log_event(event: &ProgressEvent) {
    match event {
        ProgressEvent::PipelineStarted { sample, panel } => {
            tracing::info!(%sample, %panel, "pipeline started");
        }
        ProgressEvent::StageStarted { stage, .. } => {
            tracing::info!(%stage, "stage started");
        }
        ProgressEvent::DirectoryReady { path, created } => {
            tracing::info!(path = %path.display(), created, "output directory ready");
        }
        ProgressEvent::AlreadyDone { stage, output } => {
            tracing::info!(%stage, output = %output.display(), "already done");
        }
        ProgressEvent::Decided {
            stage,
            decision,
            output,
        } => {
            tracing::info!(%stage, ?decision, output = %output.display(), "stage will run");
        }
        ProgressEvent::TransformStarted { stage } => {
            tracing::debug!(%stage, "transformation started");
        }
        ProgressEvent::StageCompleted {
            stage,
            records,
            duration,
        } => {
            tracing::info!(%stage, records, elapsed_ms = duration.as_millis() as u64, "stage completed");
        }
        // The error itself is rendered once, as the diagnostic on exit
        ProgressEvent::StageFailed { stage, message } => {
            tracing::debug!(%stage, %message, "stage failed");
        }
        ProgressEvent::PipelineFinished { state, duration } => {
            tracing::info!(?state, elapsed_ms = duration.as_millis() as u64, "pipeline finished");
        }
    }
}

/// Human-readable narration for an operator watching a long run
pub struct ConsoleReporter {
    spinner: Mutex<Option<ProgressBar>>,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        if !utils::should_use_colors() {
            colored::control::set_override(false);
        }

        Self {
            spinner: Mutex::new(None),
            verbose,
        }
    }

    fn file_name(path: &std::path::Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string())
    }

    fn stop_spinner(&self) {
        if let Ok(mut guard) = self.spinner.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: &ProgressEvent) {
        log_event(event);

        match event {
            ProgressEvent::PipelineStarted { sample, panel } => {
                utils::print_header(&format!("read2vec: {} against {}", sample, panel));
            }
            ProgressEvent::StageStarted { headline, .. } => {
                println!();
                println!("<{}>", headline.bold());
            }
            ProgressEvent::DirectoryReady { path, created } => {
                if *created {
                    utils::print_success(&format!("Created {}", path.display()));
                } else {
                    utils::print_info(&format!("{} already exists", path.display()));
                }
            }
            ProgressEvent::AlreadyDone { output, .. } => {
                utils::print_success(&format!(
                    "{} is already done {}",
                    Self::file_name(output),
                    "(skipped)".dimmed()
                ));
            }
            ProgressEvent::Decided {
                decision, output, ..
            } => {
                let name = Self::file_name(output);
                match decision {
                    Decision::Resume => utils::print_warning(&format!(
                        "{} is incomplete, resuming from a previous run",
                        name
                    )),
                    Decision::StartFresh => {
                        utils::print_info(&format!("{} does not exist yet, starting fresh", name))
                    }
                    Decision::Regenerate => {
                        utils::print_info(&format!("Regenerating {} (forced)", name))
                    }
                    Decision::AlreadyDone => {}
                }
            }
            ProgressEvent::TransformStarted { stage } => {
                let pb = create_spinner(&format!("Running {}...", stage));
                if let Ok(mut guard) = self.spinner.lock() {
                    *guard = Some(pb);
                }
            }
            ProgressEvent::StageCompleted {
                records, duration, ..
            } => {
                self.stop_spinner();
                let detail = if self.verbose {
                    format!(
                        "Wrote {} record{} ({:.2}s)",
                        records,
                        if *records == 1 { "" } else { "s" },
                        duration.as_secs_f64()
                    )
                } else {
                    format!("Done ({:.2}s)", duration.as_secs_f64())
                };
                utils::print_success(&detail);
            }
            ProgressEvent::StageFailed { stage, .. } => {
                self.stop_spinner();
                utils::print_error(&format!("{} failed", stage));
            }
            ProgressEvent::PipelineFinished { state, duration } => {
                println!();
                if *state == PipelineState::Done {
                    println!(
                        "{}",
                        format!(
                            "All processes completed successfully! ({:.2}s)",
                            duration.as_secs_f64()
                        )
                        .green()
                        .bold()
                    );
                } else if *state == PipelineState::Failed {
                    eprintln!(
                        "{}",
                        format!("Pipeline failed after {:.2}s", duration.as_secs_f64()).red()
                    );
                } else {
                    println!("{}", "Dry run finished, nothing was written.".dimmed());
                }
            }
        }
    }
}

/// Keeps every event for later assertions
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub(crate) fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn decisions(&self) -> Vec<(PipelineStage, Decision)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::AlreadyDone { stage, .. } => Some((stage, Decision::AlreadyDone)),
                ProgressEvent::Decided {
                    stage, decision, ..
                } => Some((stage, decision)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl ProgressReporter for RecordingReporter {
    fn report(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
