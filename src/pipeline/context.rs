// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Per-invocation session context
//!
//! Built once from the command line and never mutated afterwards.

use std::path::{Path, PathBuf};

use super::Artifact;
use crate::config::Layout;
use crate::errors::{Read2vecError, Read2vecResult};

/// Immutable identity and paths for one sample run
#[derive(Debug, Clone)]
pub struct SessionContext {
    sample_id: String,
    panel_id: String,
    input_root: PathBuf,
    sample_input_dir: PathBuf,
    gmsv_report_dir: PathBuf,
    output_dir: PathBuf,
    gmsv_subdir: String,
}

impl SessionContext {
    /// Create a context, rejecting sample ids that are not plain file stems
    pub fn new(
        input_root: impl Into<PathBuf>,
        sample_id: &str,
        panel_id: &str,
        layout: &Layout,
    ) -> Read2vecResult<Self> {
        validate_sample_id(sample_id)?;
        if panel_id.trim().is_empty() {
            return Err(Read2vecError::Usage {
                message: "reference panel id must not be empty".into(),
            });
        }

        let input_root = input_root.into();

        Ok(Self {
            sample_id: sample_id.to_string(),
            panel_id: panel_id.to_string(),
            sample_input_dir: input_root.join(sample_id),
            gmsv_report_dir: input_root.join(&layout.report_dir),
            output_dir: input_root.join(&layout.output_dir),
            gmsv_subdir: layout.gmsv_subdir.clone(),
            input_root,
        })
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn panel_id(&self) -> &str {
        &self.panel_id
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    pub fn sample_input_dir(&self) -> &Path {
        &self.sample_input_dir
    }

    pub fn gmsv_report_dir(&self) -> &Path {
        &self.gmsv_report_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolve the on-disk path of an artifact
    ///
    /// Re-evaluated on every call: the source report may appear in either
    /// location between runs.
    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        let file_name = artifact.file_name(&self.sample_id);
        match artifact {
            Artifact::GmsvSource => self.gmsv_source_path(&file_name),
            _ => self.output_dir.join(file_name),
        }
    }

    fn gmsv_source_path(&self, file_name: &str) -> PathBuf {
        let primary = self.sample_input_dir.join(&self.gmsv_subdir).join(file_name);
        if primary.exists() {
            return primary;
        }

        let fallback = self.gmsv_report_dir.join(file_name);
        if fallback.exists() {
            tracing::debug!(path = %fallback.display(), "using gMSV report from report directory");
            return fallback;
        }

        primary
    }
}

fn validate_sample_id(sample_id: &str) -> Read2vecResult<()> {
    let reason = if sample_id.is_empty() {
        Some("must not be empty")
    } else if sample_id.contains(|c| c == '/' || c == '\\') {
        Some("must not contain path separators")
    } else if sample_id == "." || sample_id == ".." {
        Some("must not be a relative directory name")
    } else if sample_id.trim() != sample_id {
        Some("must not start or end with whitespace")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Read2vecError::InvalidSample {
            sample: sample_id.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
