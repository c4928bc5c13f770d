// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Error types with operator-facing help
//!
//! Every fatal condition names the file or command an operator has to look
//! at. Read failures during validity checks are not errors: they are logged
//! and folded into an `Unreadable` verdict.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::Verdict;

/// Result type for read2vec operations
pub type Read2vecResult<T> = Result<T, Read2vecError>;

/// Main error type for read2vec
#[derive(Error, Debug, Diagnostic)]
pub enum Read2vecError {
    // ─────────────────────────────────────────────────────────────────────────
    // Invocation Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid invocation: {message}")]
    #[diagnostic(
        code(read2vec::usage),
        help("Usage: read2vec <INPUT_ROOT> <SAMPLE_ID> <REFERENCE_PANEL>")
    )]
    Usage { message: String },

    #[error("Invalid sample identifier '{sample}': {reason}")]
    #[diagnostic(
        code(read2vec::invalid_sample),
        help("The sample id is used as a file name stem and must be a plain name")
    )]
    InvalidSample { sample: String, reason: String },

    #[error("Invalid configuration in {path}: {message}")]
    #[diagnostic(code(read2vec::config))]
    Config { path: PathBuf, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Stage Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to create output directory '{path}': {error}")]
    #[diagnostic(
        code(read2vec::directory_creation),
        help("Check that the input root exists and is writable")
    )]
    DirectoryCreation { path: PathBuf, error: String },

    #[error("Stage '{stage}' cannot run: predecessor {artifact} is {verdict}")]
    #[diagnostic(code(read2vec::predecessor_invalid))]
    PredecessorInvalid {
        stage: String,
        artifact: PathBuf,
        verdict: Verdict,
        #[help]
        help: Option<String>,
    },

    #[error("Stage '{stage}' failed: {message}")]
    #[diagnostic(code(read2vec::transformation_failed))]
    Transformation {
        stage: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Malformed record in {path} line {line}: {reason}")]
    #[diagnostic(
        code(read2vec::malformed_record),
        help("Fix or regenerate the input file, then re-run; completed stages are kept")
    )]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Tool Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Tool '{tool}' not found")]
    #[diagnostic(code(read2vec::tool_not_found), help("{suggestion}"))]
    ToolNotFound { tool: String, suggestion: String },

    #[error("Reference panel '{panel}' not found (looked for {path})")]
    #[diagnostic(
        code(read2vec::panel_not_found),
        help("Pass an existing BED file or place '<panel>.bed' under the configured panel_dir")
    )]
    PanelNotFound { panel: String, path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(read2vec::io_error))]
    Io { message: String },

    #[error("JSON serialization error: {message}")]
    #[diagnostic(code(read2vec::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for Read2vecError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Read2vecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json {
            message: e.to_string(),
        }
    }
}

impl Read2vecError {
    /// Create a tool not found error with installation suggestion
    pub fn tool_not_found(tool: &str) -> Self {
        Self::ToolNotFound {
            tool: tool.to_string(),
            suggestion: RecoverySuggestion::install_tool(tool).action,
        }
    }

    /// Create a predecessor error that tells the operator what to inspect
    pub fn predecessor_invalid(stage: &str, artifact: PathBuf, verdict: Verdict) -> Self {
        let help = RecoverySuggestion::for_predecessor(&artifact, verdict).to_help();
        Self::PredecessorInvalid {
            stage: stage.to_string(),
            artifact,
            verdict,
            help: Some(help),
        }
    }

    /// Wrap a failure raised while a stage was writing its output
    pub fn transformation(stage: &str, message: impl Into<String>) -> Self {
        Self::Transformation {
            stage: stage.to_string(),
            message: message.into(),
            help: None,
        }
    }

    /// Wrap a failed external command, keeping the exact argument list
    pub fn command_failed(stage: &str, program: &str, args: &[String], stderr: &str) -> Self {
        let command = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        let stderr = stderr.trim();
        let message = if stderr.is_empty() {
            format!("command `{}` failed", command)
        } else {
            format!("command `{}` failed: {}", command, stderr)
        };

        Self::Transformation {
            stage: stage.to_string(),
            message,
            help: Self::parse_bedtools_error(stderr),
        }
    }

    fn parse_bedtools_error(stderr: &str) -> Option<String> {
        if stderr.contains("does not exist") || stderr.contains("No such file") {
            Some("One of the BED inputs is missing. Check the panel path and the sample BED.".into())
        } else if stderr.contains("Invalid record") || stderr.contains("could not be parsed") {
            Some("bedtools rejected a record. Check that both files are tab-delimited BED.".into())
        } else if stderr.contains("sorted") {
            Some("bedtools expects sorted input for this mode. Sort both files with `sort -k1,1 -k2,2n`.".into())
        } else {
            None
        }
    }

    /// Whether this error came from invocation rather than a stage
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. } | Self::InvalidSample { .. })
    }
}
