// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use std::path::Path;

use crate::pipeline::Verdict;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest installing a missing tool
    pub fn install_tool(tool: &str) -> Self {
        match tool {
            "bedtools" => Self {
                action: "Install bedtools (https://bedtools.readthedocs.io) or set intersect.tool to 'builtin'".into(),
                steps: vec![
                    "bedtools is required to intersect sample intervals with the reference panel".into(),
                    "Alternatively run with --intersect-tool builtin".into(),
                ],
                commands: vec![
                    "# Using conda:".into(),
                    "conda install -c bioconda bedtools".into(),
                    "".into(),
                    "# Using apt:".into(),
                    "apt-get install bedtools".into(),
                ],
            },
            _ => Self {
                action: format!("Install {} and ensure it's in your PATH", tool),
                steps: vec![format!("Install {} and ensure it's in your PATH", tool)],
                commands: vec![],
            },
        }
    }

    /// Suggest how to repair a predecessor artifact that blocks a stage
    pub fn for_predecessor(artifact: &Path, verdict: Verdict) -> Self {
        let name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| artifact.display().to_string());

        let (action, steps) = match verdict {
            Verdict::Missing => (
                format!("Please check {}: it does not exist", name),
                vec![
                    "Make sure the earlier stage produced it".into(),
                    "Source reports must be placed before running".into(),
                ],
            ),
            Verdict::Unreadable => (
                format!("Please check {}: it exists but cannot be read", name),
                vec!["Check file permissions and the underlying storage".into()],
            ),
            Verdict::Insufficient | Verdict::Sufficient => (
                format!("Please check {}: it looks truncated", name),
                vec![
                    "A previous run was probably interrupted while writing it".into(),
                    "Delete it and re-run to regenerate it".into(),
                ],
            ),
        };

        Self {
            action,
            steps,
            commands: vec![format!("head {}", artifact.display())],
        }
    }

    /// Render as a single help string for a diagnostic
    pub fn to_help(&self) -> String {
        let mut out = self.action.clone();
        for step in &self.steps {
            out.push_str("\n  - ");
            out.push_str(step);
        }
        for command in self.commands.iter().filter(|c| !c.is_empty()) {
            out.push_str("\n    ");
            out.push_str(command);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_predecessor_suggests_regeneration() {
        let suggestion = RecoverySuggestion::for_predecessor(
            Path::new("/out/S1.intersected.bed"),
            Verdict::Insufficient,
        );

        assert!(suggestion.action.contains("S1.intersected.bed"));
        assert!(suggestion.to_help().contains("head /out/S1.intersected.bed"));
    }

    #[test]
    fn test_install_bedtools_mentions_builtin() {
        let suggestion = RecoverySuggestion::install_tool("bedtools");
        assert!(suggestion.action.contains("builtin"));
    }
}
