// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Stage artifact validation
//!
//! A cheap structural check: an artifact is complete when it has at least
//! `min_lines` lines. Only that many lines are ever read, so the check costs
//! the same for a five-line file and a multi-gigabyte one. Corruption past
//! the threshold is not detected.

use serde::Serialize;
use std::io;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{Artifact, SessionContext};
use crate::config::DEFAULT_MIN_LINES;

/// On-disk completeness of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The file does not exist
    Missing,
    /// The file exists but could not be opened or read
    Unreadable,
    /// The file exists with fewer lines than the threshold
    Insufficient,
    /// The file exists with at least the threshold number of lines
    Sufficient,
}

impl Verdict {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, Self::Sufficient)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Unreadable => write!(f, "unreadable"),
            Self::Insufficient => write!(f, "insufficient"),
            Self::Sufficient => write!(f, "sufficient"),
        }
    }
}

/// Classifies artifacts by counting a bounded number of lines
#[derive(Debug, Clone, Copy)]
pub struct StageValidator {
    min_lines: usize,
}

impl StageValidator {
    pub fn new(min_lines: usize) -> Self {
        Self {
            min_lines: min_lines.max(1),
        }
    }

    /// Verdict for an artifact of the current session
    pub async fn validity(&self, artifact: Artifact, ctx: &SessionContext) -> Verdict {
        let path = ctx.artifact_path(artifact);
        let verdict = self.check_path(&path).await;
        tracing::debug!(
            artifact = ?artifact,
            path = %path.display(),
            %verdict,
            "validity check"
        );
        verdict
    }

    /// Verdict for an arbitrary path
    pub async fn check_path(&self, path: &Path) -> Verdict {
        match count_lines(path, self.min_lines).await {
            Ok(n) if n >= self.min_lines => Verdict::Sufficient,
            Ok(_) => Verdict::Insufficient,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Verdict::Missing,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read artifact");
                Verdict::Unreadable
            }
        }
    }
}

impl Default for StageValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_LINES)
    }
}

/// Count lines in a file, stopping once `limit` is reached
///
/// A trailing line without a newline counts. Bytes are not required to be
/// UTF-8.
pub async fn count_lines(path: &Path, limit: usize) -> io::Result<usize> {
    let file = tokio::fs::File::open(path).await?;
    if file.metadata().await?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            "expected a file, found a directory",
        ));
    }

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut lines = 0;

    while lines < limit {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        lines += 1;
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_lines(dir: &Path, name: &str, n: usize) -> std::path::PathBuf {
        let path = dir.join(name);
        let content: String = (0..n).map(|i| format!("line{}\n", i)).collect();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let validator = StageValidator::default();

        let verdict = validator.check_path(&temp_dir.path().join("nope.bed")).await;
        assert_eq!(verdict, Verdict::Missing);
    }

    #[tokio::test]
    async fn test_short_file_is_insufficient() {
        let temp_dir = TempDir::new().unwrap();
        let validator = StageValidator::default();

        for n in 0..5 {
            let path = write_lines(temp_dir.path(), &format!("f{}.bed", n), n);
            assert_eq!(validator.check_path(&path).await, Verdict::Insufficient, "{} lines", n);
        }
    }

    #[tokio::test]
    async fn test_threshold_and_large_files_are_sufficient() {
        let temp_dir = TempDir::new().unwrap();
        let validator = StageValidator::default();

        let five = write_lines(temp_dir.path(), "five.bed", 5);
        let large = write_lines(temp_dir.path(), "large.bed", 10_000);

        assert_eq!(validator.check_path(&five).await, Verdict::Sufficient);
        assert_eq!(validator.check_path(&large).await, Verdict::Sufficient);
    }

    #[tokio::test]
    async fn test_count_stops_at_limit() {
        let temp_dir = TempDir::new().unwrap();
        let large = write_lines(temp_dir.path(), "large.bed", 10_000);

        assert_eq!(count_lines(&large, 5).await.unwrap(), 5);
        assert_eq!(count_lines(&large, 20_000).await.unwrap(), 10_000);
    }

    #[tokio::test]
    async fn test_final_line_without_newline_counts() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("f.bed");
        std::fs::write(&path, "a\nb\nc\nd\ne").unwrap();

        assert_eq!(StageValidator::default().check_path(&path).await, Verdict::Sufficient);
    }

    #[tokio::test]
    async fn test_directory_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let verdict = StageValidator::default().check_path(temp_dir.path()).await;
        assert_eq!(verdict, Verdict::Unreadable);
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_lines(temp_dir.path(), "f.bed", 2);

        assert_eq!(StageValidator::new(2).check_path(&path).await, Verdict::Sufficient);
        assert_eq!(StageValidator::new(3).check_path(&path).await, Verdict::Insufficient);
    }
}
