// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Panel intersection
//!
//! Keeps every sample interval that overlaps at least one reference panel
//! interval, written once and in input order (`bedtools intersect -u`).

use async_trait::async_trait;
use rust_lapper::{Interval, Lapper};
use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

use super::bed::{bed_line, bed_records, open_bed};
use super::{
    finish, io_failure, partial_path, resolve_panel, run_blocking, ExecutionResult, Executor,
};
use crate::config::IntersectSettings;
use crate::errors::{Read2vecError, Read2vecResult};
use crate::pipeline::{count_lines, Artifact, PipelineStage, SessionContext};

const STAGE: PipelineStage = PipelineStage::IntersectWithPanel;

/// Runs `bedtools intersect` as a subprocess
pub struct BedtoolsIntersect {
    /// Configured binary; looked up on PATH when unset
    binary: Option<PathBuf>,
    panel_dir: PathBuf,
    extra_args: Vec<String>,
}

impl BedtoolsIntersect {
    pub fn new(settings: &IntersectSettings) -> Self {
        Self {
            binary: settings.bedtools.clone(),
            panel_dir: settings.panel_dir.clone(),
            extra_args: settings.extra_args.clone(),
        }
    }

    fn binary(&self) -> Read2vecResult<PathBuf> {
        match self.binary {
            Some(ref path) => Ok(path.clone()),
            None => which::which("bedtools").map_err(|_| Read2vecError::tool_not_found("bedtools")),
        }
    }

    /// Argument list for one invocation; paths are passed as single arguments
    pub fn build_args(&self, bed: &Path, panel: &Path) -> Vec<String> {
        let mut args = vec![
            "intersect".to_string(),
            "-u".to_string(),
            "-a".to_string(),
            bed.to_string_lossy().to_string(),
            "-b".to_string(),
            panel.to_string_lossy().to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl Executor for BedtoolsIntersect {
    fn name(&self) -> &str {
        "bedtools-intersect"
    }

    async fn execute(&self, ctx: &SessionContext) -> Read2vecResult<ExecutionResult> {
        let start = Instant::now();
        let input = ctx.artifact_path(Artifact::Bed);
        let output = ctx.artifact_path(Artifact::IntersectedBed);
        let partial = partial_path(&output);

        // Resolve everything that can fail before any file is written
        let panel = resolve_panel(ctx, &self.panel_dir)?;
        let binary = self.binary()?;
        let args = self.build_args(&input, &panel);

        let written = run_bedtools(&binary, &args, &partial).await;
        finish(STAGE, &partial, &output, written).await?;

        let records = count_lines(&output, usize::MAX)
            .await
            .map_err(|e| io_failure(STAGE, &output, e))?;

        Ok(ExecutionResult::new(output, records, start.elapsed()))
    }
}

/// Run bedtools with its stdout going straight into `partial`
async fn run_bedtools(binary: &Path, args: &[String], partial: &Path) -> Read2vecResult<()> {
    let out_file = tokio::fs::File::create(partial)
        .await
        .map_err(|e| io_failure(STAGE, partial, e))?
        .into_std()
        .await;

    tracing::debug!(binary = %binary.display(), ?args, "running bedtools");

    let child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(out_file)
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Read2vecError::Transformation {
            stage: STAGE.name().to_string(),
            message: format!("failed to start {}: {}", binary.display(), e),
            help: Some(format!("Check that '{}' is executable", binary.display())),
        })?;

    // stdout is the scratch file; only stderr is piped back
    let result = child
        .wait_with_output()
        .await
        .map_err(|e| io_failure(STAGE, binary, e))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(Read2vecError::command_failed(
            STAGE.name(),
            &binary.to_string_lossy(),
            args,
            &stderr,
        ));
    }

    Ok(())
}

/// Panel intervals grouped by chromosome, merged per chromosome
#[derive(Debug, Default)]
pub struct PanelIndex {
    by_chrom: HashMap<String, Lapper<u64, ()>>,
}

impl PanelIndex {
    /// Load a panel BED file
    pub fn load(path: &Path) -> Read2vecResult<Self> {
        let mut reader = open_bed(STAGE, path)?;
        let mut intervals: HashMap<String, Vec<Interval<u64, ()>>> = HashMap::new();

        for item in bed_records(&mut reader, path) {
            let (line, record) = item?;
            if record.end() < record.start() {
                return Err(Read2vecError::MalformedRecord {
                    path: path.to_path_buf(),
                    line,
                    reason: format!("end {} is before start {}", record.end(), record.start()),
                });
            }
            intervals
                .entry(record.chrom().to_string())
                .or_default()
                .push(Interval {
                    start: record.start(),
                    stop: record.end(),
                    val: (),
                });
        }

        let by_chrom = intervals
            .into_iter()
            .map(|(chrom, ivs)| {
                let mut lapper = Lapper::new(ivs);
                lapper.merge_overlaps();
                (chrom, lapper)
            })
            .collect();

        Ok(Self { by_chrom })
    }

    /// Whether `[start, end)` on `chrom` overlaps any panel interval
    pub fn overlaps(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.by_chrom
            .get(chrom)
            .is_some_and(|lapper| lapper.find(start, end).next().is_some())
    }

    pub fn chromosomes(&self) -> usize {
        self.by_chrom.len()
    }
}

/// In-process intersection with the same semantics as `bedtools intersect -u`
pub struct BuiltinIntersect {
    panel_dir: PathBuf,
}

impl BuiltinIntersect {
    pub fn new(settings: &IntersectSettings) -> Self {
        Self {
            panel_dir: settings.panel_dir.clone(),
        }
    }
}

#[async_trait]
impl Executor for BuiltinIntersect {
    fn name(&self) -> &str {
        "builtin-intersect"
    }

    async fn execute(&self, ctx: &SessionContext) -> Read2vecResult<ExecutionResult> {
        let start = Instant::now();
        let input = ctx.artifact_path(Artifact::Bed);
        let output = ctx.artifact_path(Artifact::IntersectedBed);
        let partial = partial_path(&output);
        let panel_path = resolve_panel(ctx, &self.panel_dir)?;

        let written = {
            let partial = partial.clone();
            run_blocking(STAGE, move || {
                let panel = PanelIndex::load(&panel_path)?;
                tracing::debug!(
                    panel = %panel_path.display(),
                    chromosomes = panel.chromosomes(),
                    "loaded reference panel"
                );
                intersect_file(&input, &panel, &partial)
            })
            .await
        };
        let records = finish(STAGE, &partial, &output, written).await?;

        Ok(ExecutionResult::new(output, records, start.elapsed()))
    }
}

fn intersect_file(input: &Path, panel: &PanelIndex, partial: &Path) -> Read2vecResult<usize> {
    let mut reader = open_bed(STAGE, input)?;
    let file = std::fs::File::create(partial).map_err(|e| io_failure(STAGE, partial, e))?;
    let mut writer = BufWriter::new(file);

    let mut records = 0;
    for item in bed_records(&mut reader, input) {
        let (_, record) = item?;
        if !panel.overlaps(record.chrom(), record.start(), record.end()) {
            continue;
        }

        writeln!(writer, "{}", bed_line(&record)).map_err(|e| io_failure(STAGE, partial, e))?;
        records += 1;
    }

    writer.flush().map_err(|e| io_failure(STAGE, partial, e))?;
    Ok(records)
}

/// Stand-in for bedtools: prints the `-a` file without its chr3 lines
#[cfg(all(test, unix))]
pub(crate) fn fake_bedtools(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = "#!/bin/sh\n\
                  [ \"$1 $2 $3\" = \"intersect -u -a\" ] || exit 2\n\
                  grep -v '^chr3' \"$4\"\n";
    let path = dir.join("fake-bedtools");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;
    use tempfile::TempDir;

    fn setup(panel: &str, bed: &str) -> (TempDir, SessionContext) {
        let temp_dir = TempDir::new().unwrap();
        let ctx = SessionContext::new(temp_dir.path(), "S1", "panel", &Layout::default()).unwrap();
        std::fs::create_dir_all(ctx.output_dir()).unwrap();

        let panels = temp_dir.path().join("reference_panels");
        std::fs::create_dir_all(&panels).unwrap();
        std::fs::write(panels.join("panel.bed"), panel).unwrap();
        std::fs::write(ctx.artifact_path(Artifact::Bed), bed).unwrap();
        (temp_dir, ctx)
    }

    #[test]
    fn test_index_merges_and_queries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("panel.bed");
        std::fs::write(&path, "# panel\nchr1\t50\t60\nchr1\t10\t20\nchr1\t15\t30\nchr2\t5\t6\n").unwrap();

        let index = PanelIndex::load(&path).unwrap();

        assert!(index.overlaps("chr1", 0, 11));
        assert!(index.overlaps("chr1", 29, 40));
        assert!(!index.overlaps("chr1", 30, 50));
        assert!(index.overlaps("chr1", 59, 100));
        assert!(!index.overlaps("chr1", 60, 100));
        assert!(index.overlaps("chr2", 0, 100));
        assert!(!index.overlaps("chr3", 0, 100));
        assert_eq!(index.chromosomes(), 2);
    }

    #[test]
    fn test_index_rejects_reversed_interval() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("panel.bed");
        std::fs::write(&path, "chr1\t0\t10\nchr1\t30\t20\n").unwrap();

        match PanelIndex::load(&path).unwrap_err() {
            Read2vecError::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bedtools_args_keep_paths_whole() {
        let settings = IntersectSettings {
            extra_args: vec!["-sorted".into()],
            ..Default::default()
        };
        let args = BedtoolsIntersect::new(&settings)
            .build_args(Path::new("/out/my sample.bed"), Path::new("/panels/p 1.bed"));

        assert_eq!(
            args,
            vec!["intersect", "-u", "-a", "/out/my sample.bed", "-b", "/panels/p 1.bed", "-sorted"]
        );
    }

    #[tokio::test]
    async fn test_builtin_keeps_overlapping_intervals_in_order() {
        let (_tmp, ctx) = setup(
            "chr2\t0\t100\nchr1\t150\t160\n",
            "chr2\t10\t20\t1\nchr1\t100\t150\t0\nchr1\t155\t170\t2\nchr3\t1\t2\t1\n",
        );

        let result = BuiltinIntersect::new(&IntersectSettings::default())
            .execute(&ctx)
            .await
            .unwrap();

        assert_eq!(result.records, 2);
        let output = ctx.artifact_path(Artifact::IntersectedBed);
        let out = std::fs::read_to_string(&output).unwrap();
        assert_eq!(out, "chr2\t10\t20\t1\nchr1\t155\t170\t2\n");
        assert!(!partial_path(&output).exists());
    }

    #[tokio::test]
    async fn test_missing_panel_leaves_output_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = SessionContext::new(temp_dir.path(), "S1", "absent", &Layout::default()).unwrap();
        std::fs::create_dir_all(ctx.output_dir()).unwrap();
        std::fs::write(ctx.artifact_path(Artifact::IntersectedBed), "partial\n").unwrap();

        let err = BedtoolsIntersect::new(&IntersectSettings::default())
            .execute(&ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, Read2vecError::PanelNotFound { .. }));
        let out = std::fs::read_to_string(ctx.artifact_path(Artifact::IntersectedBed)).unwrap();
        assert_eq!(out, "partial\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bedtools_stdout_becomes_output() {
        let (tmp, ctx) = setup(
            "chr1\t0\t1000\n",
            "chr1\t100\t200\t3\nchr3\t10\t20\t0\nchr2\t150\t250\t1\n",
        );
        let settings = IntersectSettings {
            bedtools: Some(fake_bedtools(tmp.path())),
            ..Default::default()
        };

        let result = BedtoolsIntersect::new(&settings).execute(&ctx).await.unwrap();

        assert_eq!(result.records, 2);
        let output = ctx.artifact_path(Artifact::IntersectedBed);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "chr1\t100\t200\t3\nchr2\t150\t250\t1\n"
        );
        assert!(!partial_path(&output).exists());
    }

    #[tokio::test]
    async fn test_failing_command_is_wrapped() {
        let (_tmp, ctx) = setup("chr1\t0\t10\n", "chr1\t1\t2\t1\n");
        let output = ctx.artifact_path(Artifact::IntersectedBed);
        std::fs::write(&output, "previous\n").unwrap();

        // `false` exits non-zero without reading its arguments
        let Ok(false_bin) = which::which("false") else {
            return;
        };
        let settings = IntersectSettings {
            bedtools: Some(false_bin),
            ..Default::default()
        };

        let err = BedtoolsIntersect::new(&settings).execute(&ctx).await.unwrap_err();
        match err {
            Read2vecError::Transformation { stage, message, .. } => {
                assert_eq!(stage, "IntersectWithPanel");
                assert!(message.contains("intersect -u -a"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous\n");
        assert!(!partial_path(&output).exists());
    }
}
