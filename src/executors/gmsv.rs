// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! gMSV to BED conversion
//!
//! A gMSV report has one tab-separated record per locus:
//! `chrom  start  end  calls  [ignored...]`, where `calls` is either `NA`
//! (no called CpG at the locus) or a `;`-separated list of calls.

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

use super::{finish, io_failure, partial_path, BedRecord, ExecutionResult, Executor};
use crate::errors::{Read2vecError, Read2vecResult};
use crate::pipeline::{Artifact, PipelineStage, SessionContext};

const STAGE: PipelineStage = PipelineStage::ConvertToBed;

/// Number of CpG calls in a gMSV calls field
pub fn cpg_count(calls: &str) -> usize {
    if calls == "NA" {
        return 0;
    }
    calls.split(';').count()
}

/// One parsed gMSV line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmsvRecord<'a> {
    pub chrom: &'a str,
    pub start: u64,
    pub end: u64,
    pub calls: &'a str,
}

impl<'a> GmsvRecord<'a> {
    /// Parse a line; `Ok(None)` for blank and comment lines
    pub fn parse(line: &'a str) -> Result<Option<Self>, String> {
        if line.trim().is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        if fields.len() < 4 {
            return Err(format!(
                "expected at least 4 tab-separated columns, found {}",
                fields.len()
            ));
        }

        if fields[0].is_empty() {
            return Err("empty chromosome name".into());
        }
        let start = coordinate("start", fields[1])?;
        let end = coordinate("end", fields[2])?;
        if start >= end {
            return Err(format!("start {} is not before end {}", start, end));
        }

        let calls = fields[3].trim();
        if calls.is_empty() {
            return Err("empty calls column (use NA for no calls)".into());
        }

        Ok(Some(Self {
            chrom: fields[0],
            start,
            end,
            calls,
        }))
    }

    /// BED record annotated with the CpG count
    pub fn to_bed(&self) -> BedRecord {
        BedRecord {
            chrom: self.chrom.to_string(),
            start: self.start,
            end: self.end,
            cpg_count: cpg_count(self.calls),
        }
    }
}

fn coordinate(name: &str, field: &str) -> Result<u64, String> {
    field
        .trim()
        .parse()
        .map_err(|_| format!("invalid {} coordinate '{}'", name, field))
}

/// Converts the sample's gMSV report into an annotated BED
#[derive(Debug, Default)]
pub struct GmsvToBed;

impl GmsvToBed {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for GmsvToBed {
    fn name(&self) -> &str {
        "gmsv-to-bed"
    }

    async fn execute(&self, ctx: &SessionContext) -> Read2vecResult<ExecutionResult> {
        let start = Instant::now();
        let input = ctx.artifact_path(Artifact::GmsvSource);
        let output = ctx.artifact_path(Artifact::Bed);
        let partial = partial_path(&output);

        let written = convert(&input, &partial).await;
        let records = finish(STAGE, &partial, &output, written).await?;

        tracing::debug!(records, output = %output.display(), "wrote BED");
        Ok(ExecutionResult::new(output, records, start.elapsed()))
    }
}

async fn convert(input: &Path, partial: &Path) -> Read2vecResult<usize> {
    let reader = tokio::fs::File::open(input)
        .await
        .map_err(|e| io_failure(STAGE, input, e))?;
    let mut lines = BufReader::new(reader).lines();

    let file = tokio::fs::File::create(partial)
        .await
        .map_err(|e| io_failure(STAGE, partial, e))?;
    let mut writer = BufWriter::new(file);

    let mut line_no = 0;
    let mut records = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_failure(STAGE, input, e))?
    {
        line_no += 1;

        let record = GmsvRecord::parse(&line).map_err(|reason| Read2vecError::MalformedRecord {
            path: input.to_path_buf(),
            line: line_no,
            reason,
        })?;
        let Some(record) = record else {
            continue;
        };

        let bed_line = format!("{}\n", record.to_bed());
        writer
            .write_all(bed_line.as_bytes())
            .await
            .map_err(|e| io_failure(STAGE, partial, e))?;
        records += 1;
    }

    writer
        .flush()
        .await
        .map_err(|e| io_failure(STAGE, partial, e))?;

    Ok(records)
}
