// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! BED to encoding conversion
//!
//! Each intersected interval becomes one fixed-width, space-separated
//! numeric record: `CC SSSSSSSSSS EEEEEEEEEE NNNN` (chromosome code, start,
//! end, CpG count), zero-padded.

use async_trait::async_trait;
use regex::Regex;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use super::bed::{bed_records, open_bed};
use super::{finish, io_failure, partial_path, run_blocking, BedRecord, ExecutionResult, Executor};
use crate::errors::{Read2vecError, Read2vecResult};
use crate::pipeline::{Artifact, PipelineStage, SessionContext};

const STAGE: PipelineStage = PipelineStage::EncodeIntersected;

const MAX_COORDINATE: u64 = 9_999_999_999;
const MAX_COUNT: usize = 9_999;

fn chrom_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:chr)?([0-9]{1,2}|x|y|mt|m)$").expect("chromosome pattern is valid")
    })
}

/// Numeric code for a chromosome name: 1-22, X=23, Y=24, M/MT=25
pub fn chrom_code(chrom: &str) -> Option<u8> {
    let caps = chrom_pattern().captures(chrom)?;
    let name = caps.get(1)?.as_str().to_ascii_uppercase();
    match name.as_str() {
        "X" => Some(23),
        "Y" => Some(24),
        "M" | "MT" => Some(25),
        digits => digits.parse().ok().filter(|n| (1..=22).contains(n)),
    }
}

/// Render one encoding record
pub fn encode_record(record: &BedRecord) -> Result<String, String> {
    let code = chrom_code(&record.chrom)
        .ok_or_else(|| format!("unsupported chromosome '{}'", record.chrom))?;

    if record.end > MAX_COORDINATE {
        return Err(format!("coordinate {} exceeds 10 digits", record.end));
    }
    if record.cpg_count > MAX_COUNT {
        return Err(format!("CpG count {} exceeds 4 digits", record.cpg_count));
    }

    Ok(format!(
        "{:02} {:010} {:010} {:04}",
        code, record.start, record.end, record.cpg_count
    ))
}

/// Converts the intersected BED into the model's encoding input
#[derive(Debug, Default)]
pub struct BedToEncoding;

impl BedToEncoding {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for BedToEncoding {
    fn name(&self) -> &str {
        "bed-to-encoding"
    }

    async fn execute(&self, ctx: &SessionContext) -> Read2vecResult<ExecutionResult> {
        let start = Instant::now();
        let input = ctx.artifact_path(Artifact::IntersectedBed);
        let output = ctx.artifact_path(Artifact::Encoding);
        let partial = partial_path(&output);

        let written = {
            let partial = partial.clone();
            run_blocking(STAGE, move || encode_file(&input, &partial)).await
        };
        let records = finish(STAGE, &partial, &output, written).await?;

        Ok(ExecutionResult::new(output, records, start.elapsed()))
    }
}

fn encode_file(input: &Path, partial: &Path) -> Read2vecResult<usize> {
    let mut reader = open_bed(STAGE, input)?;
    let file = std::fs::File::create(partial).map_err(|e| io_failure(STAGE, partial, e))?;
    let mut writer = BufWriter::new(file);

    let mut records = 0;
    for item in bed_records(&mut reader, input) {
        let (line, record) = item?;
        let encoded = BedRecord::from_bed(&record)
            .and_then(|record| encode_record(&record))
            .map_err(|reason| Read2vecError::MalformedRecord {
                path: input.to_path_buf(),
                line,
                reason,
            })?;

        writeln!(writer, "{}", encoded).map_err(|e| io_failure(STAGE, partial, e))?;
        records += 1;
    }

    writer.flush().map_err(|e| io_failure(STAGE, partial, e))?;
    Ok(records)
}
