// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! BED records
//!
//! Intermediate BEDs and reference panels are read with rust-bio's
//! tab-separated reader, which skips `#` comment lines.

use bio::io::bed;
use std::fmt;
use std::fs::File;
use std::path::Path;

use super::io_failure;
use crate::errors::{Read2vecError, Read2vecResult};
use crate::pipeline::PipelineStage;

/// A sample interval annotated with its CpG count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRecord {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub cpg_count: usize,
}

impl BedRecord {
    /// Build from a BED record whose first extra column holds the CpG count
    pub fn from_bed(record: &bed::Record) -> Result<Self, String> {
        if record.chrom().is_empty() {
            return Err("empty chromosome name".into());
        }
        if record.start() >= record.end() {
            return Err(format!(
                "start {} is not before end {}",
                record.start(),
                record.end()
            ));
        }

        let count = record
            .aux(0)
            .ok_or_else(|| "expected a 4th column with the CpG count".to_string())?;
        let cpg_count = count
            .trim()
            .parse()
            .map_err(|_| format!("invalid CpG count '{}'", count))?;

        Ok(Self {
            chrom: record.chrom().to_string(),
            start: record.start(),
            end: record.end(),
            cpg_count,
        })
    }
}

impl fmt::Display for BedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.chrom, self.start, self.end, self.cpg_count
        )
    }
}

/// Open a BED file for record-wise reading
pub(crate) fn open_bed(stage: PipelineStage, path: &Path) -> Read2vecResult<bed::Reader<File>> {
    let file = File::open(path).map_err(|e| io_failure(stage, path, e))?;
    Ok(bed::Reader::new(file))
}

/// Records of an open BED with their 1-based record number
pub(crate) fn bed_records<'a>(
    reader: &'a mut bed::Reader<File>,
    path: &'a Path,
) -> impl Iterator<Item = Read2vecResult<(usize, bed::Record)>> + 'a {
    reader.records().enumerate().map(move |(i, record)| {
        record
            .map(|record| (i + 1, record))
            .map_err(|e| Read2vecError::MalformedRecord {
                path: path.to_path_buf(),
                line: i + 1,
                reason: e.to_string(),
            })
    })
}

/// A record as one tab-separated line, extra columns included
pub(crate) fn bed_line(record: &bed::Record) -> String {
    let mut line = format!("{}\t{}\t{}", record.chrom(), record.start(), record.end());
    for field in (0..).map_while(|i| record.aux(i)) {
        line.push('\t');
        line.push_str(field);
    }
    line
}
