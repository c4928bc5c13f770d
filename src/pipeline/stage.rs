// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Fixed stage and artifact definitions

use serde::Serialize;

/// A file the pipeline reads or produces, named `<sample>.<extension>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Artifact {
    /// The gMSV report, read-only to the pipeline
    GmsvSource,
    /// `<sample>.gMSV2bed.bed`
    Bed,
    /// `<sample>.intersected.bed`
    IntersectedBed,
    /// `<sample>.Encoding.txt`
    Encoding,
}

impl Artifact {
    /// File name suffix after the sample id
    pub fn extension(&self) -> &'static str {
        match self {
            Self::GmsvSource => "gMSV",
            Self::Bed => "gMSV2bed.bed",
            Self::IntersectedBed => "intersected.bed",
            Self::Encoding => "Encoding.txt",
        }
    }

    /// File name for a sample
    pub fn file_name(&self, sample_id: &str) -> String {
        format!("{}.{}", sample_id, self.extension())
    }
}

/// The four stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PipelineStage {
    PrepareOutputDir,
    ConvertToBed,
    IntersectWithPanel,
    EncodeIntersected,
}

impl PipelineStage {
    /// All stages in the order the driver runs them
    pub const ALL: [PipelineStage; 4] = [
        Self::PrepareOutputDir,
        Self::ConvertToBed,
        Self::IntersectWithPanel,
        Self::EncodeIntersected,
    ];

    /// Stable name used in logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::PrepareOutputDir => "PrepareOutputDir",
            Self::ConvertToBed => "ConvertToBed",
            Self::IntersectWithPanel => "IntersectWithPanel",
            Self::EncodeIntersected => "EncodeIntersected",
        }
    }

    /// Artifact this stage writes
    pub fn output(&self) -> Option<Artifact> {
        match self {
            Self::PrepareOutputDir => None,
            Self::ConvertToBed => Some(Artifact::Bed),
            Self::IntersectWithPanel => Some(Artifact::IntersectedBed),
            Self::EncodeIntersected => Some(Artifact::Encoding),
        }
    }

    /// Artifact this stage reads
    pub fn predecessor(&self) -> Option<Artifact> {
        match self {
            Self::PrepareOutputDir => None,
            Self::ConvertToBed => Some(Artifact::GmsvSource),
            Self::IntersectWithPanel => Some(Artifact::Bed),
            Self::EncodeIntersected => Some(Artifact::IntersectedBed),
        }
    }

    /// One-line narration header
    pub fn headline(&self, sample_id: &str, panel_id: &str) -> String {
        match self {
            Self::PrepareOutputDir => format!("Make encoding directory for {}", sample_id),
            Self::ConvertToBed => format!("Make BED of {}", sample_id),
            Self::IntersectWithPanel => {
                format!("Intersect {} BED with reference panel {}", sample_id, panel_id)
            }
            Self::EncodeIntersected => {
                format!("Convert intersected {} BED to encoding input", sample_id)
            }
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_chain_outputs_to_predecessors() {
        let artifact_stages = &PipelineStage::ALL[1..];
        for pair in artifact_stages.windows(2) {
            assert_eq!(pair[0].output(), pair[1].predecessor());
        }
        assert_eq!(PipelineStage::PrepareOutputDir.output(), None);
    }

    #[test]
    fn test_artifact_file_names() {
        assert_eq!(Artifact::GmsvSource.file_name("S1"), "S1.gMSV");
        assert_eq!(Artifact::Bed.file_name("S1"), "S1.gMSV2bed.bed");
        assert_eq!(Artifact::IntersectedBed.file_name("S1"), "S1.intersected.bed");
        assert_eq!(Artifact::Encoding.file_name("S1"), "S1.Encoding.txt");
    }
}
