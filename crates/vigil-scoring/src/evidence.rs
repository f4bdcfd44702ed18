//! Evidence factor
//!
//! Counts non-empty evidence files against a completeness threshold and
//! rewards diversity of media. Only sizes and content types are read.

use std::collections::BTreeSet;
use vigil_core::{EvidenceFile, Factor, FactorScore};

use crate::factor::{FactorEvaluator, ScoringInput};

pub const EVIDENCE_MAX: u32 = 4;

/// Coarse media family of an evidence file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EvidenceFamily {
    Image,
    Video,
    Audio,
    Document,
}

impl EvidenceFamily {
    pub fn of(file: &EvidenceFile) -> Option<Self> {
        let content_type = file.content_type.trim().to_ascii_lowercase();
        if content_type.starts_with("image/") {
            Some(EvidenceFamily::Image)
        } else if content_type.starts_with("video/") {
            Some(EvidenceFamily::Video)
        } else if content_type.starts_with("audio/") {
            Some(EvidenceFamily::Audio)
        } else if content_type.starts_with("text/")
            || content_type == "application/pdf"
            || content_type == "application/msword"
            || content_type.starts_with("application/vnd.")
        {
            Some(EvidenceFamily::Document)
        } else {
            None
        }
    }
}

/// Files that carry content; empty uploads are ignored everywhere
pub fn usable_files(files: &[EvidenceFile]) -> impl Iterator<Item = &EvidenceFile> {
    files.iter().filter(|f| f.size_bytes > 0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceFactor;

impl FactorEvaluator for EvidenceFactor {
    fn factor(&self) -> Factor {
        Factor::Evidence
    }

    fn max(&self) -> u32 {
        EVIDENCE_MAX
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> FactorScore {
        let usable: Vec<&EvidenceFile> = usable_files(&input.report.evidence).collect();

        // Evidence floor: nothing else can lift this factor without files
        if usable.is_empty() {
            return self.score(0, "No evidence attached");
        }

        let count = usable.len() as u32;
        let complete = input.config.evidence_complete.max(1);
        let count_points = if count >= complete { 3 } else { count.min(2) };

        let families: BTreeSet<EvidenceFamily> =
            usable.iter().filter_map(|f| EvidenceFamily::of(f)).collect();
        let diversity = if families.len() >= 2 { 1 } else { 0 };

        self.score(
            count_points + diversity,
            format!(
                "{} usable file(s), {} media famil{}",
                count,
                families.len(),
                if families.len() == 1 { "y" } else { "ies" }
            ),
        )
    }
}
