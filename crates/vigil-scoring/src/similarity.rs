//! Similarity factor
//!
//! Turns the detector's corroboration result into points. Independent
//! corroborators raise credibility with diminishing returns; a report
//! judged a duplicate earns nothing from its siblings.

use vigil_core::{Factor, FactorScore};

use crate::factor::{FactorEvaluator, ScoringInput};

pub const SIMILARITY_MAX: u32 = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityFactor;

impl SimilarityFactor {
    /// floor(log2(n + 1)) capped at the factor maximum
    pub fn points_for(corroborators: u32) -> u32 {
        let n = corroborators.saturating_add(1);
        (u32::BITS - 1 - n.leading_zeros()).min(SIMILARITY_MAX)
    }
}

impl FactorEvaluator for SimilarityFactor {
    fn factor(&self) -> Factor {
        Factor::Similarity
    }

    fn max(&self) -> u32 {
        SIMILARITY_MAX
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> FactorScore {
        let corroboration = input.corroboration;
        if let Some(reason) = &corroboration.degraded {
            return self.score(
                input.config.degraded_similarity_score.min(SIMILARITY_MAX),
                format!("Similarity search unavailable: {}", reason),
            );
        }
        if let Some(original) = corroboration.duplicate_of {
            return self.score(0, format!("Duplicate of report {}", original));
        }
        let n = corroboration.corroborators;
        self.score(
            Self::points_for(n),
            format!("{} independent corroborating report(s)", n),
        )
    }
}
