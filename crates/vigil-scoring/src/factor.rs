//! FactorEvaluator: one contract for every scoring signal
use vigil_core::{Factor, FactorScore, LocationDirectory, Report, ReporterProfile, ScoringConfig};

use crate::detector::Corroboration;

/// Immutable snapshot handed to every evaluator.
///
/// Evaluators must not read the wall clock; "now" is the snapshot's own
/// `report.submitted_at`.
#[derive(Clone, Copy)]
pub struct ScoringInput<'a> {
    pub report: &'a Report,
    pub profile: Option<&'a ReporterProfile>,
    pub directory: &'a dyn LocationDirectory,
    pub corroboration: &'a Corroboration,
    pub config: &'a ScoringConfig,
}

/// A single scoring signal
pub trait FactorEvaluator: Send + Sync {
    fn factor(&self) -> Factor;

    /// Fixed upper bound of this factor's value
    fn max(&self) -> u32;

    /// Score the snapshot; must be deterministic for a fixed input
    fn evaluate(&self, input: &ScoringInput<'_>) -> FactorScore;

    /// Build this factor's score; values above `max` are left for the
    /// aggregator to reject
    fn score(&self, value: u32, detail: impl Into<String>) -> FactorScore
    where
        Self: Sized,
    {
        FactorScore::new(self.factor(), value, self.max()).with_detail(detail)
    }
}
