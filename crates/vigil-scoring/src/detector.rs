//! Duplicate/Corroboration Detector
//!
//! Finds prior reports close to a new one in category, place and time, then
//! sorts each match into one of three buckets by narrative similarity and
//! reporter identity:
//!
//! - same identified reporter, near-identical: the new report is a duplicate
//! - two anonymous reporters, near-identical: potential duplicate, not counted
//! - different reporters, similar enough: an independent corroborator
//!
//! The search is the only suspension point of scoring. It runs under a
//! timeout and degrades to an empty, flagged result on failure.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use vigil_core::{DetectorConfig, Report, ReportId, Status};
use vigil_store::{CandidateQuery, ReportStore};

use crate::text;

/// Outcome of a detector run for one report
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corroboration {
    /// Independent corroborators, counted once per distinct reporter
    pub corroborators: u32,
    /// Reports contributing to the count
    pub corroborating_reports: Vec<ReportId>,
    /// Earlier report by the same reporter this one repeats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<ReportId>,
    /// Near-identical anonymous matches left for human review
    pub potential_duplicates: Vec<ReportId>,
    /// Why the search could not run, when it could not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
    pub best_similarity: f64,
}

impl Corroboration {
    /// No related reports
    pub fn none() -> Self {
        Self::default()
    }

    /// Search unavailable; scoring falls back to the safe default
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            degraded: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

pub struct DuplicateDetector {
    store: Arc<dyn ReportStore>,
    config: DetectorConfig,
}

impl DuplicateDetector {
    pub fn new(store: Arc<dyn ReportStore>, config: DetectorConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Search bounds around `report`
    pub fn query_for(&self, report: &Report) -> CandidateQuery {
        let window = Duration::days(self.config.window_days);
        CandidateQuery {
            exclude: report.id,
            category: report.category,
            city_id: report.location.city_id.clone(),
            district_id: report.location.district_id.clone(),
            incident_from: report.incident_at - window,
            incident_to: report.incident_at + window,
            limit: self.config.max_candidates,
        }
    }

    /// Run the bounded search and classify its results.
    ///
    /// Never fails: store errors and timeouts yield a degraded result.
    pub async fn detect(&self, report: &Report) -> Corroboration {
        let query = self.query_for(report);
        let timeout = std::time::Duration::from_millis(self.config.search_timeout_ms);

        let candidates = match tokio::time::timeout(timeout, self.store.find_candidates(&query)).await
        {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                warn!(report_id = %report.id, error = %e, "Similarity search failed, degrading");
                return Corroboration::degraded(format!("store error: {}", e));
            }
            Err(_) => {
                warn!(
                    report_id = %report.id,
                    timeout_ms = self.config.search_timeout_ms,
                    "Similarity search timed out, degrading"
                );
                return Corroboration::degraded(format!(
                    "search timed out after {}ms",
                    self.config.search_timeout_ms
                ));
            }
        };

        let result = classify(report, &candidates, &self.config);
        debug!(
            report_id = %report.id,
            candidates = candidates.len(),
            corroborators = result.corroborators,
            duplicate_of = ?result.duplicate_of,
            "Similarity search complete"
        );
        result
    }
}

/// Sort candidates into duplicates, potential duplicates and corroborators.
///
/// Candidates are expected oldest first; the earliest same-reporter match
/// wins as `duplicate_of`, and only reports submitted before `report` can be
/// its original.
pub fn classify(report: &Report, candidates: &[Report], config: &DetectorConfig) -> Corroboration {
    let mut result = Corroboration::none();
    let mut seen_reporters: HashSet<&str> = HashSet::new();
    let signature = text::Signature::of(&report.narrative);

    for candidate in candidates {
        if candidate.id == report.id || candidate.status == Status::Invalid {
            continue;
        }
        let similarity = signature.similarity(&text::Signature::of(&candidate.narrative));
        if similarity > result.best_similarity {
            result.best_similarity = similarity;
        }

        match (report.reporter_id(), candidate.reporter_id()) {
            (Some(a), Some(b)) if a == b => {
                let earlier = (candidate.submitted_at, candidate.id) < (report.submitted_at, report.id);
                if similarity >= config.duplicate_threshold
                    && earlier
                    && result.duplicate_of.is_none()
                {
                    result.duplicate_of = Some(candidate.id);
                }
            }
            (None, None) if similarity >= config.duplicate_threshold => {
                result.potential_duplicates.push(candidate.id);
            }
            (_, other) if similarity >= config.corroboration_threshold => {
                let independent = match other {
                    Some(id) => seen_reporters.insert(id),
                    None => true,
                };
                if independent {
                    result.corroborators += 1;
                    result.corroborating_reports.push(candidate.id);
                }
            }
            _ => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::report;
    use uuid::Uuid;

    const STORY: &str = "At lunch the chicken rice served to class 4B smelled sour and twelve students vomited afterwards.";

    fn by(reporter: Option<&str>, narrative: &str, minutes_before: i64) -> Report {
        let mut r = report();
        r.id = Uuid::new_v4();
        r.reporter.reporter_id = reporter.map(str::to_string);
        r.narrative = narrative.to_string();
        r.submitted_at = r.submitted_at - Duration::minutes(minutes_before);
        r
    }

    #[test]
    fn test_same_reporter_duplicate_marks_earliest() {
        let config = DetectorConfig::default();
        let first = by(Some("rep-1"), STORY, 30);
        let second = by(Some("rep-1"), STORY, 20);
        let new = by(Some("rep-1"), STORY, 0);

        let result = classify(&new, &[first.clone(), second], &config);
        assert_eq!(result.duplicate_of, Some(first.id));
        assert_eq!(result.corroborators, 0);
    }

    #[test]
    fn test_later_same_reporter_match_is_not_an_original() {
        let config = DetectorConfig::default();
        let prior = by(Some("rep-1"), STORY, 30);
        let later = by(Some("rep-1"), STORY, 0);
        let result = classify(&prior, &[later], &config);
        assert_eq!(result.duplicate_of, None);
        assert_eq!(result.corroborators, 0);
    }

    #[test]
    fn test_distinct_reporters_corroborate_once_each() {
        let config = DetectorConfig::default();
        let new = by(Some("rep-1"), STORY, 0);
        let a1 = by(Some("rep-2"), STORY, 30);
        let a2 = by(Some("rep-2"), STORY, 20);
        let b = by(Some("rep-3"), STORY, 10);
        let anon = by(None, STORY, 5);

        let result = classify(&new, &[a1, a2, b, anon], &config);
        assert_eq!(result.corroborators, 3);
        assert_eq!(result.duplicate_of, None);
    }

    #[test]
    fn test_anonymous_near_identical_not_counted() {
        let config = DetectorConfig::default();
        let new = by(None, STORY, 0);
        let other = by(None, STORY, 10);
        let result = classify(&new, &[other.clone()], &config);
        assert_eq!(result.corroborators, 0);
        assert_eq!(result.potential_duplicates, vec![other.id]);
    }

    #[test]
    fn test_unrelated_and_invalid_candidates_ignored() {
        let config = DetectorConfig::default();
        let new = by(Some("rep-1"), STORY, 0);
        let unrelated = by(
            Some("rep-2"),
            "The delivery truck arrived two hours late so breakfast was skipped entirely.",
            10,
        );
        let mut rejected = by(Some("rep-3"), STORY, 10);
        rejected.status = Status::Invalid;

        let result = classify(&new, &[unrelated, rejected], &config);
        assert_eq!(result.corroborators, 0);
        assert!(result.best_similarity < config.corroboration_threshold);
    }
}
