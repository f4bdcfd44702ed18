//! Credibility Scorer: runs every evaluator over one snapshot and aggregates
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_core::{
    CredibilityThresholds, Factor, FactorScore, LocationDirectory, Report, ReportId,
    ReporterProfile, Result, ScoreCard, ScoringConfig,
};

use crate::aggregate::{aggregate, CredibilityAssessment};
use crate::detector::Corroboration;
use crate::evidence::{usable_files, EvidenceFactor};
use crate::factor::{FactorEvaluator, ScoringInput};
use crate::history::ReporterHistoryFactor;
use crate::location_time::LocationTimeFactor;
use crate::narrative::NarrativeFactor;
use crate::relation::RelationFactor;
use crate::similarity::SimilarityFactor;

pub struct CredibilityScorer {
    evaluators: Vec<Box<dyn FactorEvaluator>>,
    thresholds: CredibilityThresholds,
    config: ScoringConfig,
}

/// Fields of a report that feed scoring; hashed for reproducibility checks
#[derive(Serialize)]
struct Snapshot<'a> {
    report: &'a ReportSnapshot<'a>,
    profile: Option<&'a ReporterProfile>,
    corroboration: &'a Corroboration,
}

#[derive(Serialize)]
struct ReportSnapshot<'a> {
    id: ReportId,
    category: vigil_core::Category,
    narrative: &'a str,
    location: &'a vigil_core::LocationRef,
    incident_at: DateTime<Utc>,
    submitted_at: DateTime<Utc>,
    reporter: &'a vigil_core::ReporterInfo,
    evidence: &'a [vigil_core::EvidenceFile],
}

impl CredibilityScorer {
    /// The six standard evaluators
    pub fn new(thresholds: CredibilityThresholds, config: ScoringConfig) -> Self {
        Self {
            evaluators: vec![
                Box::new(RelationFactor),
                Box::new(LocationTimeFactor),
                Box::new(EvidenceFactor),
                Box::new(NarrativeFactor),
                Box::new(ReporterHistoryFactor),
                Box::new(SimilarityFactor),
            ],
            thresholds,
            config,
        }
    }

    /// Replace the evaluator set
    pub fn with_evaluators(mut self, evaluators: Vec<Box<dyn FactorEvaluator>>) -> Self {
        self.evaluators = evaluators;
        self
    }

    pub fn thresholds(&self) -> &CredibilityThresholds {
        &self.thresholds
    }

    /// Sum of every evaluator's maximum
    pub fn max_total(&self) -> u32 {
        self.evaluators.iter().map(|e| e.max()).sum()
    }

    pub fn maxima(&self) -> Vec<(Factor, u32)> {
        self.evaluators.iter().map(|e| (e.factor(), e.max())).collect()
    }

    /// Score one snapshot.
    ///
    /// Deterministic for fixed inputs apart from `scored_at`. Any evaluator
    /// returning an out-of-range value fails the whole scoring. A report
    /// without usable evidence never classifies above
    /// `zero_evidence_level_cap`, whatever the other factors add up to.
    pub fn score(
        &self,
        report: &Report,
        profile: Option<&ReporterProfile>,
        directory: &dyn LocationDirectory,
        corroboration: &Corroboration,
        scored_at: DateTime<Utc>,
    ) -> Result<ScoreCard> {
        let input = ScoringInput {
            report,
            profile,
            directory,
            corroboration,
            config: &self.config,
        };

        let factors: Vec<FactorScore> = self.evaluators.iter().map(|e| e.evaluate(&input)).collect();
        let (total, mut level) = aggregate(&factors, &self.thresholds)?;

        let mut level_cap = None;
        let cap = self.config.zero_evidence_level_cap;
        if level > cap && usable_files(&report.evidence).next().is_none() {
            level_cap = Some(format!(
                "total {} classifies as {} but no usable evidence is attached; capped at {}",
                total, level, cap
            ));
            level = cap;
        }

        Ok(ScoreCard {
            factors,
            total,
            level,
            provisional: corroboration.is_degraded(),
            degradation: corroboration.degraded.clone(),
            corroborators: corroboration.corroborators,
            duplicate_of: corroboration.duplicate_of,
            level_cap,
            snapshot_hash: snapshot_hash(report, profile, corroboration),
            scored_at,
        })
    }
}

fn snapshot_hash(
    report: &Report,
    profile: Option<&ReporterProfile>,
    corroboration: &Corroboration,
) -> String {
    let snapshot = Snapshot {
        report: &ReportSnapshot {
            id: report.id,
            category: report.category,
            narrative: &report.narrative,
            location: &report.location,
            incident_at: report.incident_at,
            submitted_at: report.submitted_at,
            reporter: &report.reporter,
            evidence: &report.evidence,
        },
        profile,
        corroboration,
    };
    let data = serde_json::to_string(&snapshot).unwrap_or_default();
    format!("blake3:{}", blake3::hash(data.as_bytes()))
}

/// Admin view of a report's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringBreakdown {
    pub report_id: ReportId,
    pub factors: Vec<FactorScore>,
    pub total: u32,
    pub max_total: u32,
    pub level: vigil_core::CredibilityLevel,
    pub provisional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation: Option<String>,
    pub corroborators: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<ReportId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_cap: Option<String>,
    pub explanation: String,
    pub recommendations: Vec<String>,
    pub thresholds: CredibilityThresholds,
    pub snapshot_hash: String,
    pub scored_at: DateTime<Utc>,
}

impl ScoringBreakdown {
    pub fn from_report(report: &Report, thresholds: &CredibilityThresholds) -> Result<Self> {
        let card = &report.score;
        let assessment = CredibilityAssessment::with_level(&card.factors, thresholds, card.level)?;
        Ok(Self {
            report_id: report.id,
            factors: card.factors.clone(),
            total: card.total,
            max_total: assessment.max_total,
            level: card.level,
            provisional: card.provisional,
            degradation: card.degradation.clone(),
            corroborators: card.corroborators,
            duplicate_of: card.duplicate_of,
            level_cap: card.level_cap.clone(),
            explanation: assessment.explanation,
            recommendations: assessment.recommendations,
            thresholds: *thresholds,
            snapshot_hash: card.snapshot_hash.clone(),
            scored_at: card.scored_at,
        })
    }

    pub fn value_of(&self, factor: Factor) -> u32 {
        self.factors
            .iter()
            .find(|f| f.factor == factor)
            .map(|f| f.value)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{directory, report};
    use vigil_core::{CredibilityLevel, VigilError};

    struct Broken;

    impl FactorEvaluator for Broken {
        fn factor(&self) -> Factor {
            Factor::Evidence
        }
        fn max(&self) -> u32 {
            4
        }
        fn evaluate(&self, _input: &ScoringInput<'_>) -> FactorScore {
            self.score(9, "bogus")
        }
    }

    fn scorer() -> CredibilityScorer {
        CredibilityScorer::new(CredibilityThresholds::default(), ScoringConfig::default())
    }

    #[test]
    fn test_deterministic_for_fixed_snapshot() {
        let r = report();
        let dir = directory();
        let c = Corroboration::none();
        let a = scorer().score(&r, None, &dir, &c, r.submitted_at).unwrap();
        let b = scorer().score(&r, None, &dir, &c, r.submitted_at).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.factors.len(), 6);
        assert!(a.snapshot_hash.starts_with("blake3:"));
    }

    #[test]
    fn test_total_matches_factor_sum_and_level() {
        let r = report();
        let card = scorer()
            .score(&r, None, &directory(), &Corroboration::none(), r.submitted_at)
            .unwrap();
        let sum: u32 = card.factors.iter().map(|f| f.value).sum();
        assert_eq!(card.total, sum);
        assert_eq!(card.level, CredibilityThresholds::default().classify(sum));
        assert_eq!(scorer().max_total(), 18);
    }

    #[test]
    fn test_degraded_search_marks_provisional() {
        let r = report();
        let card = scorer()
            .score(&r, None, &directory(), &Corroboration::degraded("timeout"), r.submitted_at)
            .unwrap();
        assert!(card.provisional);
        assert_eq!(card.value_of(Factor::Similarity), 0);
    }

    #[test]
    fn test_out_of_range_evaluator_fails_scoring() {
        let r = report();
        let scorer = scorer().with_evaluators(vec![Box::new(Broken)]);
        let err = scorer
            .score(&r, None, &directory(), &Corroboration::none(), r.submitted_at)
            .unwrap_err();
        assert!(matches!(err, VigilError::Validation { .. }));
    }

    const DETAILED: &str = "At 12:30 during lunch the chicken rice served in class 4B smelled sour. \
        Twelve students vomited within the hour and 3 children were taken to the clinic. The canteen \
        staff said the rice had been cooked the evening before and left uncovered overnight.";

    fn strong_without_evidence() -> Report {
        let mut r = report();
        r.evidence.clear();
        r.narrative = DETAILED.to_string();
        r.reporter.relation = Some(vigil_core::Relation::Teacher);
        r
    }

    #[test]
    fn test_zero_evidence_never_above_low() {
        let r = strong_without_evidence();
        let trusted = ReporterProfile {
            reporter_id: "rep-1".to_string(),
            total_reports: 10,
            verified: 9,
            rejected: 1,
        };
        let corroborated = Corroboration {
            corroborators: 7,
            ..Corroboration::none()
        };
        let card = scorer()
            .score(&r, Some(&trusted), &directory(), &corroborated, r.submitted_at)
            .unwrap();

        assert_eq!(card.value_of(Factor::Evidence), 0);
        assert_eq!(card.total, 14);
        assert_eq!(card.level, CredibilityLevel::Low);
        assert!(card.level_cap.is_some());

        let first_time = scorer()
            .score(&r, None, &directory(), &Corroboration::none(), r.submitted_at)
            .unwrap();
        assert!(first_time.total >= 7);
        assert_eq!(first_time.level, CredibilityLevel::Low);
    }

    #[test]
    fn test_empty_uploads_do_not_lift_the_cap() {
        let mut r = strong_without_evidence();
        r.evidence = vec![vigil_core::EvidenceFile::new("blank", 0, "image/jpeg")];
        let card = scorer()
            .score(&r, None, &directory(), &Corroboration::none(), r.submitted_at)
            .unwrap();
        assert_eq!(card.level, CredibilityLevel::Low);
    }

    #[test]
    fn test_cap_is_configurable_and_skipped_with_evidence() {
        let r = strong_without_evidence();
        let config = ScoringConfig {
            zero_evidence_level_cap: CredibilityLevel::Medium,
            ..ScoringConfig::default()
        };
        let card = CredibilityScorer::new(CredibilityThresholds::default(), config)
            .score(&r, None, &directory(), &Corroboration::none(), r.submitted_at)
            .unwrap();
        assert_eq!(card.level, CredibilityLevel::Medium);

        let mut with_photo = strong_without_evidence();
        with_photo.evidence = vec![vigil_core::EvidenceFile::new("photo-1", 2048, "image/jpeg")];
        let card = scorer()
            .score(&with_photo, None, &directory(), &Corroboration::none(), with_photo.submitted_at)
            .unwrap();
        assert!(card.level_cap.is_none());
        assert_eq!(card.level, CredibilityThresholds::default().classify(card.total));
    }

    #[test]
    fn test_breakdown_from_report() {
        let mut r = report();
        let card = scorer()
            .score(&r, None, &directory(), &Corroboration::none(), r.submitted_at)
            .unwrap();
        r.apply_score(card);
        let breakdown = ScoringBreakdown::from_report(&r, &CredibilityThresholds::default()).unwrap();
        assert_eq!(breakdown.total, r.total_score);
        assert_eq!(breakdown.max_total, 18);
        assert!(breakdown.level >= CredibilityLevel::Low);
    }
}
