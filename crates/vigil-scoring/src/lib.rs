//! Vigil Scoring: credibility of a citizen report
//!
//! Six independent evaluators each score one signal of a report snapshot
//! within a fixed maximum:
//!
//! | Factor | Max |
//! |---|---|
//! | relation | 3 |
//! | locationTime | 3 |
//! | evidence | 4 |
//! | narrative | 3 |
//! | reporterHistory | 2 |
//! | similarity | 3 |
//!
//! The aggregator sums them and maps the total onto a credibility level. The
//! similarity factor is fed by the [`DuplicateDetector`], which also marks
//! same-reporter duplicates.

pub mod aggregate;
pub mod detector;
pub mod evidence;
pub mod factor;
pub mod history;
pub mod location_time;
pub mod narrative;
pub mod relation;
pub mod scorer;
pub mod similarity;
pub mod text;

pub use aggregate::{aggregate, CredibilityAssessment};
pub use detector::{classify, Corroboration, DuplicateDetector};
pub use evidence::{usable_files, EvidenceFactor, EvidenceFamily};
pub use factor::{FactorEvaluator, ScoringInput};
pub use history::ReporterHistoryFactor;
pub use location_time::LocationTimeFactor;
pub use narrative::NarrativeFactor;
pub use relation::RelationFactor;
pub use scorer::{CredibilityScorer, ScoringBreakdown};
pub use similarity::SimilarityFactor;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;
    use vigil_core::{
        Category, CredibilityLevel, EvidenceFile, FactorScore, InMemoryLocationDirectory,
        LocationRef, Relation, Report, ReporterInfo, ReporterProfile, ScoreCard, ScoringConfig,
        Status,
    };

    use crate::detector::Corroboration;
    use crate::factor::{FactorEvaluator, ScoringInput};

    pub fn directory() -> InMemoryLocationDirectory {
        InMemoryLocationDirectory::new()
            .with_province("31", "DKI Jakarta")
            .with_city("3171", "Jakarta Selatan", "31")
            .with_district("317101", "Tebet", "3171")
            .with_province("32", "Jawa Barat")
            .with_city("3273", "Bandung", "32")
    }

    pub fn report() -> Report {
        let submitted = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        Report {
            id: Uuid::new_v4(),
            category: Category::Poisoning,
            title: "Students sick after lunch".to_string(),
            narrative: "Several students felt sick after eating the school lunch on Friday."
                .to_string(),
            location: LocationRef {
                province_id: "31".to_string(),
                city_id: "3171".to_string(),
                district_id: Some("317101".to_string()),
                specific_location: Some("SDN Tebet 01 canteen".to_string()),
            },
            incident_at: submitted - Duration::hours(20),
            reporter: ReporterInfo {
                reporter_id: Some("rep-1".to_string()),
                relation: Some(Relation::Parent),
                relation_detail: None,
            },
            evidence: vec![EvidenceFile::new("photo-1", 2048, "image/jpeg")],
            submitted_at: submitted,
            updated_at: submitted,
            status: Status::Pending,
            credibility_level: CredibilityLevel::Low,
            total_score: 0,
            score: ScoreCard {
                factors: vec![],
                total: 0,
                level: CredibilityLevel::Low,
                provisional: false,
                degradation: None,
                corroborators: 0,
                duplicate_of: None,
                level_cap: None,
                snapshot_hash: String::new(),
                scored_at: submitted,
            },
            source_key: "rep-1".to_string(),
            verified_by: None,
            notes: None,
        }
    }

    /// Run `f` over an input built from the fixture directory and defaults
    pub fn input_with<T>(
        report: &Report,
        profile: Option<&ReporterProfile>,
        corroboration: Option<&Corroboration>,
        f: impl FnOnce(&ScoringInput<'_>) -> T,
    ) -> T {
        let dir = directory();
        let none = Corroboration::none();
        let config = ScoringConfig::default();
        let input = ScoringInput {
            report,
            profile,
            directory: &dir,
            corroboration: corroboration.unwrap_or(&none),
            config: &config,
        };
        f(&input)
    }

    pub fn evaluate<E: FactorEvaluator>(evaluator: &E, report: &Report) -> FactorScore {
        input_with(report, None, None, |input| evaluator.evaluate(input))
    }
}
