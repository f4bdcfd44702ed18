//! Vigil Workflow: verification state machine and review orchestration
//!
//! [`ReviewService`] is the single entry point used by the API: it validates
//! and scores submissions, drives reports through the state machine and
//! serves the admin read side.

pub mod history;
pub mod metrics;
pub mod service;
pub mod state_machine;
pub mod submission;

pub use history::{AuditTrail, TrailSummary};
pub use metrics::EngineMetrics;
pub use service::{
    BulkItemResult, BulkOutcome, FactorMax, LevelRange, ReviewService, ThresholdTable,
    MAX_BULK_IDS,
};
pub use state_machine::{allowed_targets, authorize, can_transition, transition, TransitionPath};
pub use submission::{source_key, validate_draft, validate_evidence};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, Utc};
    use uuid::Uuid;
    use vigil_core::{
        Category, CredibilityLevel, EvidenceFile, InMemoryLocationDirectory, LocationRef,
        Relation, Report, ReportDraft, ReporterInfo, ScoreCard, Status,
    };

    pub fn directory() -> InMemoryLocationDirectory {
        InMemoryLocationDirectory::new()
            .with_province("31", "DKI Jakarta")
            .with_city("3171", "Jakarta Selatan", "31")
            .with_district("317101", "Tebet", "3171")
    }

    pub fn draft() -> ReportDraft {
        ReportDraft {
            category: Category::Poisoning,
            title: "Students sick after lunch".to_string(),
            narrative: "Several students felt sick after eating the chicken rice at lunch today."
                .to_string(),
            location: LocationRef {
                province_id: "31".to_string(),
                city_id: "3171".to_string(),
                district_id: Some("317101".to_string()),
                specific_location: None,
            },
            incident_at: Utc::now() - Duration::days(1),
            relation: Some(Relation::Parent),
            relation_detail: None,
            evidence: vec![EvidenceFile::new("photo-1", 2048, "image/jpeg")],
        }
    }

    pub fn report(status: Status) -> Report {
        let now = Utc::now();
        Report {
            id: Uuid::new_v4(),
            category: Category::Poisoning,
            title: "Students sick after lunch".to_string(),
            narrative: draft().narrative,
            location: draft().location,
            incident_at: now - Duration::days(1),
            reporter: ReporterInfo {
                reporter_id: Some("rep-1".to_string()),
                relation: Some(Relation::Parent),
                relation_detail: None,
            },
            evidence: vec![],
            submitted_at: now,
            updated_at: now,
            status,
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
                scored_at: now,
            },
            source_key: "k".to_string(),
            verified_by: None,
            notes: None,
        }
    }
}
