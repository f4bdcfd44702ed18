//! Data Model: Report, ScoreCard, StatusHistoryEntry, ReporterProfile
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type ReportId = Uuid;

// ============================================================================
// CLASSIFICATION ENUMS
// ============================================================================

/// Category of irregularity being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Poisoning,
    FoodQuality,
    Nutrition,
    Distribution,
    KitchenHygiene,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Poisoning,
        Category::FoodQuality,
        Category::Nutrition,
        Category::Distribution,
        Category::KitchenHygiene,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Poisoning => "poisoning",
            Category::FoodQuality => "food_quality",
            Category::Nutrition => "nutrition",
            Category::Distribution => "distribution",
            Category::KitchenHygiene => "kitchen_hygiene",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared relation of the reporter to the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Parent,
    Teacher,
    Principal,
    Supplier,
    Student,
    Community,
    Other,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Parent => "parent",
            Relation::Teacher => "teacher",
            Relation::Principal => "principal",
            Relation::Supplier => "supplier",
            Relation::Student => "student",
            Relation::Community => "community",
            Relation::Other => "other",
        }
    }
}

/// Review status of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Analyzing,
    NeedsEvidence,
    Invalid,
    InProgress,
    Resolved,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Pending,
        Status::Analyzing,
        Status::NeedsEvidence,
        Status::Invalid,
        Status::InProgress,
        Status::Resolved,
    ];

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Invalid | Status::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Analyzing => "analyzing",
            Status::NeedsEvidence => "needs_evidence",
            Status::Invalid => "invalid",
            Status::InProgress => "in_progress",
            Status::Resolved => "resolved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse credibility classification derived from the total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredibilityLevel {
    #[default]
    Low = 0,
    Medium = 1,
    High = 2,
}

impl fmt::Display for CredibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CredibilityLevel::Low => write!(f, "low"),
            CredibilityLevel::Medium => write!(f, "medium"),
            CredibilityLevel::High => write!(f, "high"),
        }
    }
}

/// Named scoring signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Factor {
    Relation,
    LocationTime,
    Evidence,
    Narrative,
    ReporterHistory,
    Similarity,
}

impl Factor {
    pub const ALL: [Factor; 6] = [
        Factor::Relation,
        Factor::LocationTime,
        Factor::Evidence,
        Factor::Narrative,
        Factor::ReporterHistory,
        Factor::Similarity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Relation => "relation",
            Factor::LocationTime => "locationTime",
            Factor::Evidence => "evidence",
            Factor::Narrative => "narrative",
            Factor::ReporterHistory => "reporterHistory",
            Factor::Similarity => "similarity",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SUBMISSION PARTS
// ============================================================================

/// Location descriptor; IDs are stable references into the location directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocationRef {
    pub province_id: String,
    pub city_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_location: Option<String>,
}

/// Reference to an uploaded file, as supplied by evidence storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceFile {
    pub reference: String,
    pub size_bytes: u64,
    pub content_type: String,
}

impl EvidenceFile {
    pub fn new(reference: impl Into<String>, size_bytes: u64, content_type: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            size_bytes,
            content_type: content_type.into(),
        }
    }
}

/// Reporter identity and declared relation; every part may be absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReporterInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_detail: Option<String>,
}

/// Citizen submission before validation and scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    pub category: Category,
    pub title: String,
    pub narrative: String,
    pub location: LocationRef,
    pub incident_at: DateTime<Utc>,
    #[serde(default)]
    pub relation: Option<Relation>,
    #[serde(default)]
    pub relation_detail: Option<String>,
    #[serde(default)]
    pub evidence: Vec<EvidenceFile>,
}

// ============================================================================
// SCORING
// ============================================================================

/// One named score with its fixed maximum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorScore {
    pub factor: Factor,
    pub value: u32,
    pub max: u32,
    /// Human-readable explanation of the value
    #[serde(default)]
    pub detail: String,
}

impl FactorScore {
    pub fn new(factor: Factor, value: u32, max: u32) -> Self {
        Self {
            factor,
            value,
            max,
            detail: String::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Complete scoring result for one report snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    pub factors: Vec<FactorScore>,
    pub total: u32,
    pub level: CredibilityLevel,
    /// Set when the similarity factor fell back to its safe default
    pub provisional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation: Option<String>,
    /// Independent corroborating reports found by the detector
    pub corroborators: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<ReportId>,
    /// Why `level` sits below what `total` classifies as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_cap: Option<String>,
    /// blake3 of the scoring input snapshot
    pub snapshot_hash: String,
    pub scored_at: DateTime<Utc>,
}

impl ScoreCard {
    pub fn factor(&self, factor: Factor) -> Option<&FactorScore> {
        self.factors.iter().find(|f| f.factor == factor)
    }

    pub fn value_of(&self, factor: Factor) -> u32 {
        self.factor(factor).map(|f| f.value).unwrap_or(0)
    }
}

// ============================================================================
// REPORT & AUDIT TRAIL
// ============================================================================

/// A submitted case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub category: Category,
    pub title: String,
    pub narrative: String,
    pub location: LocationRef,
    pub incident_at: DateTime<Utc>,
    pub reporter: ReporterInfo,
    pub evidence: Vec<EvidenceFile>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: Status,
    pub credibility_level: CredibilityLevel,
    pub total_score: u32,
    pub score: ScoreCard,
    /// blake3 fingerprint of the submitter, used for flood control
    pub source_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Report {
    /// Replace the score card, keeping the denormalized total/level in sync
    pub fn apply_score(&mut self, score: ScoreCard) {
        self.total_score = score.total;
        self.credibility_level = score.level;
        self.score = score;
    }

    pub fn duplicate_of(&self) -> Option<ReportId> {
        self.score.duplicate_of
    }

    pub fn reporter_id(&self) -> Option<&str> {
        self.reporter.reporter_id.as_deref()
    }
}

/// Immutable record of one status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub report_id: ReportId,
    /// None only for the initial entry written on submission
    pub from_status: Option<Status>,
    pub to_status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub actor: String,
    pub at: DateTime<Utc>,
}

/// Aggregate verdict counts for one reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReporterProfile {
    pub reporter_id: String,
    pub total_reports: u64,
    /// Reports that reached `resolved`
    pub verified: u64,
    /// Reports that reached `invalid`
    pub rejected: u64,
}

impl ReporterProfile {
    pub fn new(reporter_id: impl Into<String>) -> Self {
        Self {
            reporter_id: reporter_id.into(),
            ..Default::default()
        }
    }

    /// Reports with a terminal verdict
    pub fn resolved(&self) -> u64 {
        self.verified + self.rejected
    }

    /// verified / (verified + rejected), None without any verdict
    pub fn verified_ratio(&self) -> Option<f64> {
        let resolved = self.resolved();
        if resolved == 0 {
            None
        } else {
            Some(self.verified as f64 / resolved as f64)
        }
    }
}
