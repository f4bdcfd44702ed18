//! Vigil Core: data model, error taxonomy, request context and configuration
//!
//! Shared vocabulary of the report credibility & verification engine. Every
//! other crate in the workspace builds on these types.

pub mod config;
pub mod context;
pub mod data_model;
pub mod error;
pub mod location;

pub use config::{
    CredibilityThresholds, DetectorConfig, EngineConfig, RateLimitConfig, ScoringConfig,
    SubmissionConfig,
};
pub use context::{Actor, Clock, FixedClock, RequestContext, Role, SystemClock};
pub use data_model::{
    Category, CredibilityLevel, EvidenceFile, Factor, FactorScore, LocationRef, Relation,
    Report, ReportDraft, ReportId, ReporterInfo, ReporterProfile, ScoreCard, Status,
    StatusHistoryEntry,
};
pub use error::{Result, VigilError};
pub use location::{InMemoryLocationDirectory, LocationDirectory};

/// Engine version
pub const VIGIL_VERSION: &str = "1.0.0";
