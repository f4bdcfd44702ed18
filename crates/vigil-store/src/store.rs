//! Persistence contract
//!
//! Every write that must stay consistent with another write goes through a
//! single call: a status change and its history entry are one
//! [`TransitionCommit`], guarded by a compare-and-set on the expected status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use vigil_core::{
    EvidenceFile, Report, ReportId, ReporterProfile, ScoreCard, Status, StatusHistoryEntry,
    VigilError,
};

use crate::query::{CandidateQuery, Pagination, ReportFilter, ReportStats};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("report {0} not found")]
    NotFound(ReportId),

    #[error("report {id} is {actual}, expected {expected}")]
    StatusMismatch {
        id: ReportId,
        expected: Status,
        actual: Status,
    },

    #[error("report {0} already exists")]
    AlreadyExists(ReportId),

    /// Scoring inputs changed since the score was computed
    #[error("score for report {0} is stale")]
    Stale(ReportId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for VigilError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound(id) => VigilError::NotFound(format!("report {}", id)),
            StoreError::StatusMismatch { actual, .. } => {
                VigilError::conflict(format!("{} (status changed concurrently)", message), actual)
            }
            StoreError::Stale(_) => VigilError::Conflict {
                message,
                current_status: None,
            },
            StoreError::AlreadyExists(_) | StoreError::Unavailable(_) => {
                VigilError::Storage(message)
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Atomic status change: CAS on `expected`, append `entry`, apply extras
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub report_id: ReportId,
    pub expected: Status,
    pub entry: StatusHistoryEntry,
    /// Recorded as the report's verifier when set
    pub verified_by: Option<String>,
    /// Files appended by an evidence resubmission
    pub new_evidence: Vec<EvidenceFile>,
    /// Score recomputed together with the transition
    pub score: Option<ScoreCard>,
}

impl TransitionCommit {
    pub fn new(report_id: ReportId, expected: Status, entry: StatusHistoryEntry) -> Self {
        Self {
            report_id,
            expected,
            entry,
            verified_by: None,
            new_evidence: Vec::new(),
            score: None,
        }
    }

    pub fn verified_by(mut self, actor: impl Into<String>) -> Self {
        self.verified_by = Some(actor.into());
        self
    }

    pub fn with_evidence(mut self, files: Vec<EvidenceFile>, score: ScoreCard) -> Self {
        self.new_evidence = files;
        self.score = Some(score);
        self
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a new report together with its initial history entry
    async fn insert(&self, report: Report, initial: StatusHistoryEntry) -> StoreResult<()>;

    async fn get(&self, id: ReportId) -> StoreResult<Option<Report>>;

    /// Audit trail in append order
    async fn history(&self, id: ReportId) -> StoreResult<Vec<StatusHistoryEntry>>;

    /// Apply a status change atomically; fails with `StatusMismatch` when the
    /// report is no longer in `commit.expected`
    async fn commit_transition(&self, commit: TransitionCommit) -> StoreResult<Report>;

    /// Replace the score card when the report is still in `expected` with
    /// `evidence_count` files; `Stale` otherwise
    async fn replace_score(
        &self,
        id: ReportId,
        expected: Status,
        evidence_count: usize,
        score: ScoreCard,
    ) -> StoreResult<Report>;

    /// Prior reports near a new one, oldest submission first
    async fn find_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Report>>;

    /// Filtered page, newest submission first, plus the unpaginated total
    async fn query(
        &self,
        filter: &ReportFilter,
        pagination: Pagination,
    ) -> StoreResult<(Vec<Report>, u64)>;

    async fn count_submissions_since(
        &self,
        source_key: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<usize>;

    async fn profile(&self, reporter_id: &str) -> StoreResult<Option<ReporterProfile>>;

    async fn stats(&self) -> StoreResult<ReportStats>;
}
