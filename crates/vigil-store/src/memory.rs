//! In-memory report store
//!
//! Reports and their history live under one lock so a transition and its
//! history entry are never observed apart. Reporter profile counters sit in a
//! separate map of atomics; terminal transitions of different reports by the
//! same reporter increment them without a read-modify-write race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use vigil_core::{Report, ReportId, ReporterProfile, ScoreCard, Status, StatusHistoryEntry};

use crate::query::{CandidateQuery, Pagination, ReportFilter, ReportStats};
use crate::store::{ReportStore, StoreError, StoreResult, TransitionCommit};

struct StoredReport {
    report: Report,
    history: Vec<StatusHistoryEntry>,
}

#[derive(Default)]
struct ProfileCounters {
    total_reports: AtomicU64,
    verified: AtomicU64,
    rejected: AtomicU64,
}

impl ProfileCounters {
    fn snapshot(&self, reporter_id: &str) -> ReporterProfile {
        ReporterProfile {
            reporter_id: reporter_id.to_string(),
            total_reports: self.total_reports.load(Ordering::SeqCst),
            verified: self.verified.load(Ordering::SeqCst),
            rejected: self.rejected.load(Ordering::SeqCst),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    reports: RwLock<HashMap<ReportId, StoredReport>>,
    profiles: RwLock<HashMap<String, Arc<ProfileCounters>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn counters(&self, reporter_id: &str) -> Arc<ProfileCounters> {
        if let Some(counters) = self.profiles.read().get(reporter_id) {
            return Arc::clone(counters);
        }
        let mut profiles = self.profiles.write();
        Arc::clone(profiles.entry(reporter_id.to_string()).or_default())
    }

    fn record_verdict(&self, reporter_id: &str, status: Status) {
        let counters = self.counters(reporter_id);
        match status {
            Status::Resolved => {
                counters.verified.fetch_add(1, Ordering::SeqCst);
            }
            Status::Invalid => {
                counters.rejected.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert(&self, report: Report, initial: StatusHistoryEntry) -> StoreResult<()> {
        let reporter = report.reporter.reporter_id.clone();
        {
            let mut reports = self.reports.write();
            if reports.contains_key(&report.id) {
                return Err(StoreError::AlreadyExists(report.id));
            }
            reports.insert(
                report.id,
                StoredReport {
                    report,
                    history: vec![initial],
                },
            );
        }

        if let Some(reporter) = reporter {
            self.counters(&reporter)
                .total_reports
                .fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn get(&self, id: ReportId) -> StoreResult<Option<Report>> {
        Ok(self.reports.read().get(&id).map(|s| s.report.clone()))
    }

    async fn history(&self, id: ReportId) -> StoreResult<Vec<StatusHistoryEntry>> {
        self.reports
            .read()
            .get(&id)
            .map(|s| s.history.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn commit_transition(&self, commit: TransitionCommit) -> StoreResult<Report> {
        let updated = {
            let mut reports = self.reports.write();
            let stored = reports
                .get_mut(&commit.report_id)
                .ok_or(StoreError::NotFound(commit.report_id))?;

            if stored.report.status != commit.expected {
                return Err(StoreError::StatusMismatch {
                    id: commit.report_id,
                    expected: commit.expected,
                    actual: stored.report.status,
                });
            }

            let report = &mut stored.report;
            report.status = commit.entry.to_status;
            report.updated_at = commit.entry.at;
            if commit.entry.notes.is_some() {
                report.notes = commit.entry.notes.clone();
            }
            if let Some(verifier) = commit.verified_by {
                report.verified_by = Some(verifier);
            }
            report.evidence.extend(commit.new_evidence);
            if let Some(score) = commit.score {
                report.apply_score(score);
            }

            stored.history.push(commit.entry);
            stored.report.clone()
        };

        if updated.status.is_terminal() {
            if let Some(reporter) = updated.reporter_id() {
                self.record_verdict(reporter, updated.status);
            }
        }

        debug!(report = %updated.id, status = %updated.status, "transition committed");
        Ok(updated)
    }

    async fn replace_score(
        &self,
        id: ReportId,
        expected: Status,
        evidence_count: usize,
        score: ScoreCard,
    ) -> StoreResult<Report> {
        let mut reports = self.reports.write();
        let stored = reports.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if stored.report.status != expected || stored.report.evidence.len() != evidence_count {
            return Err(StoreError::Stale(id));
        }
        stored.report.apply_score(score);
        Ok(stored.report.clone())
    }

    async fn find_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Report>> {
        let reports = self.reports.read();
        let mut found: Vec<Report> = reports
            .values()
            .map(|s| &s.report)
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        found.truncate(query.limit);
        Ok(found)
    }

    async fn query(
        &self,
        filter: &ReportFilter,
        pagination: Pagination,
    ) -> StoreResult<(Vec<Report>, u64)> {
        let reports = self.reports.read();
        let mut matched: Vec<&Report> = reports
            .values()
            .map(|s| &s.report)
            .filter(|r| filter.matches(r))
            .collect();
        matched.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(a.id.cmp(&b.id)));

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn count_submissions_since(
        &self,
        source_key: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<usize> {
        Ok(self
            .reports
            .read()
            .values()
            .filter(|s| s.report.source_key == source_key && s.report.submitted_at >= since)
            .count())
    }

    async fn profile(&self, reporter_id: &str) -> StoreResult<Option<ReporterProfile>> {
        Ok(self
            .profiles
            .read()
            .get(reporter_id)
            .map(|c| c.snapshot(reporter_id)))
    }

    async fn stats(&self) -> StoreResult<ReportStats> {
        let mut stats = ReportStats::default();
        for stored in self.reports.read().values() {
            stats.record(&stored.report);
        }
        Ok(stats)
    }
}
