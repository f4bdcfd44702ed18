//! Review Orchestrator
//!
//! Entry point for every operation on reports. Each call takes the caller's
//! [`RequestContext`] explicitly; the service holds no per-request state and
//! all shared mutable state lives behind the [`ReportStore`].

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vigil_core::{
    Clock, CredibilityLevel, CredibilityThresholds, EngineConfig, EvidenceFile, Factor,
    LocationDirectory, Report, ReportDraft, ReportId, ReporterInfo, RequestContext, Result,
    ScoreCard, Status, StatusHistoryEntry, SystemClock, VigilError,
};
use vigil_scoring::{Corroboration, CredibilityScorer, DuplicateDetector, ScoringBreakdown};
use vigil_store::{Page, Pagination, ReportFilter, ReportStats, ReportStore, StoreError, TransitionCommit};

use crate::history::AuditTrail;
use crate::metrics::EngineMetrics;
use crate::state_machine::{transition, TransitionPath};
use crate::submission::{source_key, validate_draft, validate_evidence};

/// Upper bound on ids accepted by one bulk request
pub const MAX_BULK_IDS: usize = 100;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Per-id result of a bulk status update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    pub id: ReportId,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
}

/// Score range covered by one credibility level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRange {
    pub level: CredibilityLevel,
    pub min: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorMax {
    pub factor: Factor,
    pub max: u32,
}

/// Read-only credibility table for admin tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdTable {
    pub thresholds: CredibilityThresholds,
    pub max_total: u32,
    pub levels: Vec<LevelRange>,
    pub factors: Vec<FactorMax>,
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct ReviewService {
    store: Arc<dyn ReportStore>,
    directory: Arc<dyn LocationDirectory>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    scorer: CredibilityScorer,
    detector: DuplicateDetector,
    metrics: Option<EngineMetrics>,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn ReportStore>,
        directory: Arc<dyn LocationDirectory>,
        config: EngineConfig,
    ) -> Self {
        let scorer = CredibilityScorer::new(config.thresholds, config.scoring.clone());
        let detector = DuplicateDetector::new(Arc::clone(&store), config.detector.clone());
        Self {
            store,
            directory,
            config,
            clock: Arc::new(SystemClock),
            scorer,
            detector,
            metrics: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Submission & scoring
    // ------------------------------------------------------------------------

    /// Validate, score and persist a new report as `pending`
    pub async fn submit(&self, ctx: &RequestContext, draft: ReportDraft) -> Result<Report> {
        let now = self.clock.now();
        let key = source_key(ctx);

        let window = Duration::minutes(self.config.rate_limit.window_minutes);
        let recent = self
            .store
            .count_submissions_since(&key, now - window)
            .await?;
        if recent >= self.config.rate_limit.max_submissions {
            if let Some(m) = &self.metrics {
                m.rate_limited();
            }
            warn!(recent, "Submission rejected by rate limit");
            return Err(VigilError::RateLimited(format!(
                "at most {} submissions per {} minutes",
                self.config.rate_limit.max_submissions, self.config.rate_limit.window_minutes
            )));
        }

        validate_draft(&draft, &self.config.submission, self.directory.as_ref(), now)?;

        let placeholder = ScoreCard {
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
        };
        let mut report = Report {
            id: Uuid::new_v4(),
            category: draft.category,
            title: draft.title.trim().to_string(),
            narrative: draft.narrative.trim().to_string(),
            location: draft.location,
            incident_at: draft.incident_at,
            reporter: ReporterInfo {
                reporter_id: ctx.reporter_id.clone(),
                relation: draft.relation,
                relation_detail: draft.relation_detail,
            },
            evidence: draft.evidence,
            submitted_at: now,
            updated_at: now,
            status: Status::Pending,
            credibility_level: CredibilityLevel::Low,
            total_score: 0,
            score: placeholder,
            source_key: key,
            verified_by: None,
            notes: None,
        };

        let (card, corroboration) = self.score_report(&report).await?;
        report.apply_score(card);

        let initial = StatusHistoryEntry {
            id: Uuid::new_v4(),
            report_id: report.id,
            from_status: None,
            to_status: Status::Pending,
            notes: None,
            actor: ctx
                .reporter_id
                .clone()
                .unwrap_or_else(|| "anonymous".to_string()),
            at: now,
        };
        self.store.insert(report.clone(), initial).await?;

        if let Some(m) = &self.metrics {
            m.submission(&report.credibility_level.to_string());
        }
        info!(
            report_id = %report.id,
            category = %report.category,
            total = report.total_score,
            level = %report.credibility_level,
            provisional = report.score.provisional,
            "Report submitted"
        );

        self.back_propagate(&corroboration.corroborating_reports).await;
        Ok(report)
    }

    /// Full scoring of one snapshot, detector included
    async fn score_report(&self, report: &Report) -> Result<(ScoreCard, Corroboration)> {
        let profile = match report.reporter_id() {
            Some(id) => self.store.profile(id).await?,
            None => None,
        };
        let corroboration = self.detector.detect(report).await;
        if corroboration.is_degraded() {
            if let Some(m) = &self.metrics {
                m.detector_degraded();
            }
        }
        let card = self.scorer.score(
            report,
            profile.as_ref(),
            self.directory.as_ref(),
            &corroboration,
            self.clock.now(),
        )?;
        Ok((card, corroboration))
    }

    /// Re-score prior reports a new submission corroborates.
    ///
    /// Best effort: the new report is already persisted, so failures here are
    /// logged and left for the next re-score.
    async fn back_propagate(&self, ids: &[ReportId]) {
        for id in ids {
            let prior = match self.store.get(*id).await {
                Ok(Some(prior)) if !prior.status.is_terminal() => prior,
                Ok(_) => continue,
                Err(e) => {
                    warn!(report_id = %id, error = %e, "Cannot load corroborated report");
                    continue;
                }
            };
            let card = match self.score_report(&prior).await {
                Ok((card, _)) => card,
                Err(e) => {
                    warn!(report_id = %id, error = %e, "Re-scoring corroborated report failed");
                    continue;
                }
            };
            match self
                .store
                .replace_score(*id, prior.status, prior.evidence.len(), card)
                .await
            {
                Ok(updated) => debug!(
                    report_id = %id,
                    total = updated.total_score,
                    corroborators = updated.score.corroborators,
                    "Corroborated report re-scored"
                ),
                Err(StoreError::Stale(_)) => {
                    debug!(report_id = %id, "Status or evidence changed during re-score, skipped")
                }
                Err(e) => warn!(report_id = %id, error = %e, "Storing re-score failed"),
            }
        }
    }

    /// Factor breakdown of a report's current score (admin only)
    pub async fn get_scoring(&self, ctx: &RequestContext, id: ReportId) -> Result<ScoringBreakdown> {
        ctx.require_admin()?;
        let report = self.load(id).await?;
        ScoringBreakdown::from_report(&report, &self.config.thresholds)
    }

    // ------------------------------------------------------------------------
    // Status transitions
    // ------------------------------------------------------------------------

    /// Move one report to `target`, returning the recorded history entry
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: ReportId,
        target: Status,
        notes: Option<String>,
    ) -> Result<StatusHistoryEntry> {
        if !ctx.actor.is_authenticated() {
            return Err(VigilError::Authentication(
                "an authenticated identity is required to change status".to_string(),
            ));
        }
        let report = self.load(id).await?;
        let entry = transition(&report, target, ctx, TransitionPath::Review, notes, self.clock.now())?;

        let mut commit = TransitionCommit::new(id, report.status, entry.clone());
        if target.is_terminal() {
            commit = commit.verified_by(ctx.actor_label());
        }
        self.store.commit_transition(commit).await?;

        if let Some(m) = &self.metrics {
            m.transition(target.as_str());
        }
        info!(
            report_id = %id,
            from = %report.status,
            to = %target,
            actor = %entry.actor,
            "Status updated"
        );
        Ok(entry)
    }

    /// Apply one transition to many reports; each id succeeds or fails alone
    pub async fn bulk_update_status(
        &self,
        ctx: &RequestContext,
        ids: &[ReportId],
        target: Status,
        notes: Option<String>,
    ) -> Result<BulkOutcome> {
        ctx.require_admin()?;
        if ids.is_empty() {
            return Err(VigilError::invalid_field("ids", "at least one id is required"));
        }
        if ids.len() > MAX_BULK_IDS {
            return Err(VigilError::invalid_field(
                "ids",
                format!("at most {} ids per request", MAX_BULK_IDS),
            ));
        }

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let result = match self.update_status(ctx, *id, target, notes.clone()).await {
                Ok(entry) => BulkItemResult {
                    id: *id,
                    ok: true,
                    status: Some(entry.to_status),
                    error: None,
                    code: None,
                },
                Err(e) => BulkItemResult {
                    id: *id,
                    ok: false,
                    status: e.current_status(),
                    error: Some(e.to_string()),
                    code: Some(e.code().to_string()),
                },
            };
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.ok).count();
        let outcome = BulkOutcome {
            requested: ids.len(),
            succeeded,
            failed: ids.len() - succeeded,
            results,
        };
        info!(
            target_status = %target,
            requested = outcome.requested,
            succeeded = outcome.succeeded,
            "Bulk status update"
        );
        Ok(outcome)
    }

    /// Evidence resubmission: append files, re-score and return the report
    /// to `analyzing` in one commit
    pub async fn attach_evidence(
        &self,
        ctx: &RequestContext,
        id: ReportId,
        files: Vec<EvidenceFile>,
    ) -> Result<Report> {
        if !ctx.actor.is_authenticated() {
            return Err(VigilError::Authentication(
                "an authenticated identity is required to resubmit evidence".to_string(),
            ));
        }
        if files.is_empty() {
            return Err(VigilError::invalid_field("evidence", "at least one file is required"));
        }
        let report = self.load(id).await?;
        if report.status != Status::NeedsEvidence {
            return Err(VigilError::conflict(
                format!("evidence can only be resubmitted while {}", Status::NeedsEvidence),
                report.status,
            ));
        }
        let entry = transition(
            &report,
            Status::Analyzing,
            ctx,
            TransitionPath::Resubmission,
            Some(format!("{} evidence file(s) resubmitted", files.len())),
            self.clock.now(),
        )?;
        validate_evidence(&files, report.evidence.len(), &self.config.submission)?;

        let mut snapshot = report.clone();
        snapshot.evidence.extend(files.iter().cloned());
        let (card, _) = self.score_report(&snapshot).await?;

        let commit = TransitionCommit::new(id, report.status, entry).with_evidence(files, card);
        let updated = self.store.commit_transition(commit).await?;

        if let Some(m) = &self.metrics {
            m.transition(Status::Analyzing.as_str());
        }
        info!(
            report_id = %id,
            evidence = updated.evidence.len(),
            total = updated.total_score,
            "Evidence resubmitted"
        );
        Ok(updated)
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// A single report, visible to admins and to its own reporter
    pub async fn get_report(&self, ctx: &RequestContext, id: ReportId) -> Result<Report> {
        if !ctx.actor.is_authenticated() {
            return Err(VigilError::Authentication(
                "an authenticated identity is required".to_string(),
            ));
        }
        let report = self.load(id).await?;
        let owner = report.reporter_id().is_some() && report.reporter_id() == ctx.reporter_id.as_deref();
        if ctx.actor.is_admin() || owner {
            Ok(report)
        } else {
            Err(VigilError::Authorization(
                "reports are visible to admins and their own reporter".to_string(),
            ))
        }
    }

    /// Filtered, paginated listing, newest submission first (admin only)
    pub async fn query(
        &self,
        ctx: &RequestContext,
        filter: &ReportFilter,
        pagination: Pagination,
    ) -> Result<Page<Report>> {
        ctx.require_admin()?;
        filter.validate()?;
        pagination.validate()?;
        let (data, total) = self.store.query(filter, pagination).await?;
        Ok(Page::new(data, pagination, total))
    }

    /// Audit trail of a report (admin only)
    pub async fn history(&self, ctx: &RequestContext, id: ReportId) -> Result<AuditTrail> {
        ctx.require_admin()?;
        self.load(id).await?;
        let entries = self.store.history(id).await?;
        Ok(AuditTrail::new(id, entries))
    }

    /// Dashboard counts (admin only)
    pub async fn stats(&self, ctx: &RequestContext) -> Result<ReportStats> {
        ctx.require_admin()?;
        Ok(self.store.stats().await?)
    }

    pub fn thresholds(&self) -> ThresholdTable {
        let t = self.config.thresholds;
        let levels = [CredibilityLevel::Low, CredibilityLevel::Medium, CredibilityLevel::High]
            .into_iter()
            .map(|level| {
                let (min, max) = t.range(level);
                LevelRange { level, min, max }
            })
            .collect();
        let factors = self
            .scorer
            .maxima()
            .into_iter()
            .map(|(factor, max)| FactorMax { factor, max })
            .collect();
        ThresholdTable {
            thresholds: t,
            max_total: self.scorer.max_total(),
            levels,
            factors,
        }
    }

    async fn load(&self, id: ReportId) -> Result<Report> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| VigilError::NotFound(format!("report {}", id)))
    }
}
