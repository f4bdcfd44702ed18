//! Audit trail of a single report
//!
//! A report's history is append-only and replays to its current status:
//! the first entry moves from nothing to `pending`, and every later entry
//! starts where the previous one ended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use vigil_core::{ReportId, Result, Status, StatusHistoryEntry, VigilError};

use crate::state_machine::can_transition;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrail {
    pub report_id: ReportId,
    pub entries: Vec<StatusHistoryEntry>,
}

impl AuditTrail {
    pub fn new(report_id: ReportId, entries: Vec<StatusHistoryEntry>) -> Self {
        Self { report_id, entries }
    }

    /// Status the trail replays to
    pub fn current_status(&self) -> Option<Status> {
        self.entries.last().map(|e| e.to_status)
    }

    /// Check that the trail is a legal walk of the state machine
    pub fn verify(&self) -> Result<()> {
        let mut current: Option<Status> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.report_id != self.report_id {
                return Err(VigilError::validation(format!(
                    "entry {} belongs to report {}",
                    i, entry.report_id
                )));
            }
            let legal = match (current, entry.from_status) {
                (None, None) => entry.to_status == Status::Pending,
                (Some(prev), Some(from)) => prev == from && can_transition(from, entry.to_status),
                _ => false,
            };
            if !legal {
                return Err(VigilError::validation(format!(
                    "entry {} ({:?} -> {}) does not follow {:?}",
                    i, entry.from_status, entry.to_status, current
                )));
            }
            current = Some(entry.to_status);
        }
        Ok(())
    }

    /// Entries recorded by one actor
    pub fn entries_by(&self, actor: &str) -> Vec<&StatusHistoryEntry> {
        self.entries.iter().filter(|e| e.actor == actor).collect()
    }

    /// Export to JSON Lines
    pub fn to_jsonl(&self) -> String {
        self.entries
            .iter()
            .filter_map(|e| serde_json::to_string(e).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self) -> TrailSummary {
        let submitted_at = self.entries.first().map(|e| e.at);
        let verdict_at = self
            .entries
            .iter()
            .find(|e| e.to_status.is_terminal())
            .map(|e| e.at);
        TrailSummary {
            transitions: self.entries.len().saturating_sub(1),
            actors: self.entries.iter().map(|e| e.actor.clone()).collect(),
            evidence_requests: self
                .entries
                .iter()
                .filter(|e| e.to_status == Status::NeedsEvidence)
                .count(),
            submitted_at,
            verdict_at,
            hours_to_verdict: match (submitted_at, verdict_at) {
                (Some(s), Some(v)) => Some((v - s).num_minutes() as f64 / 60.0),
                _ => None,
            },
        }
    }
}

/// Statistics about one report's trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailSummary {
    /// Status changes after submission
    pub transitions: usize,
    pub actors: BTreeSet<String>,
    pub evidence_requests: usize,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verdict_at: Option<DateTime<Utc>>,
    pub hours_to_verdict: Option<f64>,
}
