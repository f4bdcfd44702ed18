//! Verification State Machine
//!
//! ```text
//! pending ──▶ analyzing ──▶ in_progress ──▶ resolved
//!                │  ▲
//!                │  └── needs_evidence
//!                ├────▶ needs_evidence
//!                └────▶ invalid
//! ```
//!
//! `invalid` and `resolved` are terminal. This module only decides whether a
//! move is legal and builds its history entry; committing it is the store's
//! compare-and-set.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use vigil_core::{Report, RequestContext, Result, Status, StatusHistoryEntry, VigilError};

/// Legal targets from `from`
pub fn allowed_targets(from: Status) -> &'static [Status] {
    match from {
        Status::Pending => &[Status::Analyzing],
        Status::Analyzing => &[Status::NeedsEvidence, Status::Invalid, Status::InProgress],
        Status::NeedsEvidence => &[Status::Analyzing],
        Status::InProgress => &[Status::Resolved],
        Status::Invalid | Status::Resolved => &[],
    }
}

pub fn can_transition(from: Status, to: Status) -> bool {
    allowed_targets(from).contains(&to)
}

/// How a transition was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPath {
    /// Explicit status update by an administrator
    Review,
    /// Implicit `needs_evidence → analyzing` when files are attached
    Resubmission,
}

/// Check identity and role for a move out of `report.status`
pub fn authorize(report: &Report, to: Status, ctx: &RequestContext, path: TransitionPath) -> Result<()> {
    if !ctx.actor.is_authenticated() {
        return Err(VigilError::Authentication(
            "an authenticated identity is required to change status".to_string(),
        ));
    }
    if ctx.actor.is_admin() {
        return Ok(());
    }

    let own_report = match (report.reporter_id(), ctx.reporter_id.as_deref()) {
        (Some(owner), Some(caller)) => owner == caller,
        _ => false,
    };
    let resubmission = path == TransitionPath::Resubmission
        && report.status == Status::NeedsEvidence
        && to == Status::Analyzing;

    if resubmission && own_report {
        Ok(())
    } else if resubmission {
        Err(VigilError::Authorization(
            "only the original reporter or an admin can resubmit evidence".to_string(),
        ))
    } else {
        Err(VigilError::Authorization(format!(
            "admin role required to move a report from {} to {}",
            report.status, to
        )))
    }
}

/// Validate a move and build the history entry that records it.
///
/// The caller commits the entry conditional on the report still being in
/// `report.status`.
pub fn transition(
    report: &Report,
    to: Status,
    ctx: &RequestContext,
    path: TransitionPath,
    notes: Option<String>,
    at: DateTime<Utc>,
) -> Result<StatusHistoryEntry> {
    authorize(report, to, ctx, path)?;

    if !can_transition(report.status, to) {
        let message = if report.status.is_terminal() {
            format!("report is {} and admits no further transitions", report.status)
        } else {
            format!("cannot move a report from {} to {}", report.status, to)
        };
        return Err(VigilError::conflict(message, report.status));
    }

    Ok(StatusHistoryEntry {
        id: Uuid::new_v4(),
        report_id: report.id,
        from_status: Some(report.status),
        to_status: to,
        notes: notes.filter(|n| !n.trim().is_empty()),
        actor: ctx.actor_label(),
        at,
    })
}
