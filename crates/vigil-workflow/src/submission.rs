//! Submission gate: draft validation and flood-control identity
use chrono::{DateTime, Utc};

use vigil_core::{
    EvidenceFile, LocationDirectory, ReportDraft, RequestContext, Result, SubmissionConfig,
    VigilError,
};

/// Reject malformed drafts before any scoring work is done
pub fn validate_draft(
    draft: &ReportDraft,
    config: &SubmissionConfig,
    directory: &dyn LocationDirectory,
    now: DateTime<Utc>,
) -> Result<()> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(VigilError::invalid_field("title", "title is required"));
    }
    if title.chars().count() > config.max_title_chars {
        return Err(VigilError::invalid_field(
            "title",
            format!("title exceeds {} characters", config.max_title_chars),
        ));
    }

    let narrative_chars = draft.narrative.trim().chars().count();
    if narrative_chars < config.min_narrative_chars {
        return Err(VigilError::invalid_field(
            "narrative",
            format!(
                "narrative must be at least {} characters (got {})",
                config.min_narrative_chars, narrative_chars
            ),
        ));
    }

    directory.validate(&draft.location)?;

    if draft.incident_at > now {
        return Err(VigilError::invalid_field(
            "incidentAt",
            "incident time cannot be in the future",
        ));
    }

    validate_evidence(&draft.evidence, 0, config)
}

/// Check files about to be added to a report already holding `existing`
pub fn validate_evidence(
    files: &[EvidenceFile],
    existing: usize,
    config: &SubmissionConfig,
) -> Result<()> {
    if let Some(i) = files.iter().position(|f| f.reference.trim().is_empty()) {
        return Err(VigilError::invalid_field(
            format!("evidence[{}].reference", i),
            "evidence reference is required",
        ));
    }
    if existing + files.len() > config.max_evidence_files {
        return Err(VigilError::invalid_field(
            "evidence",
            format!("at most {} evidence files per report", config.max_evidence_files),
        ));
    }
    Ok(())
}

/// Stable, non-reversible key of whoever is submitting
pub fn source_key(ctx: &RequestContext) -> String {
    let raw = match (&ctx.reporter_id, &ctx.client_key) {
        (Some(id), _) => format!("reporter:{}", id),
        (None, Some(key)) => format!("client:{}", key),
        (None, None) => "anonymous".to_string(),
    };
    blake3::hash(raw.as_bytes()).to_hex().to_string()
}
