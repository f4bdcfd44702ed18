//! Engine configuration
//!
//! Thresholds and tunables for scoring, duplicate detection and flood
//! control. Every section has built-in defaults and can be overridden from
//! YAML; a loaded configuration is validated before use.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data_model::CredibilityLevel;
use crate::error::{Result, VigilError};

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: CredibilityThresholds,
    pub submission: SubmissionConfig,
    pub scoring: ScoringConfig,
    pub detector: DetectorConfig,
    pub rate_limit: RateLimitConfig,
}

impl EngineConfig {
    /// Load configuration from YAML; missing sections keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)
            .map_err(|e| VigilError::validation(format!("invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            VigilError::validation(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        let d = &self.detector;
        if !(0.0..=1.0).contains(&d.corroboration_threshold)
            || !(0.0..=1.0).contains(&d.duplicate_threshold)
        {
            return Err(VigilError::validation(
                "detector thresholds must lie within [0, 1]",
            ));
        }
        if d.corroboration_threshold > d.duplicate_threshold {
            return Err(VigilError::validation(
                "corroboration_threshold must not exceed duplicate_threshold",
            ));
        }
        if d.window_days < 0 {
            return Err(VigilError::validation("window_days must be non-negative"));
        }
        if self.submission.min_narrative_chars == 0 {
            return Err(VigilError::validation("min_narrative_chars must be positive"));
        }
        if self.rate_limit.window_minutes <= 0 {
            return Err(VigilError::validation("rate_limit.window_minutes must be positive"));
        }
        Ok(())
    }
}

/// Inclusive cut points mapping total score to a credibility level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredibilityThresholds {
    /// Lowest total classified as high
    pub high_min: u32,
    /// Lowest total classified as medium
    pub medium_min: u32,
}

impl Default for CredibilityThresholds {
    fn default() -> Self {
        Self {
            high_min: 12,
            medium_min: 7,
        }
    }
}

impl CredibilityThresholds {
    pub fn validate(&self) -> Result<()> {
        if self.medium_min == 0 || self.high_min <= self.medium_min {
            return Err(VigilError::validation(format!(
                "thresholds must satisfy high_min > medium_min > 0 (got {} / {})",
                self.high_min, self.medium_min
            )));
        }
        Ok(())
    }

    pub fn classify(&self, total: u32) -> CredibilityLevel {
        if total >= self.high_min {
            CredibilityLevel::High
        } else if total >= self.medium_min {
            CredibilityLevel::Medium
        } else {
            CredibilityLevel::Low
        }
    }

    /// Inclusive score range for a level; `None` upper bound means unbounded
    pub fn range(&self, level: CredibilityLevel) -> (u32, Option<u32>) {
        match level {
            CredibilityLevel::Low => (0, Some(self.medium_min - 1)),
            CredibilityLevel::Medium => (self.medium_min, Some(self.high_min - 1)),
            CredibilityLevel::High => (self.high_min, None),
        }
    }
}

/// Submission gate applied before any scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub min_narrative_chars: usize,
    pub max_title_chars: usize,
    pub max_evidence_files: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            min_narrative_chars: 50,
            max_title_chars: 200,
            max_evidence_files: 10,
        }
    }
}

/// Tunables for the factor evaluators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Incidents older than this relative to submission lose the time point
    pub max_incident_age_days: i64,
    /// File count at which the evidence set counts as complete
    pub evidence_complete: u32,
    /// Narrative length below which the narrative factor scores 0
    pub narrative_min_chars: usize,
    /// Narrative length that earns the detail point
    pub narrative_detailed_chars: usize,
    /// Resolved reports needed before history moves off neutral
    pub history_min_resolved: u64,
    /// Similarity value used when the detector is unavailable
    pub degraded_similarity_score: u32,
    /// Highest level a report without usable evidence can reach
    pub zero_evidence_level_cap: CredibilityLevel,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_incident_age_days: 90,
            evidence_complete: 3,
            narrative_min_chars: 50,
            narrative_detailed_chars: 200,
            history_min_resolved: 2,
            degraded_similarity_score: 0,
            zero_evidence_level_cap: CredibilityLevel::Low,
        }
    }
}

/// Duplicate/corroboration search bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Half-width of the incident time window, in days
    pub window_days: i64,
    pub duplicate_threshold: f64,
    pub corroboration_threshold: f64,
    pub search_timeout_ms: u64,
    pub max_candidates: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_days: 3,
            duplicate_threshold: 0.85,
            corroboration_threshold: 0.30,
            search_timeout_ms: 500,
            max_candidates: 200,
        }
    }
}

/// Per-submitter flood control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_submissions: usize,
    pub window_minutes: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_submissions: 5,
            window_minutes: 60,
        }
    }
}
