//! Credibility Aggregator
//!
//! Sums factor scores into a total and classifies it against the configured
//! thresholds. Out-of-range input is a contract violation and is reported,
//! never clamped.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use vigil_core::{CredibilityLevel, CredibilityThresholds, FactorScore, Result, VigilError};

/// Total and level for a set of factor scores
pub fn aggregate(
    factors: &[FactorScore],
    thresholds: &CredibilityThresholds,
) -> Result<(u32, CredibilityLevel)> {
    let mut seen = HashSet::new();
    let mut total: u32 = 0;

    for score in factors {
        let field = score.factor.as_str();
        if !seen.insert(score.factor) {
            return Err(VigilError::invalid_field(field, "factor scored more than once"));
        }
        if score.max == 0 {
            return Err(VigilError::invalid_field(field, "factor maximum must be positive"));
        }
        if score.value > score.max {
            return Err(VigilError::invalid_field(
                field,
                format!("score {} exceeds maximum {}", score.value, score.max),
            ));
        }
        total += score.value;
    }

    Ok((total, thresholds.classify(total)))
}

/// Human-facing summary of an aggregated score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredibilityAssessment {
    pub total: u32,
    pub max_total: u32,
    pub level: CredibilityLevel,
    pub explanation: String,
    pub recommendations: Vec<String>,
}

impl CredibilityAssessment {
    pub fn new(factors: &[FactorScore], thresholds: &CredibilityThresholds) -> Result<Self> {
        let (total, level) = aggregate(factors, thresholds)?;
        Ok(Self::describe(factors, total, level))
    }

    /// Assessment at a level decided after aggregation, e.g. a capped card
    pub fn with_level(
        factors: &[FactorScore],
        thresholds: &CredibilityThresholds,
        level: CredibilityLevel,
    ) -> Result<Self> {
        let (total, _) = aggregate(factors, thresholds)?;
        Ok(Self::describe(factors, total, level))
    }

    fn describe(factors: &[FactorScore], total: u32, level: CredibilityLevel) -> Self {
        Self {
            total,
            max_total: factors.iter().map(|f| f.max).sum(),
            level,
            explanation: Self::generate_explanation(factors, level),
            recommendations: Self::generate_recommendations(factors, level),
        }
    }

    fn generate_explanation(factors: &[FactorScore], level: CredibilityLevel) -> String {
        let level_desc = match level {
            CredibilityLevel::High => "High credibility - prioritize for field verification",
            CredibilityLevel::Medium => "Medium credibility - review against other reports",
            CredibilityLevel::Low => "Low credibility - request more information before acting",
        };

        let mut strongest: Vec<&FactorScore> = factors.iter().filter(|f| f.value > 0).collect();
        strongest.sort_by(|a, b| (b.value * a.max).cmp(&(a.value * b.max)));
        let names: Vec<&str> = strongest.iter().take(3).map(|f| f.factor.as_str()).collect();

        if names.is_empty() {
            level_desc.to_string()
        } else {
            format!("{}. Strongest signals: {}", level_desc, names.join(", "))
        }
    }

    fn generate_recommendations(factors: &[FactorScore], level: CredibilityLevel) -> Vec<String> {
        use vigil_core::Factor;

        let mut recs = Vec::new();
        for score in factors.iter().filter(|f| f.value == 0) {
            let rec = match score.factor {
                Factor::Evidence => "Ask the reporter for photos or documents",
                Factor::LocationTime => "Confirm the exact place and time of the incident",
                Factor::Narrative => "Ask for a more detailed account",
                Factor::Relation => "Clarify the reporter's relation to the program",
                Factor::Similarity | Factor::ReporterHistory => continue,
            };
            recs.push(rec.to_string());
        }
        if level == CredibilityLevel::High {
            recs.push("Escalate to the district supervisor".to_string());
        }
        recs
    }
}
