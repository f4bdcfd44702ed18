//! Location & time factor
//!
//! Rewards a specific, internally consistent location and a plausible
//! incident time relative to the snapshot's submission time.

use chrono::Duration;
use vigil_core::{Factor, FactorScore};

use crate::factor::{FactorEvaluator, ScoringInput};

pub const LOCATION_TIME_MAX: u32 = 3;

const MIN_SPECIFIC_CHARS: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocationTimeFactor;

impl FactorEvaluator for LocationTimeFactor {
    fn factor(&self) -> Factor {
        Factor::LocationTime
    }

    fn max(&self) -> u32 {
        LOCATION_TIME_MAX
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> FactorScore {
        let report = input.report;
        let location = &report.location;
        let mut value = 0;
        let mut notes = Vec::new();

        let consistent = input.directory.validate(location).is_ok();
        if consistent {
            if location.district_id.is_some() {
                value += 1;
                notes.push("district resolved");
            }
            let specific = location
                .specific_location
                .as_deref()
                .map(|s| s.trim().chars().count() >= MIN_SPECIFIC_CHARS)
                .unwrap_or(false);
            if specific {
                value += 1;
                notes.push("specific place given");
            }
        } else {
            notes.push("location hierarchy inconsistent");
        }

        let age = report.submitted_at - report.incident_at;
        if age < Duration::zero() {
            notes.push("incident after submission");
        } else if age > Duration::days(input.config.max_incident_age_days) {
            notes.push("incident implausibly old");
        } else {
            value += 1;
            notes.push("incident time plausible");
        }

        self.score(value, notes.join(", "))
    }
}
