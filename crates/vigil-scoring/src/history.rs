//! Reporter history factor
use vigil_core::{Factor, FactorScore};

use crate::factor::{FactorEvaluator, ScoringInput};

pub const HISTORY_MAX: u32 = 2;

/// Verified ratio at or above which a reporter earns full history credit
pub const TRUSTED_RATIO: f64 = 0.7;
/// Verified ratio at or above which a reporter stays neutral
pub const NEUTRAL_RATIO: f64 = 0.4;

/// Anonymous and new reporters get a neutral score, never zero
#[derive(Debug, Clone, Copy, Default)]
pub struct ReporterHistoryFactor;

impl FactorEvaluator for ReporterHistoryFactor {
    fn factor(&self) -> Factor {
        Factor::ReporterHistory
    }

    fn max(&self) -> u32 {
        HISTORY_MAX
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> FactorScore {
        let Some(profile) = input.profile else {
            return self.score(1, "No reporter history (neutral)");
        };
        if profile.resolved() < input.config.history_min_resolved {
            return self.score(
                1,
                format!("{} resolved report(s), too few to judge", profile.resolved()),
            );
        }
        let ratio = profile.verified_ratio().unwrap_or(0.0);
        let value = if ratio >= TRUSTED_RATIO {
            2
        } else if ratio >= NEUTRAL_RATIO {
            1
        } else {
            0
        };
        self.score(
            value,
            format!(
                "{} of {} resolved reports verified",
                profile.verified,
                profile.resolved()
            ),
        )
    }
}
