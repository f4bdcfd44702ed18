//! Narrative quality factor
//!
//! Length, concrete detail and internal consistency of the written account.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use vigil_core::{Factor, FactorScore};

use crate::factor::{FactorEvaluator, ScoringInput};

pub const NARRATIVE_MAX: u32 = 3;

lazy_static! {
    static ref DIGIT: Regex = Regex::new(r"\d").unwrap();
    static ref TIME_OF_DAY: Regex = Regex::new(
        r"(?i)\b(\d{1,2}[:.]\d{2}|pagi|siang|sore|malam|morning|noon|afternoon|evening|night|breakfast|lunch|dinner)\b"
    )
    .unwrap();
    static ref QUANTITY: Regex = Regex::new(
        r"(?i)\b(\d+\s*(porsi|portions?|students?|siswa|anak|children|orang|people|kg|gram|boxes|kotak)|dozens?|puluhan|ratusan|hundreds?|several|beberapa)\b"
    )
    .unwrap();
    static ref FOOD_TERM: Regex = Regex::new(
        r"(?i)\b(nasi|rice|ayam|chicken|telur|eggs?|sayur|vegetables?|ikan|fish|susu|milk|lauk|tempe|tahu|tofu|meat|daging|fruit|buah|soup|sup|bread|roti)\b"
    )
    .unwrap();
    static ref DATE_DMY: Regex = Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").unwrap();
    static ref DATE_ISO: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NarrativeFactor;

impl NarrativeFactor {
    /// Count of distinct kinds of concrete detail in the text
    pub fn specificity_markers(text: &str) -> usize {
        [&*DIGIT, &*TIME_OF_DAY, &*QUANTITY, &*FOOD_TERM]
            .iter()
            .filter(|re| re.is_match(text))
            .count()
    }

    /// Calendar dates written in the text
    pub fn mentioned_dates(text: &str) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = DATE_ISO
            .captures_iter(text)
            .filter_map(|c| ymd(&c[1], &c[2], &c[3]))
            .collect();
        dates.extend(
            DATE_DMY
                .captures_iter(text)
                .filter_map(|c| ymd(&c[3], &c[2], &c[1])),
        );
        dates
    }
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

impl FactorEvaluator for NarrativeFactor {
    fn factor(&self) -> Factor {
        Factor::Narrative
    }

    fn max(&self) -> u32 {
        NARRATIVE_MAX
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> FactorScore {
        let text = input.report.narrative.trim();
        let length = text.chars().count();
        if length < input.config.narrative_min_chars {
            return self.score(0, format!("Narrative too short ({} chars)", length));
        }

        let mut value: u32 = 1;
        let mut notes = vec![format!("{} chars", length)];

        if length >= input.config.narrative_detailed_chars {
            value += 1;
            notes.push("detailed".to_string());
        }

        let markers = Self::specificity_markers(text);
        if markers >= 2 {
            value += 1;
            notes.push(format!("{} specificity markers", markers));
        }

        let incident_day = input.report.incident_at.date_naive();
        let contradicts = Self::mentioned_dates(text)
            .iter()
            .any(|d| (*d - incident_day).num_days().abs() > 1);
        if contradicts {
            value = value.saturating_sub(1);
            notes.push("date in text contradicts incident date".to_string());
        }

        self.score(value, notes.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{evaluate, report};

    #[test]
    fn test_short_narrative_scores_zero() {
        let mut r = report();
        r.narrative = "Food was bad.".to_string();
        assert_eq!(evaluate(&NarrativeFactor, &r).value, 0);
    }

    #[test]
    fn test_plain_narrative() {
        let mut r = report();
        r.narrative = "The food that was delivered to our school was not good at all today.".to_string();
        assert_eq!(evaluate(&NarrativeFactor, &r).value, 1);
    }

    #[test]
    fn test_specific_detailed_narrative_hits_max() {
        let mut r = report();
        r.narrative = format!(
            "At 11:30 during lunch, 12 students ate the chicken rice and complained of stomach ache. {}",
            "The portions were served cold and the vegetables smelled sour. ".repeat(3)
        );
        assert_eq!(evaluate(&NarrativeFactor, &r).value, NARRATIVE_MAX);
    }

    #[test]
    fn test_contradicting_date_penalized() {
        let mut r = report();
        let day = r.incident_at.date_naive();
        r.narrative = format!(
            "On {} at lunch 12 students ate chicken rice and got sick soon after eating it.",
            day.format("%d/%m/%Y")
        );
        let consistent = evaluate(&NarrativeFactor, &r).value;

        r.narrative = "On 01/01/2020 at lunch 12 students ate chicken rice and got sick soon after eating it."
            .to_string();
        let contradicted = evaluate(&NarrativeFactor, &r).value;
        assert_eq!(contradicted + 1, consistent);
    }

    #[test]
    fn test_mentioned_dates_formats() {
        let dates = NarrativeFactor::mentioned_dates("2026-10-17 and 18-10-2026 and 99/99/2026");
        assert_eq!(dates.len(), 2);
    }
}
