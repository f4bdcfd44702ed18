//! Query filters, pagination and aggregate statistics
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use vigil_core::{Category, CredibilityLevel, Report, ReportId, Result, Status, VigilError};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Administrator report filter; every populated field must match
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub level: Option<CredibilityLevel>,
    pub province_id: Option<String>,
    pub city_id: Option<String>,
    pub district_id: Option<String>,
    /// Incident date range, inclusive
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ReportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn level(mut self, level: CredibilityLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn city(mut self, city_id: impl Into<String>) -> Self {
        self.city_id = Some(city_id.into());
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(VigilError::invalid_field("from", "`from` must not be after `to`"));
            }
        }
        Ok(())
    }

    pub fn matches(&self, report: &Report) -> bool {
        let loc = &report.location;
        self.category.map_or(true, |c| report.category == c)
            && self.status.map_or(true, |s| report.status == s)
            && self.level.map_or(true, |l| report.credibility_level == l)
            && self.province_id.as_ref().map_or(true, |p| &loc.province_id == p)
            && self.city_id.as_ref().map_or(true, |c| &loc.city_id == c)
            && self
                .district_id
                .as_ref()
                .map_or(true, |d| loc.district_id.as_ref() == Some(d))
            && self.from.map_or(true, |from| report.incident_at >= from)
            && self.to.map_or(true, |to| report.incident_at <= to)
    }
}

/// One-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(VigilError::invalid_field("page", "page starts at 1"));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(VigilError::invalid_field(
                "limit",
                format!("limit must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}

/// Paginated result envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total: u64) -> Self {
        let limit = pagination.limit.max(1) as u64;
        Self {
            data,
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Search bounds for the duplicate/corroboration detector
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    /// The report being scored; never returned
    pub exclude: ReportId,
    pub category: Category,
    pub city_id: String,
    /// When set, candidates must share the district; otherwise the city
    pub district_id: Option<String>,
    pub incident_from: DateTime<Utc>,
    pub incident_to: DateTime<Utc>,
    pub limit: usize,
}

impl CandidateQuery {
    pub fn matches(&self, report: &Report) -> bool {
        if report.id == self.exclude || report.category != self.category {
            return false;
        }
        if report.duplicate_of().is_some() {
            return false;
        }
        let same_place = match &self.district_id {
            Some(district) => report.location.district_id.as_ref() == Some(district),
            None => report.location.city_id == self.city_id,
        };
        same_place
            && report.incident_at >= self.incident_from
            && report.incident_at <= self.incident_to
    }
}

/// Aggregate counts for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total: u64,
    pub by_status: BTreeMap<Status, u64>,
    pub by_level: BTreeMap<CredibilityLevel, u64>,
    pub by_category: BTreeMap<Category, u64>,
    pub duplicates: u64,
    pub provisional: u64,
}

impl ReportStats {
    pub fn record(&mut self, report: &Report) {
        self.total += 1;
        *self.by_status.entry(report.status).or_default() += 1;
        *self.by_level.entry(report.credibility_level).or_default() += 1;
        *self.by_category.entry(report.category).or_default() += 1;
        if report.duplicate_of().is_some() {
            self.duplicates += 1;
        }
        if report.score.provisional {
            self.provisional += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_bounds() {
        assert!(Pagination::new(1, 20).validate().is_ok());
        assert!(Pagination::new(0, 20).validate().is_err());
        assert!(Pagination::new(1, 0).validate().is_err());
        assert!(Pagination::new(1, 101).validate().is_err());
        assert_eq!(Pagination::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_page_total_pages() {
        let page: Page<u8> = Page::new(vec![], Pagination::new(1, 10), 21);
        assert_eq!(page.total_pages, 3);
        let page: Page<u8> = Page::new(vec![], Pagination::new(1, 10), 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_filter_date_order() {
        let now = Utc::now();
        let filter = ReportFilter::new().between(now, now - chrono::Duration::days(1));
        assert!(filter.validate().is_err());
    }
}
