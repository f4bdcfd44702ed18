//! API Handlers
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use vigil_core::{
    Category, CredibilityLevel, EvidenceFile, ReportDraft, Status, VigilError, VIGIL_VERSION,
};
use vigil_store::{Pagination, ReportFilter, DEFAULT_PAGE_LIMIT};

use crate::error::{ApiError, ApiResult};
use crate::middleware::Identity;
use crate::AppState;

fn data(value: impl serde::Serialize) -> Json<Value> {
    Json(json!({ "data": value }))
}

fn report_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    let Path(id) = path?;
    Ok(id)
}

// ============================================================================
// SUBMISSION
// ============================================================================

pub async fn submit(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    payload: Result<Json<ReportDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(draft) = payload?;
    let report = state.service.submit(&ctx, draft).await?;
    Ok((StatusCode::CREATED, data(report)))
}

#[derive(Debug, Deserialize)]
pub struct EvidenceRequest {
    pub evidence: Vec<EvidenceFile>,
}

pub async fn attach_evidence(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<EvidenceRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = report_id(path)?;
    let Json(body) = payload?;
    let report = state.service.attach_evidence(&ctx, id, body.evidence).await?;
    Ok(data(report))
}

// ============================================================================
// READS
// ============================================================================

/// Query string of `GET /v1/reports`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub level: Option<CredibilityLevel>,
    pub province_id: Option<String>,
    pub city_id: Option<String>,
    pub district_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    pub fn split(self) -> (ReportFilter, Pagination) {
        let filter = ReportFilter {
            category: self.category,
            status: self.status,
            level: self.level,
            province_id: self.province_id,
            city_id: self.city_id,
            district_id: self.district_id,
            from: self.from,
            to: self.to,
        };
        let pagination = Pagination::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        );
        (filter, pagination)
    }
}

pub async fn list_reports(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let (filter, pagination) = params.split();
    let page = state.service.query(&ctx, &filter, pagination).await?;
    Ok(Json(json!(page)))
}

pub async fn get_report(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let id = report_id(path)?;
    Ok(data(state.service.get_report(&ctx, id).await?))
}

pub async fn get_scoring(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let id = report_id(path)?;
    Ok(data(state.service.get_scoring(&ctx, id).await?))
}

pub async fn get_history(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let id = report_id(path)?;
    let trail = state.service.history(&ctx, id).await?;
    let summary = trail.summary();
    Ok(Json(json!({ "data": trail.entries, "summary": summary })))
}

pub async fn stats(State(state): State<AppState>, Identity(ctx): Identity) -> ApiResult<Json<Value>> {
    Ok(data(state.service.stats(&ctx).await?))
}

pub async fn thresholds(State(state): State<AppState>) -> Json<Value> {
    data(state.service.thresholds())
}

// ============================================================================
// TRANSITIONS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Status,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = report_id(path)?;
    let Json(body) = payload?;
    let entry = state
        .service
        .update_status(&ctx, id, body.status, body.notes)
        .await?;
    Ok(data(entry))
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
    pub status: Status,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn bulk_update_status(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    payload: Result<Json<BulkStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    let outcome = state
        .service
        .bulk_update_status(&ctx, &body.ids, body.status, body.notes)
        .await?;
    Ok(data(outcome))
}

// ============================================================================
// OPERATIONS
// ============================================================================

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "version": VIGIL_VERSION })))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => ApiError(VigilError::Storage(format!("metrics encoding failed: {}", e)))
            .into_response(),
    }
}
