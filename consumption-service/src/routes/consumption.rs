//! Consumption record endpoints: create, paginated list, analytics.

use std::collections::{BTreeMap, HashMap};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use consumption_core::analytics::{compute_analytics, AnalyticsSummary};
use consumption_core::db::consumption_queries;
use consumption_core::domain::{ConsumptionKind, ConsumptionRecord};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

const MAX_NOTES_LEN: usize = 500;
const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;
// Upper bound on `page` keeping `(page - 1) * per_page` inside i64 range.
const MAX_PAGE: i64 = i64::MAX / MAX_PER_PAGE;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "consumption" }))
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validated creation data.
#[derive(Debug)]
struct NewRecord {
    ts: OffsetDateTime,
    amount: f64,
    kind: ConsumptionKind,
    notes: Option<String>,
}

/// Rules:
/// - value strictly positive (and finite)
/// - type one of the closed enumeration, case-insensitive
/// - date not in the future relative to `now`
/// - notes at most 500 characters
fn validate_new_record(req: &CreateRequest, now: OffsetDateTime) -> Result<NewRecord, BTreeMap<String, String>> {
    let mut errors = BTreeMap::new();

    if !(req.value.is_finite() && req.value > 0.0) {
        errors.insert("value".to_string(), "Value must be greater than 0".to_string());
    }

    let kind = match req.kind.parse::<ConsumptionKind>() {
        Ok(kind) => Some(kind),
        Err(_) => {
            errors.insert(
                "type".to_string(),
                "Type must be one of: electricity, water, gas".to_string(),
            );
            None
        }
    };

    if req.date > now {
        errors.insert(
            "date".to_string(),
            "Consumption date cannot be in the future".to_string(),
        );
    }

    if let Some(notes) = &req.notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            errors.insert(
                "notes".to_string(),
                "Notes must be at most 500 characters".to_string(),
            );
        }
    }

    match (kind, errors.is_empty()) {
        (Some(kind), true) => Ok(NewRecord {
            ts: req.date,
            amount: req.value,
            kind,
            notes: req.notes.clone(),
        }),
        _ => Err(errors),
    }
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub consumption: ConsumptionRecord,
    pub message: String,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateResponse>), ApiError> {
    let Json(request) = payload?;
    let new_record =
        validate_new_record(&request, state.clock.now()).map_err(ApiError::Validation)?;

    let record = consumption_queries::insert_record(
        &state.pool,
        user.id,
        new_record.ts,
        new_record.amount,
        new_record.kind,
        new_record.notes.as_deref(),
    )
    .await
    .map_err(|e| ApiError::Internal(e.into()))?;

    metrics::counter!("consumption_records_created_total").increment(1);
    tracing::info!(user_id = user.id, record_id = record.id, kind = record.kind.as_str(), "consumption record created");

    Ok((
        StatusCode::CREATED,
        Json(CreateResponse {
            consumption: record,
            message: "Consumption record created successfully".to_string(),
        }),
    ))
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PaginationMeta {
    pub page: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Page defaults to 1 and clamps into 1..=MAX_PAGE so the SQL offset can
/// never overflow; per_page defaults to 20 and resets to the default when
/// outside 1..=100. Non-numeric values were already dropped during query
/// parsing.
fn normalize_pagination(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let per_page = match per_page {
        Some(n) if (1..=MAX_PER_PAGE).contains(&n) => n,
        _ => DEFAULT_PER_PAGE,
    };
    (page, per_page)
}

fn paginate(page: i64, per_page: i64, total_items: i64) -> PaginationMeta {
    let total_pages = (total_items + per_page - 1) / per_page;
    PaginationMeta {
        page,
        per_page,
        total_items,
        total_pages,
        has_prev: page > 1,
        has_next: page < total_pages,
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub consumptions: Vec<ConsumptionRecord>,
    pub pagination: PaginationMeta,
    pub message: String,
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse>, ApiError> {
    // Lenient query parsing: malformed numbers fall back to the defaults
    // rather than rejecting the request.
    let page = params.get("page").and_then(|v| v.parse().ok());
    let per_page = params.get("per_page").and_then(|v| v.parse().ok());
    let (page, per_page) = normalize_pagination(page, per_page);

    let total_items = consumption_queries::count_for_owner(&state.pool, user.id)
        .await
        .map_err(ApiError::Internal)?;
    let consumptions =
        consumption_queries::fetch_page_for_owner(&state.pool, user.id, per_page, (page - 1) * per_page)
            .await
            .map_err(ApiError::Internal)?;

    let message = if consumptions.is_empty() {
        "No consumption records found"
    } else {
        "Consumption records retrieved successfully"
    };

    Ok(Json(ListResponse {
        consumptions,
        pagination: paginate(page, per_page, total_items),
        message: message.to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub analytics: AnalyticsSummary,
    pub message: String,
}

pub async fn analytics(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    metrics::counter!("analytics_requests_total").increment(1);

    let records = consumption_queries::fetch_records_for_owner(&state.pool, user.id)
        .await
        .map_err(ApiError::Internal)?;
    let summary = compute_analytics(&records, state.clock.now());

    Ok(Json(AnalyticsResponse {
        analytics: summary,
        message: "Analytics data retrieved successfully".to_string(),
    }))
}

pub async fn dashboard(AuthUser(user): AuthUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the dashboard",
        "user": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn create_request(value: f64, kind: &str, date: OffsetDateTime) -> CreateRequest {
        CreateRequest {
            date,
            value,
            kind: kind.to_string(),
            notes: None,
        }
    }

    #[test]
    fn valid_record_passes_and_parses_kind() {
        let now = datetime!(2023-10-31 00:00:00 UTC);
        let req = create_request(150.75, "Electricity", datetime!(2023-10-15 10:00:00 UTC));
        let record = validate_new_record(&req, now).unwrap();

        assert_eq!(record.kind, ConsumptionKind::Electricity);
        assert_eq!(record.amount, 150.75);
    }

    #[test]
    fn non_positive_value_is_rejected() {
        let now = datetime!(2023-10-31 00:00:00 UTC);
        for value in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let req = create_request(value, "water", datetime!(2023-10-15 00:00:00 UTC));
            let errors = validate_new_record(&req, now).unwrap_err();
            assert!(errors.contains_key("value"), "accepted {value}");
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let now = datetime!(2023-10-31 00:00:00 UTC);
        let req = create_request(10.0, "oil", datetime!(2023-10-15 00:00:00 UTC));
        let errors = validate_new_record(&req, now).unwrap_err();
        assert!(errors.contains_key("type"));
    }

    #[test]
    fn future_date_is_rejected_but_now_is_allowed() {
        let now = datetime!(2023-10-31 00:00:00 UTC);

        let future = create_request(10.0, "gas", datetime!(2023-11-01 00:00:00 UTC));
        assert!(validate_new_record(&future, now).unwrap_err().contains_key("date"));

        let at_now = create_request(10.0, "gas", now);
        assert!(validate_new_record(&at_now, now).is_ok());
    }

    #[test]
    fn oversized_notes_are_rejected() {
        let now = datetime!(2023-10-31 00:00:00 UTC);
        let mut req = create_request(10.0, "gas", datetime!(2023-10-15 00:00:00 UTC));
        req.notes = Some("x".repeat(MAX_NOTES_LEN + 1));
        assert!(validate_new_record(&req, now).unwrap_err().contains_key("notes"));

        req.notes = Some("x".repeat(MAX_NOTES_LEN));
        assert!(validate_new_record(&req, now).is_ok());
    }

    #[test]
    fn pagination_defaults_and_clamping() {
        assert_eq!(normalize_pagination(None, None), (1, 20));
        assert_eq!(normalize_pagination(Some(0), Some(0)), (1, 20));
        assert_eq!(normalize_pagination(Some(-5), Some(101)), (1, 20));
        assert_eq!(normalize_pagination(Some(3), Some(100)), (3, 100));
    }

    #[test]
    fn extreme_page_keeps_the_offset_in_range() {
        let (page, per_page) = normalize_pagination(Some(i64::MAX), Some(MAX_PER_PAGE));
        let offset = (page - 1) * per_page;
        assert!(offset >= 0);

        let (page, per_page) = normalize_pagination(Some(i64::MAX), None);
        assert!((page - 1).checked_mul(per_page).is_some());
    }

    #[test]
    fn pagination_metadata_math() {
        let meta = paginate(2, 20, 45);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_prev);
        assert!(meta.has_next);

        let last = paginate(3, 20, 45);
        assert!(!last.has_next);

        let empty = paginate(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_prev);
        assert!(!empty.has_next);
    }
}
