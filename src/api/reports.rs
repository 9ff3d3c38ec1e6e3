//! Daily report endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    services::reports::{DailyReport, ReportDelivery},
    AppState,
};

use super::Authorized;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Day to report on (defaults to today, UTC)
    pub date: Option<NaiveDate>,
}

/// Send report request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SendReportRequest {
    /// Day to report on (defaults to today, UTC)
    pub date: Option<NaiveDate>,
    /// Overrides the configured recipients
    pub recipients: Option<Vec<String>>,
}

/// Build the daily report without sending it
#[utoipa::path(
    get,
    path = "/reports/daily",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportQuery),
    responses(
        (status = 200, description = "Report figures", body = DailyReport)
    )
)]
pub async fn preview_daily(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<DailyReport>> {
    principal.require_admin()?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let report = state.services.reports.build(date).await?;
    Ok(Json(report))
}

/// Email the daily report now
#[utoipa::path(
    post,
    path = "/reports/daily/send",
    tag = "reports",
    security(("bearer_auth" = [])),
    request_body = SendReportRequest,
    responses(
        (status = 200, description = "Report sent", body = ReportDelivery),
        (status = 400, description = "No recipients"),
        (status = 502, description = "SMTP delivery failed")
    )
)]
pub async fn send_daily(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Json(request): Json<SendReportRequest>,
) -> AppResult<Json<ReportDelivery>> {
    principal.require_admin()?;
    let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
    let delivery = state
        .services
        .reports
        .send_daily(date, request.recipients)
        .await?;
    Ok(Json(delivery))
}
