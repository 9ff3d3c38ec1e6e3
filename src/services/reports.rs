//! Daily activity report and its scheduled delivery

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::{
    config::ReportsConfig,
    error::{AppError, AppResult},
    models::{
        loan::LoanQuery, Assignment, AssignmentRequest, AssignmentStatus, EquipmentLoan,
        LoanStatus, RequestStatus,
    },
    repository::{Filter, Repository},
    services::email::EmailService,
};

/// Figures for one day of work
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyReport {
    pub date: NaiveDate,
    /// Assignment count per status
    pub assignments_by_status: BTreeMap<String, usize>,
    /// Finished minutes per operator
    pub operator_minutes: BTreeMap<String, i64>,
    pub loans_delivered: usize,
    pub loans_returned: usize,
    /// Effective minutes of loans returned that day
    pub loan_minutes: i64,
    pub pending_loans: usize,
    pub pending_requests: usize,
}

impl DailyReport {
    pub fn subject(&self) -> String {
        format!("Daily activity report {}", self.date)
    }

    /// Plain-text body for email
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Activity report for {}", self.date);
        let _ = writeln!(out);
        let _ = writeln!(out, "Assignments");
        if self.assignments_by_status.is_empty() {
            let _ = writeln!(out, "  none planned");
        }
        for (status, count) in &self.assignments_by_status {
            let _ = writeln!(out, "  {:<12} {}", status, count);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Worked minutes");
        if self.operator_minutes.is_empty() {
            let _ = writeln!(out, "  none recorded");
        }
        for (operator, minutes) in &self.operator_minutes {
            let _ = writeln!(out, "  {:<12} {}", operator, minutes);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Loans");
        let _ = writeln!(out, "  delivered    {}", self.loans_delivered);
        let _ = writeln!(out, "  returned     {} ({} min)", self.loans_returned, self.loan_minutes);
        let _ = writeln!(out, "  pending      {}", self.pending_loans);
        let _ = writeln!(out);
        let _ = writeln!(out, "Pending requests: {}", self.pending_requests);
        out
    }
}

/// Build the report from the records of the day
pub fn build_daily_report(
    date: NaiveDate,
    assignments: &[Assignment],
    loans: &[EquipmentLoan],
    requests: &[AssignmentRequest],
) -> DailyReport {
    let mut report = DailyReport {
        date,
        assignments_by_status: BTreeMap::new(),
        operator_minutes: BTreeMap::new(),
        loans_delivered: 0,
        loans_returned: 0,
        loan_minutes: 0,
        pending_loans: 0,
        pending_requests: 0,
    };

    for assignment in assignments.iter().filter(|a| a.date == date) {
        *report
            .assignments_by_status
            .entry(assignment.status.to_string())
            .or_default() += 1;
        if assignment.status == AssignmentStatus::Finished {
            *report
                .operator_minutes
                .entry(assignment.operator_id.clone())
                .or_default() += assignment.duration_minutes.unwrap_or(0);
        }
    }

    let on_day = |instant: Option<DateTime<Utc>>| instant.map(|t| t.date_naive()) == Some(date);
    for loan in loans {
        if on_day(loan.delivered_at) {
            report.loans_delivered += 1;
        }
        if on_day(loan.returned_at) {
            report.loans_returned += 1;
            report.loan_minutes += loan.effective_minutes.unwrap_or(0);
        }
        if loan.status == LoanStatus::Pending {
            report.pending_loans += 1;
        }
    }

    report.pending_requests = requests
        .iter()
        .filter(|r| r.status == RequestStatus::Pending)
        .count();
    report
}

/// Next instant strictly after `now` at `at` (UTC)
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Outcome of a report delivery
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportDelivery {
    pub success: bool,
    pub recipients: Vec<String>,
    pub report: DailyReport,
}

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
    email: EmailService,
    config: ReportsConfig,
}

impl ReportsService {
    pub fn new(repository: Repository, email: EmailService, config: ReportsConfig) -> Self {
        Self { repository, email, config }
    }

    /// Collect the records and build the report for `date`
    pub async fn build(&self, date: NaiveDate) -> AppResult<DailyReport> {
        let assignments = self.repository.assignments_on(date).await?;
        let loans = self.repository.loans_search(&LoanQuery::default()).await?;
        let requests: Vec<AssignmentRequest> = self
            .repository
            .list(&[Filter::eq("status", RequestStatus::Pending)])
            .await?;
        Ok(build_daily_report(date, &assignments, &loans, &requests))
    }

    /// Build and email the report; `recipients` overrides the configured list
    pub async fn send_daily(&self, date: NaiveDate, recipients: Option<Vec<String>>) -> AppResult<ReportDelivery> {
        let recipients = recipients
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| self.config.recipients.clone());
        let report = self.build(date).await?;

        self.email
            .send_to_all(&recipients, &report.subject(), &report.render())
            .await?;
        tracing::info!(%date, recipients = recipients.len(), "Daily report sent");

        Ok(ReportDelivery { success: true, recipients, report })
    }

    /// Run the daily report in the background at `reports.daily_at`
    pub fn spawn_scheduler(self) -> AppResult<JoinHandle<()>> {
        let at = self.config.daily_time().map_err(AppError::BadRequest)?;
        tracing::info!(daily_at = %at, "Daily report scheduler started");

        Ok(tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next = next_run_after(now, at);
                let wait = (next - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                let date = next.date_naive();
                if let Err(e) = self.send_daily(date, None).await {
                    tracing::warn!(%date, "Scheduled daily report failed: {}", e);
                }
            }
        }))
    }
}
