use actix_web::{
    HttpResponse, Responder,
    error::{ErrorBadRequest, ErrorInternalServerError},
    web,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::contractor::Contractor;
use crate::model::work_session::WorkSession;
use crate::payroll::{ContractorDirectory, compute_weekly_earnings};
use crate::payroll::weekly::WeeklyEarningsReport;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WeeklyEarningsQuery {
    /// Week-ending date, YYYY-MM-DD. Any date inside the week works;
    /// it snaps to the configured week boundary.
    #[schema(example = "2025-08-17")]
    pub week_ending: String,

    /// Restrict the report to a single contractor (exact name)
    #[schema(example = "Dalwayne Simpson")]
    pub contractor: Option<String>,
}

/// Weekly CIS earnings report
#[utoipa::path(
    get,
    path = "/api/v1/earnings/weekly",
    params(WeeklyEarningsQuery),
    responses(
        (status = 200, description = "Weekly earnings report", body = WeeklyEarningsReport),
        (status = 400, description = "Malformed week_ending date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Earnings"
)]
pub async fn weekly_earnings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<WeeklyEarningsQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    // the only hard input error: everything else degrades to diagnostics
    let week_ending = NaiveDate::parse_from_str(&query.week_ending, "%Y-%m-%d")
        .map_err(|_| ErrorBadRequest("week_ending must be a YYYY-MM-DD date"))?;

    let rules = &config.payroll;
    let (week_start, week_end) = rules.week_policy.window_containing(week_ending);

    let sessions = sqlx::query_as::<_, WorkSession>(
        r#"
        SELECT id, contractor_id, contractor_name, site_location, start_time, end_time,
               total_hours, status, start_latitude, start_longitude, end_latitude, end_longitude
        FROM work_sessions
        WHERE DATE(start_time) BETWEEN ? AND ?
        ORDER BY contractor_name, start_time
        "#,
    )
    .bind(week_start)
    .bind(week_end)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch work sessions for report");
        ErrorInternalServerError("Database error")
    })?;

    let contractors = sqlx::query_as::<_, Contractor>(
        r#"
        SELECT id, name, email, trade, phone, hourly_rate, cis_registered, status
        FROM contractors
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch contractors for report");
        ErrorInternalServerError("Database error")
    })?;

    let directory = ContractorDirectory::new(contractors);

    let report = compute_weekly_earnings(
        week_ending,
        query.contractor.as_deref(),
        &sessions,
        &directory,
        rules,
    );

    let unpriced = report.diagnostics.iter().filter(|d| !d.priced).count();
    if unpriced > 0 {
        warn!(
            unpriced,
            week_ending = %report.week_ending,
            "Weekly report has sessions that could not be priced"
        );
    }

    Ok(HttpResponse::Ok().json(report))
}
