use std::str::FromStr;

use crate::auth::auth::AuthUser;
use crate::model::contractor::Contractor;
use crate::model::work_session::{SessionStatus, WorkSession};
use crate::utils::{name_filter, profile_cache};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ClockInRequest {
    #[schema(example = "ME5 9GX")]
    pub site_location: String,

    /// Required when an admin or site manager clocks somebody in;
    /// ignored for contractors, who always clock themselves in.
    #[schema(example = "Dalwayne Simpson", nullable = true)]
    pub contractor_name: Option<String>,

    #[schema(example = 51.3397, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 0.5462, nullable = true)]
    pub longitude: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct ClockOutRequest {
    #[schema(example = "Dalwayne Simpson", nullable = true)]
    pub contractor_name: Option<String>,

    #[schema(example = 51.3398, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 0.5465, nullable = true)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SessionQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub contractor: Option<String>,
    pub status: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub from: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub to: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionListResponse {
    pub data: Vec<WorkSession>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Resolves which pay profile a clock request acts on. Contractors act
/// on their own linked profile; staff name the contractor explicitly
/// and go through the fast-reject filter before the cache and database.
async fn resolve_target(
    auth: &AuthUser,
    requested_name: Option<&str>,
    pool: &MySqlPool,
) -> Result<Contractor, HttpResponse> {
    if auth.is_contractor() {
        let contractor_id = match auth.contractor_id {
            Some(id) => id,
            None => {
                return Err(HttpResponse::Forbidden().json(json!({
                    "message": "No contractor profile linked to this account"
                })));
            }
        };

        let row = sqlx::query_as::<_, Contractor>(
            r#"
            SELECT id, name, email, trade, phone, hourly_rate, cis_registered, status
            FROM contractors
            WHERE id = ?
            "#,
        )
        .bind(contractor_id)
        .fetch_optional(pool)
        .await;

        return match row {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(HttpResponse::Forbidden().json(json!({
                "message": "Contractor profile no longer exists"
            }))),
            Err(e) => {
                error!(error = %e, contractor_id, "Failed to fetch contractor profile");
                Err(HttpResponse::InternalServerError().finish())
            }
        };
    }

    let name = match requested_name {
        Some(n) if !n.trim().is_empty() => n.trim(),
        _ => {
            return Err(HttpResponse::BadRequest().json(json!({
                "message": "contractor_name is required"
            })));
        }
    };

    // cheap negative before any I/O; the filter never has false negatives
    if !name_filter::might_exist(name) {
        return Err(HttpResponse::NotFound().json(json!({
            "message": "Unknown contractor"
        })));
    }

    match profile_cache::lookup(pool, name).await {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => Err(HttpResponse::NotFound().json(json!({
            "message": "Unknown contractor"
        }))),
        Err(e) => {
            error!(error = %e, name, "Failed to look up contractor profile");
            Err(HttpResponse::InternalServerError().finish())
        }
    }
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/timeclock/clock-in",
    request_body = ClockInRequest,
    responses(
        (status = 200, description = "Clocked in successfully", body = Object, example = json!({
            "message": "Clocked in successfully"
        })),
        (status = 400, description = "Already clocked in", body = Object, example = json!({
            "message": "Already clocked in"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown contractor"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockInRequest>,
) -> actix_web::Result<impl Responder> {
    let profile = match resolve_target(&auth, payload.contractor_name.as_deref(), pool.get_ref()).await
    {
        Ok(p) => p,
        Err(resp) => return Ok(resp),
    };

    let already_on_site = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM work_sessions
            WHERE contractor_id = ? AND status IN ('active', 'temporarily_away')
        )
        "#,
    )
    .bind(profile.id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, contractor_id = profile.id, "Clock-in lookup failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if already_on_site {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Already clocked in"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO work_sessions
        (contractor_id, contractor_name, site_location, start_time, status, start_latitude, start_longitude)
        VALUES (?, ?, ?, NOW(), ?, ?, ?)
        "#,
    )
    .bind(profile.id)
    .bind(&profile.name)
    .bind(payload.site_location.trim())
    .bind(SessionStatus::Active.to_string())
    .bind(payload.latitude)
    .bind(payload.longitude)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, contractor_id = profile.id, "Clock-in failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    debug!(contractor = %profile.name, site = %payload.site_location, "Clock-in recorded");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clocked in successfully"
    })))
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/timeclock/clock-out",
    request_body = ClockOutRequest,
    responses(
        (status = 200, description = "Clocked out successfully", body = Object, example = json!({
            "message": "Clocked out successfully"
        })),
        (status = 400, description = "No active session found", body = Object, example = json!({
            "message": "No active session found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown contractor"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timeclock"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockOutRequest>,
) -> actix_web::Result<impl Responder> {
    let profile = match resolve_target(&auth, payload.contractor_name.as_deref(), pool.get_ref()).await
    {
        Ok(p) => p,
        Err(resp) => return Ok(resp),
    };

    // total_hours is written exactly once, here; the earnings engine
    // treats it as the authoritative duration from then on
    let result = sqlx::query(
        r#"
        UPDATE work_sessions
        SET end_time = NOW(),
            total_hours = TIMESTAMPDIFF(SECOND, start_time, NOW()) / 3600.0,
            status = ?,
            end_latitude = ?,
            end_longitude = ?
        WHERE contractor_id = ?
        AND status IN ('active', 'temporarily_away')
        "#,
    )
    .bind(SessionStatus::Completed.to_string())
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(profile.id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, contractor_id = profile.id, "Clock-out failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No active session found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clocked out successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/timeclock/sessions",
    params(
        ("page",  Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("contractor", Query, description = "Filter by contractor name"),
        ("status", Query, description = "Filter by session status"),
        ("from", Query, description = "Earliest start date, YYYY-MM-DD"),
        ("to", Query, description = "Latest start date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Paginated session list", body = SessionListResponse),
        (status = 400, description = "Bad filter value")
    ),
    tag = "Timeclock",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_sessions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SessionQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<sqlx::types::JsonValue> = Vec::new();

    if let Some(contractor) = &query.contractor {
        conditions.push("contractor_name = ?");
        bindings.push(contractor.clone().into());
    }

    if let Some(status) = &query.status {
        let status = SessionStatus::from_str(status).map_err(|_| {
            actix_web::error::ErrorBadRequest("status must be one of active, completed, cancelled, temporarily_away")
        })?;
        conditions.push("status = ?");
        bindings.push(status.to_string().into());
    }

    if let Some(from) = &query.from {
        conditions.push("DATE(start_time) >= ?");
        bindings.push(from.clone().into());
    }

    if let Some(to) = &query.to {
        conditions.push("DATE(start_time) <= ?");
        bindings.push(to.clone().into());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM work_sessions {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting sessions");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count sessions");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT id, contractor_id, contractor_name, site_location, start_time, end_time, total_hours, status, \
         start_latitude, start_longitude, end_latitude, end_longitude \
         FROM work_sessions {} ORDER BY start_time DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching sessions");

    let mut data_query = sqlx::query_as::<_, WorkSession>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let sessions = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch sessions");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(SessionListResponse {
        data: sessions,
        page,
        per_page,
        total,
    }))
}
