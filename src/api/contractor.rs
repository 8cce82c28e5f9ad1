use crate::{
    auth::auth::AuthUser,
    model::contractor::Contractor,
    utils::db_utils::{build_update_sql, execute_update},
    utils::{name_filter, profile_cache},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateContractor {
    #[schema(example = "Dalwayne Simpson")]
    pub name: String,
    #[schema(example = "dalwayne@company.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "Bricklayer")]
    pub trade: String,
    #[schema(example = "+447700900123", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = 18.75)]
    pub hourly_rate: f64,
    #[schema(example = false)]
    pub cis_registered: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContractorQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub trade: Option<String>,
    pub status: Option<String>,
    pub cis_registered: Option<bool>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ContractorListResponse {
    pub data: Vec<Contractor>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 7)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateContractor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub trade: Option<String>,
    pub phone: Option<String>,
    pub hourly_rate: Option<f64>,
    pub cis_registered: Option<bool>,
    pub status: Option<String>,
}

/// Create Contractor
#[utoipa::path(
    post,
    path = "/api/v1/contractors",
    request_body = CreateContractor,
    responses(
        (status = 201, description = "Contractor created successfully", body = Object, example = json!({
            "message": "Contractor created successfully"
        })),
        (status = 400, description = "Rate rejected", body = Object, example = json!({
            "message": "hourly_rate must be a positive amount"
        })),
        (status = 409, description = "Name already on the roster"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Contractor",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_contractor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateContractor>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    // a broken rate here would poison every payslip downstream
    if !payload.hourly_rate.is_finite() || payload.hourly_rate <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "hourly_rate must be a positive amount"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO contractors
        (name, email, trade, phone, hourly_rate, cis_registered, status)
        VALUES (?, ?, ?, ?, ?, ?, 'available')
        "#,
    )
    .bind(payload.name.trim())
    .bind(&payload.email)
    .bind(&payload.trade)
    .bind(&payload.phone)
    .bind(payload.hourly_rate)
    .bind(payload.cis_registered)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            name_filter::insert(payload.name.trim());
            Ok(HttpResponse::Created().json(json!({
                "message": "Contractor created successfully"
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "A contractor with that name or email already exists"
                    })));
                }
            }

            error!(error = %e, "Failed to create contractor");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/contractors",
    params(
        ("page",  Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("trade", Query, description = "Filter by trade"),
        ("status", Query, description = "Filter by availability status"),
        ("cis_registered", Query, description = "Filter by CIS registration"),
        ("search", Query, description = "Search by name or email")
    ),
    responses(
        (status = 200, description = "Paginated contractor list", body = ContractorListResponse)
    ),
    tag = "Contractor",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_contractors(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ContractorQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<sqlx::types::JsonValue> = Vec::new();

    if let Some(trade) = &query.trade {
        conditions.push("trade = ?");
        bindings.push(trade.clone().into());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone().into());
    }

    if let Some(cis_registered) = query.cis_registered {
        conditions.push("cis_registered = ?");
        bindings.push(cis_registered.into());
    }

    if let Some(search) = &query.search {
        conditions.push("(name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone().into());
        bindings.push(like.into());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM contractors {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting contractors");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count contractors");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT id, name, email, trade, phone, hourly_rate, cis_registered, status FROM contractors {} ORDER BY name ASC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching contractors");

    let mut data_query = sqlx::query_as::<_, Contractor>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let contractors = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch contractors");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(ContractorListResponse {
        data: contractors,
        page,
        per_page,
        total,
    }))
}

/// Update Contractor
#[utoipa::path(
    put,
    path = "/api/v1/contractors/{contractor_id}",
    params(
        ("contractor_id", Path, description = "Contractor ID")
    ),
    request_body = UpdateContractor,
    responses(
        (status = 200, description = "Contractor updated successfully"),
        (status = 404, description = "Contractor not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Contractor",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_contractor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let contractor_id = path.into_inner();

    // current name is needed to keep the filter and cache coherent when
    // the update renames the contractor
    let current_name = sqlx::query_scalar::<_, String>("SELECT name FROM contractors WHERE id = ?")
        .bind(contractor_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, contractor_id, "Failed to fetch contractor");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(current_name) = current_name else {
        return Ok(HttpResponse::NotFound().body("Contractor not found"));
    };

    let update = build_update_sql("contractors", &body, "id", contractor_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Contractor not found"));
    }

    profile_cache::invalidate(&current_name).await;
    if let Some(new_name) = body.get("name").and_then(|v| v.as_str()) {
        if new_name != current_name {
            name_filter::remove(&current_name);
            name_filter::insert(new_name);
            profile_cache::invalidate(new_name).await;
        }
    }

    Ok(HttpResponse::Ok().body("Contractor updated successfully"))
}

/// Delete Contractor
#[utoipa::path(
    delete,
    path = "/api/v1/contractors/{contractor_id}",
    params(
        ("contractor_id", Path, description = "Contractor ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Contractor not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Contractor",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_contractor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let contractor_id = path.into_inner();

    let name = sqlx::query_scalar::<_, String>("SELECT name FROM contractors WHERE id = ?")
        .bind(contractor_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, contractor_id, "Failed to fetch contractor");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(name) = name else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Contractor not found"
        })));
    };

    let result = sqlx::query("DELETE FROM contractors WHERE id = ?")
        .bind(contractor_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Contractor not found"
                })));
            }

            name_filter::remove(&name);
            profile_cache::invalidate(&name).await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }

        Err(e) => {
            error!(error = %e, contractor_id, "Failed to delete contractor");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Get Contractor by ID
#[utoipa::path(
    get,
    path = "/api/v1/contractors/{contractor_id}",
    params(
        ("contractor_id", Path, description = "Contractor ID")
    ),
    responses(
        (status = 200, description = "Contractor found", body = Contractor),
        (status = 404, description = "Contractor not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Contractor",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_contractor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let contractor_id: u64 = path.into_inner();

    let contractor = sqlx::query_as::<_, Contractor>(
        r#"
        SELECT id, name, email, trade, phone, hourly_rate, cis_registered, status
        FROM contractors
        WHERE id = ?
        "#,
    )
    .bind(contractor_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, contractor_id, "Failed to fetch contractor");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match contractor {
        Some(c) => Ok(HttpResponse::Ok().json(c)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Contractor not found"
        }))),
    }
}
