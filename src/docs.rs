use crate::api::contractor::{
    ContractorListResponse, ContractorQuery, CreateContractor, UpdateContractor,
};
use crate::api::earnings::WeeklyEarningsQuery;
use crate::api::timeclock::{ClockInRequest, ClockOutRequest, SessionListResponse, SessionQuery};
use crate::model::contractor::Contractor;
use crate::model::work_session::{SessionStatus, WorkSession};
use crate::payroll::weekly::{ContractorWeekSummary, WeekTotals, WeeklyEarningsReport};
use crate::payroll::{PricedSession, SessionDiagnostic};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SitePay API",
        version = "1.0.0",
        description = r#"
## Contractor Time & Payroll (SitePay)

This API powers the back office of a small building firm: GPS time
clocking on site, contractor pay profiles, and weekly CIS payroll.

### 🔹 Key Features
- **Timeclock**
  - Clock in/out of job sites with optional GPS fixes
  - Admin review of raw work sessions
- **Contractor Management**
  - Create, update, list, and view pay profiles (rate, CIS status)
- **Weekly Earnings**
  - Per-contractor gross/CIS/net with late-arrival penalties and
    full-day vs hourly pricing, plus data-quality diagnostics

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Reports and roster changes are restricted to **Admin** and
**Site Manager** roles; contractors can only clock themselves in/out.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
- Weekly reports carry a `diagnostics` array; entries with
  `priced == false` mean the totals are incomplete

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::timeclock::clock_in,
        crate::api::timeclock::clock_out,
        crate::api::timeclock::list_sessions,

        crate::api::contractor::create_contractor,
        crate::api::contractor::get_contractor,
        crate::api::contractor::list_contractors,
        crate::api::contractor::update_contractor,
        crate::api::contractor::delete_contractor,

        crate::api::earnings::weekly_earnings
    ),
    components(
        schemas(
            Contractor,
            CreateContractor,
            UpdateContractor,
            ContractorQuery,
            ContractorListResponse,
            WorkSession,
            SessionStatus,
            ClockInRequest,
            ClockOutRequest,
            SessionQuery,
            SessionListResponse,
            WeeklyEarningsQuery,
            WeeklyEarningsReport,
            ContractorWeekSummary,
            WeekTotals,
            PricedSession,
            SessionDiagnostic
        )
    ),
    tags(
        (name = "Timeclock", description = "Clock-in/out and session review APIs"),
        (name = "Contractor", description = "Contractor pay-profile APIs"),
        (name = "Earnings", description = "Weekly CIS earnings report APIs"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
