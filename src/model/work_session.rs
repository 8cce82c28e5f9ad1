use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of a clock-in/clock-out session. Stored as snake_case TEXT.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
    TemporarilyAway,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "contractor_id": 12,
        "contractor_name": "Dalwayne Simpson",
        "site_location": "ME5 9GX",
        "start_time": "2025-08-11T07:44:00",
        "end_time": "2025-08-11T17:00:00",
        "total_hours": 8.27,
        "status": "completed"
    })
)]
pub struct WorkSession {
    #[schema(example = 1)]
    pub id: u64,

    /// Null on rows imported before contractor ids existed; the engine
    /// falls back to exact-name matching for those.
    #[schema(example = 12, nullable = true)]
    pub contractor_id: Option<u64>,

    #[schema(example = "Dalwayne Simpson")]
    pub contractor_name: String,

    #[schema(example = "ME5 9GX")]
    pub site_location: String,

    #[schema(example = "2025-08-11T07:44:00", value_type = String, format = "date-time")]
    pub start_time: NaiveDateTime,

    /// Unset while the session is still active.
    #[schema(example = "2025-08-11T17:00:00", value_type = String, format = "date-time", nullable = true)]
    pub end_time: Option<NaiveDateTime>,

    /// Recorded once at clock-out; authoritative for pay when present.
    #[schema(example = 8.27, nullable = true)]
    pub total_hours: Option<f64>,

    pub status: SessionStatus,

    #[schema(example = 51.3397, nullable = true)]
    pub start_latitude: Option<f64>,
    #[schema(example = 0.5462, nullable = true)]
    pub start_longitude: Option<f64>,
    #[schema(example = 51.3398, nullable = true)]
    pub end_latitude: Option<f64>,
    #[schema(example = 0.5465, nullable = true)]
    pub end_longitude: Option<f64>,
}
