use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "name": "Dalwayne Simpson",
        "email": "dalwayne@company.com",
        "trade": "Bricklayer",
        "phone": "+447700900123",
        "hourly_rate": 18.75,
        "cis_registered": false,
        "status": "available"
    })
)]
pub struct Contractor {
    #[schema(example = 12)]
    pub id: u64,

    #[schema(example = "Dalwayne Simpson")]
    pub name: String,

    #[schema(example = "dalwayne@company.com")]
    pub email: String,

    #[schema(example = "Bricklayer")]
    pub trade: String,

    #[schema(example = "+447700900123", nullable = true)]
    pub phone: Option<String>,

    /// Pay rate in GBP per hour, set by the admin at onboarding.
    #[schema(example = 18.75)]
    pub hourly_rate: f64,

    /// Registered subcontractors are withheld at the lower CIS rate.
    #[schema(example = false)]
    pub cis_registered: bool,

    #[schema(example = "available")]
    pub status: String,
}

impl Contractor {
    /// Flat rate for a full day on site, derived from the hourly rate.
    pub fn daily_rate(&self, full_day_hours: f64) -> f64 {
        self.hourly_rate * full_day_hours
    }
}
