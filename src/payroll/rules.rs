use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Which figure counts as hours worked when a session carries both a
/// recorded total and a start/end pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HoursSource {
    /// Recorded total_hours wins; timestamps are the fallback.
    RecordedThenDelta,
    /// Always recompute from end - start, ignoring the recorded figure.
    DeltaOnly,
}

/// Week bucketing convention for the weekly report.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeekPolicy {
    /// ISO weeks: Monday start, Sunday end.
    MondayToSunday,
    /// Pay weeks ending Friday (Saturday start).
    EndingFriday,
}

impl WeekPolicy {
    pub fn week_ends_on(self) -> Weekday {
        match self {
            WeekPolicy::MondayToSunday => Weekday::Sun,
            WeekPolicy::EndingFriday => Weekday::Fri,
        }
    }

    /// Inclusive [start, end] of the week containing `date`.
    /// A mid-week date snaps forward to the policy's week-ending day.
    pub fn window_containing(self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end_idx = self.week_ends_on().num_days_from_monday();
        let date_idx = date.weekday().num_days_from_monday();
        let days_until_end = (7 + end_idx - date_idx) % 7;

        let end = date + Days::new(days_until_end as u64);
        let start = end - Days::new(6);
        (start, end)
    }
}

/// Every tunable of the earnings calculation, hoisted out of the call
/// sites so a deployment can override them from the environment and the
/// tests can run with non-default values.
#[derive(Debug, Clone)]
pub struct PayrollRules {
    /// Hours on site that qualify a session for the flat daily rate.
    pub full_day_hours: f64,
    /// Latest acceptable clock-in before the lateness penalty starts.
    pub late_cutoff: NaiveTime,
    /// GBP deducted per minute past the cutoff.
    pub late_penalty_per_minute: f64,
    /// Ceiling on the lateness deduction, GBP.
    pub late_penalty_cap: f64,
    /// A full day on site never pays below this, GBP.
    pub min_daily_pay: f64,
    /// CIS withholding for registered subcontractors.
    pub cis_registered_rate: f64,
    /// CIS withholding for unregistered subcontractors.
    pub cis_unregistered_rate: f64,
    pub week_policy: WeekPolicy,
    pub hours_source: HoursSource,
    /// Recorded total vs timestamp delta disagreement, in hours, beyond
    /// which the report carries a consistency warning.
    pub recorded_hours_tolerance: f64,
}

impl Default for PayrollRules {
    fn default() -> Self {
        Self {
            full_day_hours: 8.0,
            late_cutoff: NaiveTime::from_hms_opt(8, 15, 0).unwrap(),
            late_penalty_per_minute: 0.50,
            late_penalty_cap: 50.0,
            min_daily_pay: 100.0,
            cis_registered_rate: 0.20,
            cis_unregistered_rate: 0.30,
            week_policy: WeekPolicy::MondayToSunday,
            hours_source: HoursSource::RecordedThenDelta,
            recorded_hours_tolerance: 0.05,
        }
    }
}

impl PayrollRules {
    pub fn cis_rate(&self, registered: bool) -> f64 {
        if registered {
            self.cis_registered_rate
        } else {
            self.cis_unregistered_rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn iso_week_snaps_to_sunday() {
        // 2025-08-13 is a Wednesday
        let (start, end) = WeekPolicy::MondayToSunday.window_containing(date(2025, 8, 13));
        assert_eq!(start, date(2025, 8, 11));
        assert_eq!(end, date(2025, 8, 17));
    }

    #[test]
    fn iso_week_end_day_maps_to_itself() {
        let (start, end) = WeekPolicy::MondayToSunday.window_containing(date(2025, 8, 17));
        assert_eq!(start, date(2025, 8, 11));
        assert_eq!(end, date(2025, 8, 17));
    }

    #[test]
    fn friday_ending_week_starts_saturday() {
        // 2025-08-13 (Wed) belongs to the Sat 09 .. Fri 15 pay week
        let (start, end) = WeekPolicy::EndingFriday.window_containing(date(2025, 8, 13));
        assert_eq!(start, date(2025, 8, 9));
        assert_eq!(end, date(2025, 8, 15));
    }

    #[test]
    fn saturday_opens_a_new_friday_ending_week() {
        let (start, end) = WeekPolicy::EndingFriday.window_containing(date(2025, 8, 16));
        assert_eq!(start, date(2025, 8, 16));
        assert_eq!(end, date(2025, 8, 22));
    }

    #[test]
    fn default_rules_match_company_policy() {
        let rules = PayrollRules::default();
        assert_eq!(rules.full_day_hours, 8.0);
        assert_eq!(rules.late_cutoff, NaiveTime::from_hms_opt(8, 15, 0).unwrap());
        assert_eq!(rules.cis_rate(true), 0.20);
        assert_eq!(rules.cis_rate(false), 0.30);
    }
}
