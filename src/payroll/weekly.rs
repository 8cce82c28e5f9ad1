use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::payroll::cis::round_currency;
use crate::payroll::{PricedSession, SessionDiagnostic};

/// One contractor's line in the weekly report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContractorWeekSummary {
    #[schema(example = 12, nullable = true)]
    pub contractor_id: Option<u64>,
    #[schema(example = "Dalwayne Simpson")]
    pub contractor: String,
    #[schema(example = 40.0)]
    pub hours: f64,
    #[schema(example = 750.0)]
    pub gross: f64,
    #[schema(example = 225.0)]
    pub cis_deduction: f64,
    #[schema(example = 525.0)]
    pub net: f64,
    /// Priced session count, reported so exports can be sanity-checked.
    #[schema(example = 5)]
    pub sessions: u32,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct WeekTotals {
    pub hours: f64,
    pub gross: f64,
    pub cis_deduction: f64,
    pub net: f64,
    pub sessions: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeeklyEarningsReport {
    #[schema(example = "2025-08-11", value_type = String, format = "date")]
    pub week_start: NaiveDate,
    #[schema(example = "2025-08-17", value_type = String, format = "date")]
    pub week_ending: NaiveDate,
    /// Per-contractor subtotals, ordered by contractor name.
    pub contractors: Vec<ContractorWeekSummary>,
    pub totals: WeekTotals,
    /// Priced sessions feeding the subtotals, for detailed exports.
    pub sessions: Vec<PricedSession>,
    /// Sessions that could not be priced, plus consistency warnings.
    /// Consumers should surface these rather than present the totals
    /// as complete when entries with `priced == false` are present.
    pub diagnostics: Vec<SessionDiagnostic>,
}

/// Folds priced sessions into per-contractor lines and grand totals.
///
/// Grouping is by exact contractor name. Every figure entering the sums
/// is already rounded to pennies, so the totals are re-rounded only to
/// strip float noise, never to hide it.
pub fn aggregate(
    week_start: NaiveDate,
    week_ending: NaiveDate,
    mut sessions: Vec<PricedSession>,
    diagnostics: Vec<SessionDiagnostic>,
) -> WeeklyEarningsReport {
    sessions.sort_by(|a, b| {
        (a.contractor.as_str(), a.date, a.session_id).cmp(&(b.contractor.as_str(), b.date, b.session_id))
    });

    let mut per_contractor: BTreeMap<String, ContractorWeekSummary> = BTreeMap::new();

    for s in &sessions {
        let entry = per_contractor
            .entry(s.contractor.clone())
            .or_insert_with(|| ContractorWeekSummary {
                contractor_id: s.contractor_id,
                contractor: s.contractor.clone(),
                hours: 0.0,
                gross: 0.0,
                cis_deduction: 0.0,
                net: 0.0,
                sessions: 0,
            });

        entry.hours += s.hours;
        entry.gross += s.gross;
        entry.cis_deduction += s.cis_deduction;
        entry.net += s.net;
        entry.sessions += 1;
    }

    let mut totals = WeekTotals::default();
    let contractors: Vec<ContractorWeekSummary> = per_contractor
        .into_values()
        .map(|mut c| {
            c.hours = round_currency(c.hours);
            c.gross = round_currency(c.gross);
            c.cis_deduction = round_currency(c.cis_deduction);
            c.net = round_currency(c.net);

            totals.hours += c.hours;
            totals.gross += c.gross;
            totals.cis_deduction += c.cis_deduction;
            totals.net += c.net;
            totals.sessions += c.sessions;
            c
        })
        .collect();

    totals.hours = round_currency(totals.hours);
    totals.gross = round_currency(totals.gross);
    totals.cis_deduction = round_currency(totals.cis_deduction);
    totals.net = round_currency(totals.net);

    WeeklyEarningsReport {
        week_start,
        week_ending,
        contractors,
        totals,
        sessions,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn priced(contractor: &str, day: u32, gross: f64, cis: f64, hours: f64) -> PricedSession {
        PricedSession {
            session_id: day as u64,
            contractor_id: None,
            contractor: contractor.into(),
            date: NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
            hours,
            full_day: hours >= 8.0,
            gross,
            late_penalty: 0.0,
            cis_deduction: cis,
            net: round_currency(gross - cis),
        }
    }

    fn week() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 17).unwrap(),
        )
    }

    #[test]
    fn groups_by_exact_name_and_orders_output() {
        let (start, end) = week();
        let report = aggregate(
            start,
            end,
            vec![
                priced("Earl Grey", 12, 156.0, 31.2, 8.0),
                priced("Dalwayne Simpson", 11, 150.0, 45.0, 8.0),
                priced("Dalwayne Simpson", 12, 150.0, 45.0, 8.0),
                // case differs, so this is a different payee on purpose
                priced("dalwayne simpson", 13, 75.0, 22.5, 4.0),
            ],
            vec![],
        );

        let names: Vec<&str> = report.contractors.iter().map(|c| c.contractor.as_str()).collect();
        assert_eq!(names, ["Dalwayne Simpson", "Earl Grey", "dalwayne simpson"]);

        let dalwayne = &report.contractors[0];
        assert_eq!(dalwayne.sessions, 2);
        assert_eq!(dalwayne.gross, 300.0);
        assert_eq!(dalwayne.net, 210.0);
    }

    #[test]
    fn grand_totals_equal_sum_of_contractor_lines() {
        let (start, end) = week();
        let report = aggregate(
            start,
            end,
            vec![
                priced("A", 11, 150.0, 45.0, 8.0),
                priced("B", 11, 142.5, 42.75, 8.0),
                priced("C", 12, 75.0, 22.5, 4.0),
            ],
            vec![],
        );

        let hours: f64 = report.contractors.iter().map(|c| c.hours).sum();
        let net: f64 = report.contractors.iter().map(|c| c.net).sum();
        assert_eq!(report.totals.hours, round_currency(hours));
        assert_eq!(report.totals.net, round_currency(net));
        assert_eq!(report.totals.sessions, 3);
        assert_eq!(report.totals.gross, 367.5);
    }

    #[test]
    fn empty_week_produces_zero_totals() {
        let (start, end) = week();
        let report = aggregate(start, end, vec![], vec![]);
        assert!(report.contractors.is_empty());
        assert_eq!(report.totals.gross, 0.0);
        assert_eq!(report.totals.sessions, 0);
    }

    #[test]
    fn sessions_come_back_sorted_for_stable_exports() {
        let (start, end) = week();
        let report = aggregate(
            start,
            end,
            vec![
                priced("B", 12, 150.0, 45.0, 8.0),
                priced("A", 13, 150.0, 45.0, 8.0),
                priced("A", 11, 150.0, 45.0, 8.0),
            ],
            vec![],
        );
        let order: Vec<(String, u32)> = report
            .sessions
            .iter()
            .map(|s| (s.contractor.clone(), s.date.day()))
            .collect();
        assert_eq!(
            order,
            [("A".into(), 11), ("A".into(), 13), ("B".into(), 12)]
        );
    }
}
