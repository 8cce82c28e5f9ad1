//! Weekly CIS earnings engine.
//!
//! Pure computation over sessions and pay profiles already fetched from
//! the database: no I/O, no shared state, safe to run twice per request
//! (preview and export) with identical output.

pub mod cis;
pub mod hours;
pub mod penalty;
pub mod rates;
pub mod rules;
pub mod weekly;

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::contractor::Contractor;
use crate::model::work_session::{SessionStatus, WorkSession};
use self::cis::round_currency;
use self::rules::PayrollRules;
use self::weekly::WeeklyEarningsReport;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("no pay profile for contractor '{name}'")]
    UnresolvedContractor { name: String },

    #[error("session {session_id} is not payable: {reason}")]
    InvalidSession { session_id: u64, reason: String },

    #[error("contractor '{name}' has an unusable hourly rate: {rate}")]
    InvalidRate { name: String, rate: f64 },
}

/// Per-session problem reported alongside the weekly report instead of
/// failing it. `priced == false` means the session is missing from the
/// totals; `priced == true` marks a consistency warning on a session
/// that was still paid.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionDiagnostic {
    #[schema(example = 41)]
    pub session_id: u64,
    #[schema(example = "Dalwayne Simpson")]
    pub contractor: String,
    #[schema(example = "no pay profile for contractor 'Dalwayne Simpson'")]
    pub problem: String,
    pub priced: bool,
}

impl SessionDiagnostic {
    fn unpriced(session: &WorkSession, err: &PricingError) -> Self {
        Self {
            session_id: session.id,
            contractor: session.contractor_name.clone(),
            problem: err.to_string(),
            priced: false,
        }
    }
}

/// One session priced end to end: normalized hours, rate decision,
/// lateness penalty, CIS withholding. All money fields are in pennies
/// precision (two decimals).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PricedSession {
    #[schema(example = 41)]
    pub session_id: u64,
    #[schema(example = 12, nullable = true)]
    pub contractor_id: Option<u64>,
    #[schema(example = "Dalwayne Simpson")]
    pub contractor: String,
    #[schema(example = "2025-08-11", value_type = String, format = "date")]
    pub date: NaiveDate,
    /// Hours counted for pay, capped at the full-day threshold.
    #[schema(example = 8.0)]
    pub hours: f64,
    pub full_day: bool,
    #[schema(example = 150.0)]
    pub gross: f64,
    #[schema(example = 0.0)]
    pub late_penalty: f64,
    #[schema(example = 45.0)]
    pub cis_deduction: f64,
    #[schema(example = 105.0)]
    pub net: f64,
}

/// Pay-profile lookup for the engine. Sessions resolve by contractor id
/// when they carry one; rows from before ids existed fall back to an
/// exact, case-sensitive name match.
pub struct ContractorDirectory {
    by_id: HashMap<u64, Contractor>,
    ids_by_name: HashMap<String, u64>,
}

impl ContractorDirectory {
    pub fn new(contractors: impl IntoIterator<Item = Contractor>) -> Self {
        let mut by_id = HashMap::new();
        let mut ids_by_name = HashMap::new();
        for c in contractors {
            ids_by_name.insert(c.name.clone(), c.id);
            by_id.insert(c.id, c);
        }
        Self { by_id, ids_by_name }
    }

    pub fn resolve(&self, session: &WorkSession) -> Option<&Contractor> {
        if let Some(id) = session.contractor_id {
            return self.by_id.get(&id);
        }
        self.ids_by_name
            .get(&session.contractor_name)
            .and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Prices a single completed session against a pay profile.
///
/// Returns the priced session plus an optional consistency warning when
/// the recorded hours and the clock delta disagree.
pub fn price_session(
    session: &WorkSession,
    profile: &Contractor,
    rules: &PayrollRules,
) -> Result<(PricedSession, Option<SessionDiagnostic>), PricingError> {
    if !profile.hourly_rate.is_finite() || profile.hourly_rate <= 0.0 {
        return Err(PricingError::InvalidRate {
            name: profile.name.clone(),
            rate: profile.hourly_rate,
        });
    }

    let normalized = hours::normalize(session, rules)?;
    let rate = rates::resolve(
        normalized.hours,
        profile.hourly_rate,
        profile.daily_rate(rules.full_day_hours),
        rules,
    );
    let pen = penalty::apply(session.start_time.time(), rate.gross, rate.full_day, rules);
    let withheld = cis::withhold(pen.gross, profile.cis_registered, rules);

    let warning = normalized.recorded_delta_gap.map(|gap| SessionDiagnostic {
        session_id: session.id,
        contractor: profile.name.clone(),
        problem: format!("recorded hours differ from clock-in/out delta by {gap:.2}h"),
        priced: true,
    });

    Ok((
        PricedSession {
            session_id: session.id,
            contractor_id: Some(profile.id),
            contractor: profile.name.clone(),
            date: session.start_time.date(),
            hours: rate.paid_hours,
            full_day: rate.full_day,
            gross: withheld.gross,
            late_penalty: round_currency(pen.penalty),
            cis_deduction: withheld.deduction,
            net: withheld.net,
        },
        warning,
    ))
}

/// The engine's single logical operation: price every completed session
/// in the week containing `week_ending` and fold them into a report.
///
/// Bad rows never abort the report; they are returned as diagnostics so
/// callers can flag incomplete data instead of silently under-counting.
pub fn compute_weekly_earnings(
    week_ending: NaiveDate,
    contractor_filter: Option<&str>,
    sessions: &[WorkSession],
    directory: &ContractorDirectory,
    rules: &PayrollRules,
) -> WeeklyEarningsReport {
    let (week_start, week_end) = rules.week_policy.window_containing(week_ending);

    let mut priced = Vec::new();
    let mut diagnostics = Vec::new();

    for session in sessions {
        let date = session.start_time.date();
        if date < week_start || date > week_end {
            continue;
        }
        if let Some(name) = contractor_filter {
            if session.contractor_name != name {
                continue;
            }
        }

        match session.status {
            SessionStatus::Completed => {}
            // still on site or never finished: not payable, not an anomaly
            SessionStatus::Active | SessionStatus::TemporarilyAway | SessionStatus::Cancelled => {
                continue;
            }
        }

        let Some(profile) = directory.resolve(session) else {
            diagnostics.push(SessionDiagnostic::unpriced(
                session,
                &PricingError::UnresolvedContractor {
                    name: session.contractor_name.clone(),
                },
            ));
            continue;
        };

        match price_session(session, profile, rules) {
            Ok((p, warning)) => {
                diagnostics.extend(warning);
                priced.push(p);
            }
            Err(e) => diagnostics.push(SessionDiagnostic::unpriced(session, &e)),
        }
    }

    weekly::aggregate(week_start, week_end, priced, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::rules::WeekPolicy;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn contractor(id: u64, name: &str, hourly_rate: f64, cis_registered: bool) -> Contractor {
        Contractor {
            id,
            name: name.into(),
            email: format!("{}@site.test", id),
            trade: "Bricklayer".into(),
            phone: None,
            hourly_rate,
            cis_registered,
            status: "available".into(),
        }
    }

    fn session(id: u64, contractor_id: Option<u64>, name: &str, start: NaiveDateTime) -> WorkSession {
        WorkSession {
            id,
            contractor_id,
            contractor_name: name.into(),
            site_location: "ME5 9GX".into(),
            start_time: start,
            end_time: None,
            total_hours: None,
            status: SessionStatus::Completed,
            start_latitude: None,
            start_longitude: None,
            end_latitude: None,
            end_longitude: None,
        }
    }

    fn completed(
        id: u64,
        contractor_id: Option<u64>,
        name: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        total_hours: Option<f64>,
    ) -> WorkSession {
        let mut s = session(id, contractor_id, name, start);
        s.end_time = Some(end);
        s.total_hours = total_hours;
        s
    }

    fn dalwayne() -> Contractor {
        // 18.75/h, daily rate 150, unregistered -> 30% CIS
        contractor(12, "Dalwayne Simpson", 18.75, false)
    }

    fn directory() -> ContractorDirectory {
        ContractorDirectory::new([dalwayne()])
    }

    // Monday 2025-08-11 .. Sunday 2025-08-17
    const WEEK_ENDING: (i32, u32, u32) = (2025, 8, 17);

    fn week_ending() -> NaiveDate {
        NaiveDate::from_ymd_opt(WEEK_ENDING.0, WEEK_ENDING.1, WEEK_ENDING.2).unwrap()
    }

    #[test]
    fn on_time_full_day_pays_flat_rate_minus_cis() {
        let sessions = [completed(
            1,
            Some(12),
            "Dalwayne Simpson",
            dt(11, 7, 44),
            dt(11, 17, 0),
            Some(8.27),
        )];
        let report =
            compute_weekly_earnings(week_ending(), None, &sessions, &directory(), &PayrollRules::default());

        assert_eq!(report.sessions.len(), 1);
        let s = &report.sessions[0];
        assert!(s.full_day);
        assert_eq!(s.hours, 8.0);
        assert_eq!(s.gross, 150.0);
        assert_eq!(s.cis_deduction, 45.0);
        assert_eq!(s.net, 105.0);
        assert_eq!(s.late_penalty, 0.0);

        // recorded 8.27h vs 9.27h on the clock: warning rides along,
        // the session still counts
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].priced);
        assert_eq!(report.totals.net, 105.0);
    }

    #[test]
    fn late_full_day_loses_fifty_pence_per_minute() {
        let sessions = [completed(
            2,
            Some(12),
            "Dalwayne Simpson",
            dt(11, 8, 30),
            dt(11, 17, 30),
            None,
        )];
        let report =
            compute_weekly_earnings(week_ending(), None, &sessions, &directory(), &PayrollRules::default());

        let s = &report.sessions[0];
        assert_eq!(s.late_penalty, 7.5);
        assert_eq!(s.gross, 142.5);
        assert_eq!(s.cis_deduction, 42.75);
        assert_eq!(s.net, 99.75);
    }

    #[test]
    fn partial_day_is_hourly_and_never_penalized() {
        // starts late, but a 4h session is outside the penalty rule
        let sessions = [completed(
            3,
            Some(12),
            "Dalwayne Simpson",
            dt(12, 9, 0),
            dt(12, 13, 0),
            None,
        )];
        let report =
            compute_weekly_earnings(week_ending(), None, &sessions, &directory(), &PayrollRules::default());

        let s = &report.sessions[0];
        assert!(!s.full_day);
        assert_eq!(s.hours, 4.0);
        assert_eq!(s.gross, 75.0);
        assert_eq!(s.late_penalty, 0.0);
        assert_eq!(s.cis_deduction, 22.5);
        assert_eq!(s.net, 52.5);
    }

    #[test]
    fn extreme_lateness_is_capped_and_floored() {
        // 200 minutes past the 08:15 cutoff
        let sessions = [completed(
            4,
            Some(12),
            "Dalwayne Simpson",
            dt(13, 11, 35),
            dt(13, 19, 35),
            None,
        )];
        let report =
            compute_weekly_earnings(week_ending(), None, &sessions, &directory(), &PayrollRules::default());

        let s = &report.sessions[0];
        assert_eq!(s.late_penalty, 50.0);
        assert_eq!(s.gross, 100.0);
        // the floor only bites when daily rate minus the capped
        // deduction would undershoot it; 150 - 50 sits exactly on it
        assert!(s.gross >= 100.0);
    }

    #[test]
    fn empty_week_is_a_zero_report_not_an_error() {
        let report = compute_weekly_earnings(
            week_ending(),
            None,
            &[],
            &directory(),
            &PayrollRules::default(),
        );
        assert!(report.contractors.is_empty());
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.totals.gross, 0.0);
    }

    #[test]
    fn unknown_contractor_is_reported_not_fatal() {
        let sessions = [
            completed(5, None, "Nobody Known", dt(11, 8, 0), dt(11, 16, 0), None),
            completed(6, Some(12), "Dalwayne Simpson", dt(11, 8, 0), dt(11, 16, 0), None),
        ];
        let report =
            compute_weekly_earnings(week_ending(), None, &sessions, &directory(), &PayrollRules::default());

        assert_eq!(report.sessions.len(), 1);
        assert_eq!(report.totals.net, 105.0);
        let unpriced: Vec<_> = report.diagnostics.iter().filter(|d| !d.priced).collect();
        assert_eq!(unpriced.len(), 1);
        assert_eq!(unpriced[0].contractor, "Nobody Known");
    }

    #[test]
    fn corrupt_sessions_become_diagnostics() {
        let sessions = [
            // end before start
            completed(7, Some(12), "Dalwayne Simpson", dt(11, 17, 0), dt(11, 8, 0), None),
            // completed but never closed out
            session(8, Some(12), "Dalwayne Simpson", dt(12, 8, 0)),
        ];
        let report =
            compute_weekly_earnings(week_ending(), None, &sessions, &directory(), &PayrollRules::default());

        assert!(report.sessions.is_empty());
        assert_eq!(report.diagnostics.len(), 2);
        assert!(report.diagnostics.iter().all(|d| !d.priced));
    }

    #[test]
    fn active_and_cancelled_sessions_are_skipped_silently() {
        let mut active = session(9, Some(12), "Dalwayne Simpson", dt(11, 8, 0));
        active.status = SessionStatus::Active;
        let mut cancelled =
            completed(10, Some(12), "Dalwayne Simpson", dt(11, 8, 0), dt(11, 16, 0), None);
        cancelled.status = SessionStatus::Cancelled;

        let report = compute_weekly_earnings(
            week_ending(),
            None,
            &[active, cancelled],
            &directory(),
            &PayrollRules::default(),
        );
        assert!(report.sessions.is_empty());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn sessions_outside_the_window_are_ignored() {
        let sessions = [
            completed(11, Some(12), "Dalwayne Simpson", dt(11, 8, 0), dt(11, 16, 0), None),
            // Monday of the following week
            completed(12, Some(12), "Dalwayne Simpson", dt(18, 8, 0), dt(18, 16, 0), None),
        ];
        let report =
            compute_weekly_earnings(week_ending(), None, &sessions, &directory(), &PayrollRules::default());
        assert_eq!(report.sessions.len(), 1);
        assert_eq!(report.sessions[0].session_id, 11);
    }

    #[test]
    fn contractor_filter_narrows_the_report() {
        let dir = ContractorDirectory::new([dalwayne(), contractor(13, "Earl Grey", 19.5, true)]);
        let sessions = [
            completed(13, Some(12), "Dalwayne Simpson", dt(11, 8, 0), dt(11, 16, 0), None),
            completed(14, Some(13), "Earl Grey", dt(11, 8, 0), dt(11, 16, 0), None),
        ];

        let report = compute_weekly_earnings(
            week_ending(),
            Some("Earl Grey"),
            &sessions,
            &dir,
            &PayrollRules::default(),
        );
        assert_eq!(report.contractors.len(), 1);
        assert_eq!(report.contractors[0].contractor, "Earl Grey");
        // 156 gross at the registered 20% rate
        assert_eq!(report.totals.gross, 156.0);
        assert_eq!(report.totals.cis_deduction, 31.2);
        assert_eq!(report.totals.net, 124.8);
    }

    #[test]
    fn legacy_rows_resolve_by_exact_name() {
        let sessions = [completed(
            15,
            None,
            "Dalwayne Simpson",
            dt(11, 8, 0),
            dt(11, 16, 0),
            None,
        )];
        let report =
            compute_weekly_earnings(week_ending(), None, &sessions, &directory(), &PayrollRules::default());
        assert_eq!(report.sessions.len(), 1);
        // resolved profile supplies the id the row was missing
        assert_eq!(report.sessions[0].contractor_id, Some(12));
    }

    #[test]
    fn zero_rate_profile_is_an_invalid_rate() {
        let dir = ContractorDirectory::new([contractor(20, "Free Labour", 0.0, false)]);
        let sessions = [completed(16, Some(20), "Free Labour", dt(11, 8, 0), dt(11, 16, 0), None)];
        let report =
            compute_weekly_earnings(week_ending(), None, &sessions, &dir, &PayrollRules::default());
        assert!(report.sessions.is_empty());
        assert!(report.diagnostics[0].problem.contains("hourly rate"));
    }

    #[test]
    fn identical_inputs_give_identical_reports() {
        let sessions = [
            completed(17, Some(12), "Dalwayne Simpson", dt(11, 7, 50), dt(11, 16, 30), None),
            completed(18, Some(12), "Dalwayne Simpson", dt(12, 8, 22), dt(12, 17, 0), None),
        ];
        let dir = directory();
        let rules = PayrollRules::default();

        let a = compute_weekly_earnings(week_ending(), None, &sessions, &dir, &rules);
        let b = compute_weekly_earnings(week_ending(), None, &sessions, &dir, &rules);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn friday_ending_weeks_bucket_differently() {
        let mut rules = PayrollRules::default();
        rules.week_policy = WeekPolicy::EndingFriday;

        // Saturday 2025-08-16 falls outside the Sat 09 .. Fri 15 pay
        // week but inside the ISO week ending Sunday the 17th
        let sessions = [completed(
            19,
            Some(12),
            "Dalwayne Simpson",
            dt(16, 8, 0),
            dt(16, 16, 0),
            None,
        )];

        let friday_week = compute_weekly_earnings(
            NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
            None,
            &sessions,
            &directory(),
            &rules,
        );
        assert!(friday_week.sessions.is_empty());

        let iso_week =
            compute_weekly_earnings(week_ending(), None, &sessions, &directory(), &PayrollRules::default());
        assert_eq!(iso_week.sessions.len(), 1);
    }
}
