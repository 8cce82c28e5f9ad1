use crate::model::work_session::WorkSession;
use crate::payroll::PricingError;
use crate::payroll::rules::{HoursSource, PayrollRules};

/// Hours worked for one completed session, plus the size of the gap
/// between the recorded total and the timestamp delta when the two
/// disagree beyond tolerance.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedHours {
    pub hours: f64,
    pub recorded_delta_gap: Option<f64>,
}

/// Resolves a single hours-worked figure for a session.
///
/// The recorded `total_hours` (written once at clock-out) is the source
/// of truth under `HoursSource::RecordedThenDelta`; the timestamp delta
/// is only a fallback. The delta is a real datetime subtraction, so
/// sessions spanning midnight come out right.
pub fn normalize(session: &WorkSession, rules: &PayrollRules) -> Result<NormalizedHours, PricingError> {
    let end = session.end_time.ok_or_else(|| PricingError::InvalidSession {
        session_id: session.id,
        reason: "completed session has no end time".into(),
    })?;

    if end < session.start_time {
        return Err(PricingError::InvalidSession {
            session_id: session.id,
            reason: "end time precedes start time".into(),
        });
    }

    let delta_hours = (end - session.start_time).num_seconds() as f64 / 3600.0;

    let recorded = match session.total_hours {
        Some(r) if !r.is_finite() || r < 0.0 => {
            return Err(PricingError::InvalidSession {
                session_id: session.id,
                reason: format!("recorded total_hours is not a valid duration: {r}"),
            });
        }
        other => other,
    };

    match (rules.hours_source, recorded) {
        (HoursSource::RecordedThenDelta, Some(recorded)) => {
            let gap = (recorded - delta_hours).abs();
            Ok(NormalizedHours {
                hours: recorded,
                recorded_delta_gap: (gap > rules.recorded_hours_tolerance).then_some(gap),
            })
        }
        _ => Ok(NormalizedHours {
            hours: delta_hours,
            recorded_delta_gap: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::work_session::SessionStatus;
    use chrono::NaiveDate;

    fn session(start: (u32, u32), end: Option<(u32, u32)>, total_hours: Option<f64>) -> WorkSession {
        let day = NaiveDate::from_ymd_opt(2025, 8, 11).unwrap();
        WorkSession {
            id: 1,
            contractor_id: Some(12),
            contractor_name: "Dalwayne Simpson".into(),
            site_location: "ME5 9GX".into(),
            start_time: day.and_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: end.map(|(h, m)| day.and_hms_opt(h, m, 0).unwrap()),
            total_hours,
            status: SessionStatus::Completed,
            start_latitude: None,
            start_longitude: None,
            end_latitude: None,
            end_longitude: None,
        }
    }

    #[test]
    fn recorded_hours_win_over_timestamps() {
        let s = session((7, 44), Some((17, 0)), Some(8.27));
        let n = normalize(&s, &PayrollRules::default()).unwrap();
        assert_eq!(n.hours, 8.27);
        // 07:44-17:00 is 9.27h on the clock; the stored figure already
        // nets out the lunch break, so the gap is flagged, not fatal.
        assert!(n.recorded_delta_gap.is_some());
    }

    #[test]
    fn falls_back_to_timestamp_delta() {
        let s = session((8, 0), Some((16, 30)), None);
        let n = normalize(&s, &PayrollRules::default()).unwrap();
        assert!((n.hours - 8.5).abs() < 1e-9);
        assert!(n.recorded_delta_gap.is_none());
    }

    #[test]
    fn delta_only_ignores_recorded_figure() {
        let mut rules = PayrollRules::default();
        rules.hours_source = HoursSource::DeltaOnly;
        let s = session((8, 0), Some((12, 0)), Some(8.0));
        let n = normalize(&s, &rules).unwrap();
        assert!((n.hours - 4.0).abs() < 1e-9);
        assert!(n.recorded_delta_gap.is_none());
    }

    #[test]
    fn agreement_within_tolerance_is_clean() {
        let s = session((8, 0), Some((16, 1)), Some(8.0));
        let n = normalize(&s, &PayrollRules::default()).unwrap();
        assert_eq!(n.hours, 8.0);
        assert!(n.recorded_delta_gap.is_none());
    }

    #[test]
    fn end_before_start_is_rejected_not_negative() {
        let s = session((17, 0), Some((8, 0)), None);
        let err = normalize(&s, &PayrollRules::default()).unwrap_err();
        assert!(matches!(err, PricingError::InvalidSession { .. }));
    }

    #[test]
    fn missing_end_is_rejected() {
        let s = session((8, 0), None, None);
        let err = normalize(&s, &PayrollRules::default()).unwrap_err();
        assert!(matches!(err, PricingError::InvalidSession { .. }));
    }

    #[test]
    fn night_shift_spans_midnight() {
        let day = NaiveDate::from_ymd_opt(2025, 8, 11).unwrap();
        let mut s = session((22, 0), None, None);
        s.end_time = Some(day.succ_opt().unwrap().and_hms_opt(6, 0, 0).unwrap());
        let n = normalize(&s, &PayrollRules::default()).unwrap();
        assert!((n.hours - 8.0).abs() < 1e-9);
    }
}
