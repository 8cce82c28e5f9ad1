use chrono::NaiveTime;

use crate::payroll::rules::PayrollRules;

#[derive(Debug, Clone, Copy)]
pub struct PenaltyOutcome {
    /// Gross after the deduction, never below the daily floor.
    pub gross: f64,
    /// Effective amount taken off the daily rate.
    pub penalty: f64,
}

/// Lateness deduction for full-day sessions.
///
/// Applies only when `full_day` is set: a partial day is already paid
/// by the hour and is never penalized, whatever its start time. The
/// deduction is capped, and the result is floored at the minimum
/// guaranteed daily pay so a late full day cannot pay near zero.
pub fn apply(start: NaiveTime, gross: f64, full_day: bool, rules: &PayrollRules) -> PenaltyOutcome {
    if !full_day || start <= rules.late_cutoff {
        return PenaltyOutcome { gross, penalty: 0.0 };
    }

    let minutes_late = (start - rules.late_cutoff).num_minutes().max(0) as f64;
    let deduction = (minutes_late * rules.late_penalty_per_minute).min(rules.late_penalty_cap);
    let adjusted = (gross - deduction).max(rules.min_daily_pay);

    PenaltyOutcome {
        gross: adjusted,
        penalty: gross - adjusted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn on_time_start_is_untouched() {
        let p = apply(at(7, 44), 150.0, true, &PayrollRules::default());
        assert_eq!(p.gross, 150.0);
        assert_eq!(p.penalty, 0.0);
    }

    #[test]
    fn cutoff_itself_is_not_late() {
        let p = apply(at(8, 15), 150.0, true, &PayrollRules::default());
        assert_eq!(p.gross, 150.0);
        assert_eq!(p.penalty, 0.0);
    }

    #[test]
    fn fifteen_minutes_late_costs_seven_fifty() {
        let p = apply(at(8, 30), 150.0, true, &PayrollRules::default());
        assert_eq!(p.penalty, 7.5);
        assert_eq!(p.gross, 142.5);
    }

    #[test]
    fn extreme_lateness_is_capped() {
        // 200 minutes late: raw deduction 100, capped at 50
        let p = apply(at(11, 35), 150.0, true, &PayrollRules::default());
        assert_eq!(p.penalty, 50.0);
        assert_eq!(p.gross, 100.0);
    }

    #[test]
    fn floor_holds_when_cap_still_undercuts_it() {
        // daily rate 120: capped deduction of 50 would leave 70, floor wins
        let p = apply(at(11, 35), 120.0, true, &PayrollRules::default());
        assert_eq!(p.gross, 100.0);
        assert_eq!(p.penalty, 20.0);
    }

    #[test]
    fn partial_days_are_never_penalized() {
        let p = apply(at(11, 0), 75.0, false, &PayrollRules::default());
        assert_eq!(p.gross, 75.0);
        assert_eq!(p.penalty, 0.0);
    }
}
