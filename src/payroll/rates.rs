use crate::payroll::rules::PayrollRules;

/// Raw gross for a session, before the lateness penalty and CIS.
#[derive(Debug, Clone, Copy)]
pub struct RateOutcome {
    /// Hours that count towards pay, capped at the full-day threshold.
    pub paid_hours: f64,
    pub full_day: bool,
    pub gross: f64,
}

/// Flat-day pricing: at or past the threshold the session pays the daily
/// rate regardless of extra hours (no overtime), otherwise it is
/// pro-rated hourly.
pub fn resolve(hours_worked: f64, hourly_rate: f64, daily_rate: f64, rules: &PayrollRules) -> RateOutcome {
    let paid_hours = hours_worked.min(rules.full_day_hours);
    let full_day = hours_worked >= rules.full_day_hours;

    let gross = if full_day {
        daily_rate
    } else {
        paid_hours * hourly_rate
    };

    RateOutcome {
        paid_hours,
        full_day,
        gross,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_day_pays_flat_daily_rate() {
        let r = resolve(8.0, 18.75, 150.0, &PayrollRules::default());
        assert!(r.full_day);
        assert_eq!(r.gross, 150.0);
        assert_eq!(r.paid_hours, 8.0);
    }

    #[test]
    fn long_day_pays_no_overtime() {
        let r = resolve(10.5, 18.75, 150.0, &PayrollRules::default());
        assert!(r.full_day);
        assert_eq!(r.gross, 150.0);
        assert_eq!(r.paid_hours, 8.0);
    }

    #[test]
    fn partial_day_is_pro_rated_hourly() {
        let r = resolve(4.0, 18.75, 150.0, &PayrollRules::default());
        assert!(!r.full_day);
        assert_eq!(r.gross, 75.0);
        assert_eq!(r.paid_hours, 4.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let just_under = resolve(7.999, 20.0, 160.0, &PayrollRules::default());
        assert!(!just_under.full_day);

        let exactly = resolve(8.0, 20.0, 160.0, &PayrollRules::default());
        assert!(exactly.full_day);
        assert_eq!(exactly.gross, 160.0);
    }

    #[test]
    fn custom_threshold_is_respected() {
        let mut rules = PayrollRules::default();
        rules.full_day_hours = 7.5;
        let r = resolve(7.5, 20.0, 150.0, &rules);
        assert!(r.full_day);
        assert_eq!(r.paid_hours, 7.5);
    }
}
