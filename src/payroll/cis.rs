use crate::payroll::rules::PayrollRules;

/// Round to whole pennies, half away from zero.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy)]
pub struct CisOutcome {
    /// Gross rounded to pennies; this is the figure the payslip shows.
    pub gross: f64,
    pub deduction: f64,
    pub net: f64,
}

/// Construction Industry Scheme withholding.
///
/// Rounding happens here, per session, so that weekly totals are sums
/// of already-rounded pennies and deduction + net always reassembles
/// the gross exactly.
pub fn withhold(gross: f64, cis_registered: bool, rules: &PayrollRules) -> CisOutcome {
    let gross = round_currency(gross);
    let deduction = round_currency(gross * rules.cis_rate(cis_registered));
    let net = round_currency(gross - deduction);

    CisOutcome { gross, deduction, net }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_withholds_thirty_percent() {
        let c = withhold(150.0, false, &PayrollRules::default());
        assert_eq!(c.deduction, 45.0);
        assert_eq!(c.net, 105.0);
    }

    #[test]
    fn registered_withholds_twenty_percent() {
        let c = withhold(156.0, true, &PayrollRules::default());
        assert_eq!(c.deduction, 31.2);
        assert_eq!(c.net, 124.8);
    }

    #[test]
    fn no_penny_leaks_on_awkward_grosses() {
        for gross in [142.5, 75.0, 99.99, 0.01, 133.33] {
            for registered in [true, false] {
                let c = withhold(gross, registered, &PayrollRules::default());
                assert_eq!(
                    round_currency(c.deduction + c.net),
                    c.gross,
                    "gross {gross} registered {registered}"
                );
            }
        }
    }

    #[test]
    fn sub_penny_gross_is_normalized_first() {
        let c = withhold(74.999999999, false, &PayrollRules::default());
        assert_eq!(c.gross, 75.0);
        assert_eq!(c.deduction, 22.5);
        assert_eq!(c.net, 52.5);
    }

    #[test]
    fn half_penny_rounds_up() {
        // 10.125 is exact in binary, so this really exercises the half case
        assert_eq!(round_currency(10.125), 10.13);
        assert_eq!(round_currency(10.004), 10.0);
        assert_eq!(round_currency(10.006), 10.01);
    }
}
