//! Pass/fail rules.

use std::fmt;

use super::MAX_RESIST;
use crate::hardware::RawReading;
use crate::netlist::TestLimits;
use crate::topology::Relation;

/// Outcome for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn from_bool(pass: bool) -> Self {
        if pass {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// Compare a measured resistance against the expected relation.
pub fn classify(expected: Option<Relation>, resistance: f64, limits: &TestLimits) -> Verdict {
    let pass = match expected {
        None | Some(Relation::Open) => resistance == MAX_RESIST,
        Some(Relation::Diode) => resistance > 0.0 && resistance < MAX_RESIST,
        Some(Relation::Direct) => limits.continuity_window().contains(resistance),
        Some(Relation::Resistor(value)) => resistor_passes(value, resistance),
    };
    Verdict::from_bool(pass)
}

/// Tiered tolerance check for a resistor of nominal `value` ohms.
pub fn resistor_passes(value: f64, measured: f64) -> bool {
    let (low, high) = if value < 100.0 {
        (value - 5.0, value + 5.0)
    } else if value < 10_000.0 {
        (value * 0.95, value * 1.05)
    } else if value < 50_000.0 {
        (value * 0.9, value * 1.1)
    } else {
        return false;
    };
    measured > low && measured < high
}

/// Self-test rule: the diagonal is a shorted path, everything else open.
///
/// Selecting the same point on both domains closes the divider, so a
/// reference reading of zero on the diagonal fails. Off the diagonal a zero
/// reference reading is the only pass. This is the reverse of a literal
/// "`i == j` requires zero" reading of the rule.
pub fn self_test_passes(same_point: bool, reading: RawReading) -> bool {
    if same_point {
        reading.adc2 != 0.0
    } else {
        reading.adc2 == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::Window;

    fn limits(half: f64) -> TestLimits {
        TestLimits {
            continuity: Some(Window::symmetric(half)),
            short: None,
        }
    }

    #[test]
    fn test_open_and_absent_need_sentinel() {
        let l = TestLimits::default();
        assert_eq!(classify(None, MAX_RESIST, &l), Verdict::Pass);
        assert_eq!(classify(Some(Relation::Open), MAX_RESIST, &l), Verdict::Pass);
        assert_eq!(classify(None, 9_999_999.0, &l), Verdict::Fail);
    }

    #[test]
    fn test_diode_bounds_are_exclusive() {
        let l = TestLimits::default();
        assert_eq!(classify(Some(Relation::Diode), 700.0, &l), Verdict::Pass);
        assert_eq!(classify(Some(Relation::Diode), 0.0, &l), Verdict::Fail);
        assert_eq!(classify(Some(Relation::Diode), MAX_RESIST, &l), Verdict::Fail);
    }

    #[test]
    fn test_direct_uses_continuity_window() {
        assert_eq!(classify(Some(Relation::Direct), 1.5, &limits(2.0)), Verdict::Pass);
        assert_eq!(classify(Some(Relation::Direct), 2.0, &limits(2.0)), Verdict::Fail);
        // No window configured
        assert_eq!(classify(Some(Relation::Direct), 0.0, &TestLimits::default()), Verdict::Fail);
    }

    #[test]
    fn test_resistor_tier_boundaries() {
        // Absolute tier
        assert!(resistor_passes(99.0, 103.9));
        assert!(!resistor_passes(99.0, 104.0));
        // 5 % tier starts at 100
        assert!(resistor_passes(100.0, 104.9));
        assert!(!resistor_passes(100.0, 105.1));
        assert!(resistor_passes(9999.0, 10_498.0));
        assert!(!resistor_passes(9999.0, 10_500.0));
        // 10 % tier starts at 10k
        assert!(resistor_passes(10_000.0, 10_900.0));
        assert!(!resistor_passes(10_000.0, 11_000.5));
        // 50k and up never pass
        assert!(!resistor_passes(50_000.0, 50_000.0));
    }

    #[test]
    fn test_zero_ohm_resistor_uses_absolute_tier() {
        assert!(resistor_passes(0.0, 0.0));
        assert!(resistor_passes(0.0, 4.9));
        assert!(!resistor_passes(0.0, 5.0));
        let limits = limits(2.0);
        assert_eq!(classify(Some(Relation::Resistor(0.0)), 0.5, &limits), Verdict::Pass);
        assert_eq!(classify(Some(Relation::Resistor(0.0)), 1.0, &limits), Verdict::Pass);
        assert_eq!(classify(Some(Relation::Resistor(0.0)), MAX_RESIST, &limits), Verdict::Fail);
    }

    #[test]
    fn test_measured_98_passes_100_ohm() {
        let verdict = classify(Some(Relation::Resistor(100.0)), 98.0, &TestLimits::default());
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn test_self_test_rule() {
        let shorted = RawReading { adc0: 1011.5, adc2: 1000.0 };
        let open = RawReading { adc0: 4095.0, adc2: 0.0 };
        assert!(self_test_passes(true, shorted));
        assert!(!self_test_passes(true, open));
        assert!(self_test_passes(false, open));
        assert!(!self_test_passes(false, shorted));
    }
}
