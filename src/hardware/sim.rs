//! Simulated harness for tests and dry runs.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::{Domain, MatrixProbe, RawReading};
use crate::error::{HarnessError, Result};
use crate::measure::{Calibration, MAX_RESIST};
use crate::netlist::{TestLimits, TestPointId};
use crate::topology::{Relation, RelationTable};

/// Forward resistance a simulated diode presents.
pub const DIODE_FORWARD_OHMS: f64 = 700.0;

/// Reference channel value for a conducting path.
const REFERENCE_COUNTS: f64 = 1000.0;

/// Full-scale numerator value for an open path.
const OPEN_COUNTS: f64 = 4095.0;

/// A [`MatrixProbe`] that reads from a table of resistances.
///
/// Pairs not in the table read open, except a point against itself, which
/// reads as a short.
#[derive(Debug, Clone)]
pub struct SimulatedHarness {
    resistances: HashMap<(TestPointId, TestPointId), f64>,
    calibration: Calibration,
    selected: [Option<TestPointId>; 2],
    round_trips: usize,
    fail_after: Option<usize>,
}

impl SimulatedHarness {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            resistances: HashMap::new(),
            calibration,
            selected: [None, None],
            round_trips: 0,
            fail_after: None,
        }
    }

    /// An ideal harness matching the expected table: direct pairs read the
    /// middle of the continuity window, diodes conduct one way, resistors
    /// read their nominal value.
    ///
    /// Without a continuity window direct pairs read 0 Ω, which the empty
    /// `[0, 0]` window rejects, so those pairs report FAIL.
    pub fn from_relations(table: &RelationTable, limits: &TestLimits, calibration: Calibration) -> Self {
        if limits.continuity.is_none() && table.iter().any(|(_, _, r)| r == Relation::Direct) {
            warn!("no continuity window set; simulated direct pairs will fail");
        }
        let window = limits.continuity_window();
        let direct = (window.min + window.max) / 2.0;
        let mut harness = Self::new(calibration);
        for (from, to, relation) in table.iter() {
            let ohms = match relation {
                Relation::Direct => direct,
                Relation::Diode => DIODE_FORWARD_OHMS,
                Relation::Open => continue,
                Relation::Resistor(value) => value,
            };
            harness.resistances.insert((from, to), ohms);
        }
        info!(pairs = harness.resistances.len(), "simulated harness built");
        harness
    }

    /// Set the resistance seen from `from` to `to` only.
    pub fn with_resistance(mut self, from: TestPointId, to: TestPointId, ohms: f64) -> Self {
        self.resistances.insert((from, to), ohms);
        self
    }

    /// Set the resistance seen in both directions.
    pub fn with_symmetric(self, a: TestPointId, b: TestPointId, ohms: f64) -> Self {
        self.with_resistance(a, b, ohms).with_resistance(b, a, ohms)
    }

    /// Fail every sample after the first `samples` succeed.
    pub fn with_failure_after(mut self, samples: usize) -> Self {
        self.fail_after = Some(samples);
        self
    }

    /// Samples taken so far.
    pub fn round_trips(&self) -> usize {
        self.round_trips
    }

    /// Raw reading the divider would produce for `ohms`.
    pub fn reading_for(&self, ohms: f64) -> RawReading {
        if !ohms.is_finite() || ohms >= MAX_RESIST {
            return RawReading {
                adc0: OPEN_COUNTS,
                adc2: 0.0,
            };
        }
        let r2 = self.calibration.reference_ohms;
        RawReading {
            adc0: REFERENCE_COUNTS * (ohms + r2 + self.calibration.path_ohms()) / r2,
            adc2: REFERENCE_COUNTS,
        }
    }
}

impl Default for SimulatedHarness {
    fn default() -> Self {
        Self::new(Calibration::default())
    }
}

impl MatrixProbe for SimulatedHarness {
    fn select(&mut self, domain: Domain, point: TestPointId) -> Result<()> {
        if point.0 >= 1 << super::DOMAIN_WIDTH {
            return Err(HarnessError::PointOutOfRange { point: point.0 });
        }
        let slot = match domain {
            Domain::A => 0,
            Domain::B => 1,
        };
        self.selected[slot] = Some(point);
        Ok(())
    }

    fn sample(&mut self) -> Result<RawReading> {
        let [Some(a), Some(b)] = self.selected else {
            return Err(HarnessError::probe_state("sampled before both domains were selected"));
        };
        if self.fail_after.is_some_and(|limit| self.round_trips >= limit) {
            return Err(HarnessError::adc("simulated", "conversion failed"));
        }
        self.round_trips += 1;

        let ohms = match self.resistances.get(&(a, b)) {
            Some(&ohms) => ohms,
            None if a == b => 0.0,
            None => MAX_RESIST,
        };
        debug!(%a, %b, ohms, "simulated sample");
        Ok(self.reading_for(ohms))
    }
}
