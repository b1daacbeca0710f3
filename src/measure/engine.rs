//! Pairwise sweep over the switch matrix.

use tracing::{debug, info, warn};

use super::cache::MeasurementCache;
use super::classify::{classify, self_test_passes, Verdict};
use super::Calibration;
use crate::error::Result;
use crate::hardware::{Domain, MatrixProbe, RawReading};
use crate::netlist::{TestLimits, TestPointId};
use crate::topology::{Relation, RelationTable};

/// One measured pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    pub from: TestPointId,
    pub to: TestPointId,
    pub expected: Option<Relation>,
    pub reading: RawReading,
    pub resistance: f64,
    pub verdict: Verdict,
    /// Reading copied from the reverse pair instead of measured
    pub reused: bool,
}

/// Outcome of a full sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Points swept, ascending
    pub points: Vec<TestPointId>,
    /// In sweep order
    pub results: Vec<PairResult>,
    /// Hardware samples taken
    pub round_trips: usize,
    /// Readings served from the cache
    pub reused: usize,
}

impl SweepReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.verdict.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn result(&self, from: TestPointId, to: TestPointId) -> Option<&PairResult> {
        self.results.iter().find(|r| r.from == from && r.to == to)
    }
}

/// One self-test cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfTestRow {
    pub a: TestPointId,
    pub b: TestPointId,
    pub reading: RawReading,
    pub verdict: Verdict,
}

/// Matrix self-test outcome.
#[derive(Debug, Clone, Default)]
pub struct SelfTestReport {
    pub points: u32,
    pub rows: Vec<SelfTestRow>,
}

impl SelfTestReport {
    pub fn failures(&self) -> impl Iterator<Item = &SelfTestRow> {
        self.rows.iter().filter(|r| !r.verdict.is_pass())
    }

    pub fn all_passed(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Drives a [`MatrixProbe`] and classifies what it reads.
#[derive(Debug)]
pub struct MeasurementEngine<P> {
    probe: P,
    calibration: Calibration,
    cache: MeasurementCache,
    round_trips: usize,
}

impl<P: MatrixProbe> MeasurementEngine<P> {
    pub fn new(probe: P, calibration: Calibration) -> Self {
        Self {
            probe,
            calibration,
            cache: MeasurementCache::new(),
            round_trips: 0,
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn into_probe(self) -> P {
        self.probe
    }

    pub fn cache(&self) -> &MeasurementCache {
        &self.cache
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Samples taken since the engine was created.
    pub fn round_trips(&self) -> usize {
        self.round_trips
    }

    /// Select a pair, sample it and cache the raw reading.
    pub fn measure(&mut self, from: TestPointId, to: TestPointId) -> Result<RawReading> {
        self.probe.select(Domain::A, from)?;
        self.sample_against(from, to)
    }

    /// Domain A must already hold `from`.
    fn sample_against(&mut self, from: TestPointId, to: TestPointId) -> Result<RawReading> {
        self.probe.select(Domain::B, to)?;
        let reading = self.probe.sample()?;
        self.round_trips += 1;
        self.cache.insert(from, to, reading);
        debug!(%from, %to, adc0 = reading.adc0, adc2 = reading.adc2, "sampled");
        Ok(reading)
    }

    /// Measure and classify every ordered pair of distinct points named by
    /// the table.
    ///
    /// A pair whose expected relation is symmetric (or absent) reuses the
    /// reverse pair's reading when one is cached. Diode and open pairs are
    /// always measured.
    pub fn sweep(&mut self, table: &RelationTable, limits: &TestLimits) -> Result<SweepReport> {
        self.cache.clear();
        let points: Vec<TestPointId> = table.points().into_iter().collect();
        let mut report = SweepReport {
            points: points.clone(),
            ..SweepReport::default()
        };
        info!(points = points.len(), "sweep started");

        for &from in &points {
            self.probe.select(Domain::A, from)?;
            for &to in &points {
                if from == to {
                    continue;
                }
                let expected = table.get(from, to);
                let reusable = expected.map_or(true, |r| r.is_symmetric());
                let cached = if reusable { self.cache.get(to, from) } else { None };

                let (reading, reused) = match cached {
                    Some(reading) => {
                        self.cache.insert(from, to, reading);
                        report.reused += 1;
                        (reading, true)
                    }
                    None => {
                        report.round_trips += 1;
                        (self.sample_against(from, to)?, false)
                    }
                };

                let resistance = self.calibration.resistance(reading);
                let verdict = classify(expected, resistance, limits);
                match verdict {
                    Verdict::Pass => debug!(%from, %to, resistance, "pass"),
                    Verdict::Fail => warn!(%from, %to, resistance, expected = ?expected, "fail"),
                }
                report.results.push(PairResult {
                    from,
                    to,
                    expected,
                    reading,
                    resistance,
                    verdict,
                    reused,
                });
            }
        }

        info!(
            pairs = report.results.len(),
            passed = report.passed(),
            failed = report.failed(),
            round_trips = report.round_trips,
            reused = report.reused,
            "sweep finished"
        );
        Ok(report)
    }

    /// Sweep the upper triangle `0 <= a <= b < points` with nothing attached.
    ///
    /// The diagonal selects the same node on both domains and must conduct;
    /// every other cell must read open.
    pub fn self_test(&mut self, points: u32) -> Result<SelfTestReport> {
        info!(points, "self-test started");
        let mut report = SelfTestReport {
            points,
            rows: Vec::new(),
        };
        for a in 0..points {
            self.probe.select(Domain::A, TestPointId(a))?;
            for b in a..points {
                let reading = self.sample_against(TestPointId(a), TestPointId(b))?;
                let verdict = Verdict::from_bool(self_test_passes(a == b, reading));
                if !verdict.is_pass() {
                    warn!(a, b, adc0 = reading.adc0, adc2 = reading.adc2, "self-test cell failed");
                }
                report.rows.push(SelfTestRow {
                    a: TestPointId(a),
                    b: TestPointId(b),
                    reading,
                    verdict,
                });
            }
        }
        info!(cells = report.rows.len(), failed = report.failures().count(), "self-test finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;
    use crate::hardware::SimulatedHarness;
    use crate::measure::MAX_RESIST;
    use crate::netlist::{parse_str, Window};
    use crate::topology::{build_relations, Resolver};
    use approx::assert_relative_eq;

    fn tp(id: u32) -> TestPointId {
        TestPointId(id)
    }

    fn table(groupinfo: &str) -> RelationTable {
        let doc = format!(
            "<N>\
             <Fixture name=\"J\">0,A\r\n5,B\r\n</Fixture>\
             <Components>81920,d,D1,26,-1,90,0\r\n81922,r,R1,10,1,5,o\r\n</Components>\
             <GroupInfo>{groupinfo}</GroupInfo></N>"
        );
        let netlist = parse_str(&doc).unwrap();
        build_relations(Resolver::new(&netlist)).unwrap()
    }

    fn limits() -> TestLimits {
        TestLimits {
            continuity: Some(Window::symmetric(2.0)),
            short: None,
        }
    }

    #[test]
    fn test_resistor_end_to_end() {
        let table = table("0,81922,W1,0\r\n81923,5,W2,0\r\n");
        assert_eq!(table.get(tp(0), tp(5)), Some(Relation::Resistor(100.0)));

        let harness = SimulatedHarness::new(Calibration::default()).with_symmetric(tp(0), tp(5), 98.0);
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        let report = engine.sweep(&table, &limits()).unwrap();

        let forward = report.result(tp(0), tp(5)).unwrap();
        assert_relative_eq!(forward.resistance, 98.0, epsilon = 1e-9);
        assert_eq!(forward.verdict, Verdict::Pass);
        assert!(report.all_passed());
    }

    #[test]
    fn test_symmetric_pair_reuses_reading() {
        let table = table("0,5,W1,0\r\n");
        let harness = SimulatedHarness::new(Calibration::default()).with_symmetric(tp(0), tp(5), 0.0);
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        let report = engine.sweep(&table, &limits()).unwrap();

        assert_eq!(report.round_trips, 1);
        assert_eq!(report.reused, 1);
        assert_eq!(engine.probe().round_trips(), 1);
        let forward = report.result(tp(0), tp(5)).unwrap();
        let reverse = report.result(tp(5), tp(0)).unwrap();
        assert!(reverse.reused);
        assert_eq!(forward.reading, reverse.reading);
        assert_eq!(engine.cache().get(tp(5), tp(0)), Some(forward.reading));
    }

    #[test]
    fn test_diode_pairs_are_measured_both_ways() {
        let table = table("0,81920,W1,0\r\n81921,5,W2,0\r\n");
        let harness = SimulatedHarness::new(Calibration::default()).with_resistance(tp(0), tp(5), 700.0);
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        let report = engine.sweep(&table, &limits()).unwrap();

        assert_eq!(report.round_trips, 2);
        assert_eq!(report.reused, 0);
        assert_eq!(report.result(tp(0), tp(5)).unwrap().verdict, Verdict::Pass);
        let reverse = report.result(tp(5), tp(0)).unwrap();
        assert_eq!(reverse.resistance, MAX_RESIST);
        assert_eq!(reverse.verdict, Verdict::Pass);
    }

    #[test]
    fn test_broken_wire_fails() {
        let table = table("0,5,W1,0\r\n");
        let harness = SimulatedHarness::new(Calibration::default());
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        let report = engine.sweep(&table, &limits()).unwrap();
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn test_measure_caches_reading() {
        let harness = SimulatedHarness::new(Calibration::default()).with_symmetric(tp(1), tp(2), 50.0);
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        let reading = engine.measure(tp(1), tp(2)).unwrap();
        assert_eq!(engine.cache().get(tp(1), tp(2)), Some(reading));
        assert_eq!(engine.round_trips(), 1);
    }

    #[test]
    fn test_self_test_on_idle_matrix() {
        let harness = SimulatedHarness::new(Calibration::default());
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        let report = engine.self_test(8).unwrap();
        assert_eq!(report.rows.len(), 8 * 9 / 2);
        assert!(report.all_passed());
    }

    #[test]
    fn test_self_test_flags_leaking_cell() {
        let harness = SimulatedHarness::new(Calibration::default()).with_resistance(tp(1), tp(3), 10.0);
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        let report = engine.self_test(4).unwrap();
        let failed: Vec<_> = report.failures().map(|r| (r.a, r.b)).collect();
        assert_eq!(failed, vec![(tp(1), tp(3))]);
    }

    #[test]
    fn test_probe_errors_abort_the_sweep() {
        let table = table("0,5,W1,0\r\n");
        let harness = SimulatedHarness::new(Calibration::default()).with_failure_after(0);
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        assert!(matches!(engine.sweep(&table, &limits()), Err(HarnessError::Adc { .. })));
    }
}
