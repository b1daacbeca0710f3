//! Text report for stdout.
//!
//! Each section is a [`fmt::Display`] wrapper so the binary decides where it
//! goes; logs stay on stderr.

use std::fmt;

use crate::measure::{PairResult, SelfTestReport, SweepReport, MAX_RESIST};
use crate::netlist::{ComponentKind, Netlist, TestPointId};
use crate::topology::{RelationTable, Resolver};

const RULE_WIDTH: usize = 60;

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "\n{}", title)?;
    writeln!(f, "{}", "─".repeat(RULE_WIDTH))
}

fn ohms(value: f64) -> String {
    if value >= MAX_RESIST {
        "open".to_string()
    } else {
        format!("{:.1}Ω", value)
    }
}

/// Loaded tables, with each connection end resolved to a test point.
pub struct NetlistSummary<'a> {
    resolver: Resolver<'a>,
}

impl<'a> NetlistSummary<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        Self { resolver }
    }
}

impl fmt::Display for NetlistSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let netlist = self.resolver.netlist();

        heading(f, &format!("Fixtures ({})", netlist.fixtures.len()))?;
        for fixture in netlist.fixtures.values() {
            writeln!(f, "  {:>4}  {}", fixture.id.0, fixture.name)?;
        }

        heading(f, &format!("Splices ({})", netlist.splices.len()))?;
        for splice in netlist.splices.values() {
            writeln!(f, "  {:>6}  {}", splice.id.to_string(), splice.name)?;
        }

        heading(f, &format!("Components ({})", netlist.components.len()))?;
        for c in netlist.components.values() {
            write!(f, "  {:>6}  {:<10} {:<9}", c.pin.0, c.name, c.kind.label())?;
            if c.kind == ComponentKind::Resistor {
                write!(f, " {} ±{}%", ohms(c.value), c.tolerance_percent)?;
            }
            writeln!(f)?;
        }

        heading(f, &format!("Connections ({})", netlist.connections.len()))?;
        for conn in &netlist.connections {
            let end = |node| match self.resolver.resolve(node) {
                Ok(tp) => netlist.point_label(tp),
                Err(_) => "?".to_string(),
            };
            writeln!(
                f,
                "  {:>8} <-> {:<8} {:<12} color={}  [{} <-> {}]",
                conn.a.to_string(),
                conn.b.to_string(),
                conn.name,
                conn.color,
                end(conn.a),
                end(conn.b)
            )?;
        }

        let limits = &netlist.limits;
        heading(f, "Limits")?;
        match limits.continuity {
            Some(w) => writeln!(f, "  continuity  {:.3} .. {:.3}", w.min, w.max)?,
            None => writeln!(f, "  continuity  not set")?,
        }
        match limits.short {
            Some(w) => writeln!(f, "  short       {:.3} .. {:.3}", w.min, w.max),
            None => writeln!(f, "  short       not set"),
        }
    }
}

/// Expected relation table and the points each domain will visit.
pub struct RelationListing<'a> {
    table: &'a RelationTable,
    netlist: &'a Netlist,
}

impl<'a> RelationListing<'a> {
    pub fn new(table: &'a RelationTable, netlist: &'a Netlist) -> Self {
        Self { table, netlist }
    }
}

impl fmt::Display for RelationListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, &format!("Expected relations ({})", self.table.len()))?;
        for (from, to, relation) in self.table.iter() {
            writeln!(
                f,
                "  {:<12} -> {:<12} {}",
                self.netlist.point_label(from),
                self.netlist.point_label(to),
                relation
            )?;
        }

        let points: Vec<String> = self.table.points().into_iter().map(|p| p.to_string()).collect();
        heading(f, &format!("Test points ({})", points.len()))?;
        writeln!(f, "  {}", points.join(" "))
    }
}

/// Per-pair sweep results and totals.
pub struct SweepListing<'a> {
    report: &'a SweepReport,
    netlist: &'a Netlist,
}

impl<'a> SweepListing<'a> {
    pub fn new(report: &'a SweepReport, netlist: &'a Netlist) -> Self {
        Self { report, netlist }
    }

    fn label(&self, point: TestPointId) -> String {
        self.netlist.point_label(point)
    }

    fn row(&self, f: &mut fmt::Formatter<'_>, r: &PairResult) -> fmt::Result {
        let expected = match r.expected {
            Some(relation) => relation.to_string(),
            None => "none".to_string(),
        };
        writeln!(
            f,
            "  {:<12} -> {:<12} expected={:<10} adc0={:>7.1} adc2={:>7.1} R={:<10} {}{}",
            self.label(r.from),
            self.label(r.to),
            expected,
            r.reading.adc0,
            r.reading.adc2,
            ohms(r.resistance),
            r.verdict,
            if r.reused { " (reused)" } else { "" }
        )
    }
}

impl fmt::Display for SweepListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, &format!("Measurements ({})", self.report.results.len()))?;
        for r in &self.report.results {
            self.row(f, r)?;
        }

        heading(f, "Summary")?;
        writeln!(f, "  Pairs:          {}", self.report.results.len())?;
        writeln!(f, "  Passed:         {}", self.report.passed())?;
        writeln!(f, "  Failed:         {}", self.report.failed())?;
        writeln!(f, "  Hardware reads: {}", self.report.round_trips)?;
        writeln!(f, "  Reused:         {}", self.report.reused)?;
        writeln!(f, "  Result:         {}", if self.report.all_passed() { "PASS" } else { "FAIL" })
    }
}

/// Self-test failures and totals.
pub struct SelfTestListing<'a> {
    report: &'a SelfTestReport,
}

impl<'a> SelfTestListing<'a> {
    pub fn new(report: &'a SelfTestReport) -> Self {
        Self { report }
    }
}

impl fmt::Display for SelfTestListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failures: Vec<_> = self.report.failures().collect();
        heading(f, &format!("Self-test ({} points)", self.report.points))?;
        for row in &failures {
            let expect = if row.a == row.b { "short" } else { "open" };
            writeln!(
                f,
                "  {:>4} x {:<4} expected {:<5} adc0={:>7.1} adc2={:>7.1} FAIL",
                row.a.0, row.b.0, expect, row.reading.adc0, row.reading.adc2
            )?;
        }
        writeln!(f, "  Cells:  {}", self.report.rows.len())?;
        writeln!(f, "  Failed: {}", failures.len())?;
        writeln!(f, "  Result: {}", if failures.is_empty() { "PASS" } else { "FAIL" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimulatedHarness;
    use crate::measure::{Calibration, MeasurementEngine};
    use crate::netlist::parse_str;
    use crate::topology::build_relations;

    const DOC: &str = "<N>\
        <Fixture name=\"J1-\">0,A\r\n5,B\r\n</Fixture>\
        <Components>81922,r,R1,10,1,5,o\r\n</Components>\
        <GroupInfo>0,81922,W1,0\r\n81923,5,W2,0\r\n</GroupInfo>\
        <Cont opts=\"eo\" val=\"2\"/></N>";

    #[test]
    fn test_netlist_summary_resolves_pins() {
        let netlist = parse_str(DOC).unwrap();
        let text = NetlistSummary::new(Resolver::new(&netlist)).to_string();
        assert!(text.contains("Fixtures (2)"));
        assert!(text.contains("J1-A"));
        assert!(text.contains("[J1-A <-> J1-A]"));
        assert!(text.contains("[J1-B <-> J1-B]"));
        assert!(text.contains("continuity  -2.000 .. 2.000"));
    }

    #[test]
    fn test_sweep_listing() {
        let netlist = parse_str(DOC).unwrap();
        let table = build_relations(Resolver::new(&netlist)).unwrap();
        let listing = RelationListing::new(&table, &netlist).to_string();
        assert!(listing.contains("100.0Ω"));
        assert!(listing.contains("0 5"));

        let harness = SimulatedHarness::from_relations(&table, &netlist.limits, Calibration::default());
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        let report = engine.sweep(&table, &netlist.limits).unwrap();
        let text = SweepListing::new(&report, &netlist).to_string();
        assert!(text.contains("J1-A         -> J1-B"));
        assert!(text.contains("(reused)"));
        assert!(text.contains("Result:         PASS"));
    }

    #[test]
    fn test_self_test_listing_shows_failures_only() {
        let harness = SimulatedHarness::default().with_resistance(TestPointId(0), TestPointId(1), 5.0);
        let mut engine = MeasurementEngine::new(harness, Calibration::default());
        let report = engine.self_test(3).unwrap();
        let text = SelfTestListing::new(&report).to_string();
        assert!(text.contains("0 x 1"));
        assert!(!text.contains("1 x 2"));
        assert!(text.contains("Failed: 1"));
    }
}
