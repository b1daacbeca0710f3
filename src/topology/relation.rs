//! Expected relations between test points.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::netlist::TestPointId;

/// What the harness should show between two test points.
///
/// A pair missing from the [`RelationTable`] has no expected relation and is
/// tested as open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Relation {
    /// Continuity (0 Ω)
    Direct,
    /// Forward-biased diode
    Diode,
    /// Explicitly open, e.g. a reverse-biased diode
    Open,
    /// Resistor of the given ohms
    Resistor(f64),
}

impl Relation {
    /// Whether the relation reads the same in both directions.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Relation::Direct | Relation::Resistor(_))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Direct => write!(f, "direct"),
            Relation::Diode => write!(f, "diode"),
            Relation::Open => write!(f, "open"),
            Relation::Resistor(ohms) => write!(f, "{:.1}Ω", ohms),
        }
    }
}

/// Result of writing one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellWrite {
    Inserted,
    /// Same value already present
    Duplicate,
    /// A different value was already present and was kept
    Conflict(Relation),
}

/// Sparse table of expected relations, keyed by ordered test point pair.
#[derive(Debug, Clone, Default)]
pub struct RelationTable {
    cells: BTreeMap<(TestPointId, TestPointId), Relation>,
}

impl RelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, from: TestPointId, to: TestPointId) -> Option<Relation> {
        self.cells.get(&(from, to)).copied()
    }

    /// Write one directed cell. The first value written wins.
    pub fn write(&mut self, from: TestPointId, to: TestPointId, relation: Relation) -> CellWrite {
        match self.cells.get(&(from, to)) {
            None => {
                self.cells.insert((from, to), relation);
                CellWrite::Inserted
            }
            Some(existing) if *existing == relation => CellWrite::Duplicate,
            Some(existing) => CellWrite::Conflict(*existing),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in `(from, to)` order.
    pub fn iter(&self) -> impl Iterator<Item = (TestPointId, TestPointId, Relation)> + '_ {
        self.cells.iter().map(|(&(from, to), &rel)| (from, to, rel))
    }

    /// Every test point that appears in any cell.
    pub fn points(&self) -> BTreeSet<TestPointId> {
        self.cells.keys().flat_map(|&(from, to)| [from, to]).collect()
    }
}
