//! Netlist tables.

use std::collections::BTreeMap;

use super::ids::{NodeId, PinId, SpliceId, TestPointId};

/// A named test point on a connector.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub id: TestPointId,
    /// Fixture group name followed by the record suffix, e.g. `J1-3`
    pub name: String,
}

/// A wire junction.
#[derive(Debug, Clone, PartialEq)]
pub struct Splice {
    pub id: SpliceId,
    pub name: String,
}

/// Kinds of passive component the netlist can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Resistor,
    Diode,
    Capacitor,
}

impl ComponentKind {
    /// Parse the single-letter kind code used in component records.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "r" => Some(Self::Resistor),
            "d" => Some(Self::Diode),
            "c" => Some(Self::Capacitor),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Resistor => "resistor",
            Self::Diode => "diode",
            Self::Capacitor => "capacitor",
        }
    }
}

/// A two-terminal component, keyed by its input pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Input (even) pin; the output pin is `pin.sibling()`
    pub pin: PinId,
    pub name: String,
    pub kind: ComponentKind,
    /// Ohms for resistors, 0 otherwise
    pub value: f64,
    pub tolerance_percent: i32,
}

/// An undirected wire between two netlist nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub a: NodeId,
    pub b: NodeId,
    pub name: String,
    pub color: u32,
}

impl Connection {
    /// The far end of this wire as seen from `node`, if `node` is one of its
    /// ends. End `a` is checked first.
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.a == node {
            Some(self.b)
        } else if self.b == node {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A symmetric resistance window `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub min: f64,
    pub max: f64,
}

impl Window {
    /// Window `[-half_width, +half_width]`.
    pub fn symmetric(half_width: f64) -> Self {
        Self {
            min: -half_width,
            max: half_width,
        }
    }

    /// Exclusive containment, as used for continuity.
    pub fn contains(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }
}

impl Default for Window {
    fn default() -> Self {
        Self { min: 0.0, max: 0.0 }
    }
}

/// Limits read from the `Cont` and `Short` elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestLimits {
    pub continuity: Option<Window>,
    pub short: Option<Window>,
}

impl TestLimits {
    /// The continuity window, or the empty `[0, 0]` window when unset.
    pub fn continuity_window(&self) -> Window {
        self.continuity.unwrap_or_default()
    }
}

/// The complete, immutable netlist of one harness.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    pub fixtures: BTreeMap<TestPointId, Fixture>,
    pub splices: BTreeMap<SpliceId, Splice>,
    /// Keyed by input pin
    pub components: BTreeMap<PinId, Component>,
    /// Document order
    pub connections: Vec<Connection>,
    pub limits: TestLimits,
}

impl Netlist {
    /// Create an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixture(&self, id: TestPointId) -> Option<&Fixture> {
        self.fixtures.get(&id)
    }

    pub fn has_splice(&self, id: SpliceId) -> bool {
        self.splices.contains_key(&id)
    }

    /// The component owning `pin`, looked up by its input pin.
    pub fn component_for(&self, pin: PinId) -> Option<&Component> {
        self.components.get(&pin.input())
    }

    /// Human-readable label for a test point: fixture name if any.
    pub fn point_label(&self, id: TestPointId) -> String {
        match self.fixture(id) {
            Some(fixture) => fixture.name.clone(),
            None => format!("TP{}", id),
        }
    }
}
