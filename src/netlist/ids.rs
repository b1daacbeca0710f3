//! Node identifiers.
//!
//! Netlist ids are plain integers whose range says what they are. The range
//! is decoded once, here, so the rest of the crate matches on [`NodeId`].

use std::fmt;

/// Test point ids are below this bound.
pub const TEST_POINT_LIMIT: u32 = 999;

/// First splice id.
pub const SPLICE_BASE: u32 = 65636;

/// First component pin id. Everything from here up is a pin.
pub const PIN_BASE: u32 = 81920;

/// A directly addressable switch-matrix node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestPointId(pub u32);

impl fmt::Display for TestPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A splice (wire junction) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpliceId(pub u32);

impl fmt::Display for SpliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Which side of a two-terminal component a pin is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    /// Even id
    Input,
    /// Odd id
    Output,
}

/// One terminal of a passive component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub u32);

impl PinId {
    /// Input or output, from the id's parity.
    pub fn parity(&self) -> Parity {
        if self.0 % 2 == 0 {
            Parity::Input
        } else {
            Parity::Output
        }
    }

    /// The input pin of the same component (the component's key).
    pub fn input(&self) -> PinId {
        PinId(self.0 & !1)
    }

    /// The other pin of the same component.
    pub fn sibling(&self) -> PinId {
        PinId(self.0 ^ 1)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.parity() {
            Parity::Input => "in",
            Parity::Output => "out",
        };
        write!(f, "P{}({})", self.0, side)
    }
}

/// Any node a connection can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    TestPoint(TestPointId),
    Splice(SpliceId),
    Pin(PinId),
}

impl NodeId {
    /// Decode a raw netlist id. Ids between the test point and splice
    /// ranges have no meaning and yield `None`.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            r if r < TEST_POINT_LIMIT => Some(NodeId::TestPoint(TestPointId(r))),
            r if r >= PIN_BASE => Some(NodeId::Pin(PinId(r))),
            r if r >= SPLICE_BASE => Some(NodeId::Splice(SpliceId(r))),
            _ => None,
        }
    }

    /// The raw netlist id.
    pub fn raw(&self) -> u32 {
        match self {
            NodeId::TestPoint(TestPointId(r)) | NodeId::Splice(SpliceId(r)) | NodeId::Pin(PinId(r)) => *r,
        }
    }

    pub fn as_test_point(&self) -> Option<TestPointId> {
        match self {
            NodeId::TestPoint(tp) => Some(*tp),
            _ => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::TestPoint(tp) => write!(f, "TP{}", tp),
            NodeId::Splice(s) => write!(f, "{}", s),
            NodeId::Pin(p) => write!(f, "{}", p),
        }
    }
}
