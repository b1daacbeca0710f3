//! Expected-relation table construction.
//!
//! Every connection is visited once, in document order. Splices merge the
//! test points around them into direct pairs; component pins pair the
//! test points on one pin with those on the sibling pin.

use tracing::{debug, error, info, warn};

use super::relation::{CellWrite, Relation, RelationTable};
use super::resolver::Resolver;
use crate::error::{HarnessError, Result};
use crate::netlist::{Component, ComponentKind, Connection, NodeId, Parity, PinId, SpliceId, TestPointId};

/// Builds a [`RelationTable`] from a netlist.
pub struct RelationBuilder<'a> {
    resolver: Resolver<'a>,
    table: RelationTable,
}

impl<'a> RelationBuilder<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        Self {
            resolver,
            table: RelationTable::new(),
        }
    }

    /// Walk every connection and return the finished table.
    pub fn build(mut self) -> Result<RelationTable> {
        let connections = &self.resolver.netlist().connections;
        for (row, conn) in connections.iter().enumerate() {
            self.connection(row, conn)?;
        }
        info!(cells = self.table.len(), points = self.table.points().len(), "expected relations built");
        Ok(self.table)
    }

    fn connection(&mut self, row: usize, conn: &Connection) -> Result<()> {
        debug!(row, a = %conn.a, b = %conn.b, name = %conn.name, "connection");
        match (conn.a, conn.b) {
            (NodeId::TestPoint(a), NodeId::TestPoint(b)) => {
                self.symmetric(a, b, Relation::Direct);
            }
            (NodeId::Splice(s), NodeId::TestPoint(t)) | (NodeId::TestPoint(t), NodeId::Splice(s)) => {
                self.splice(row, s, t)?;
            }
            (NodeId::Pin(p), NodeId::TestPoint(t)) | (NodeId::TestPoint(t), NodeId::Pin(p)) => {
                self.pin(row, p, t)?;
            }
            (a, b) => {
                return Err(HarnessError::IndirectConnection {
                    name: conn.name.clone(),
                    a,
                    b,
                })
            }
        }
        Ok(())
    }

    /// Every other test point on the splice is directly connected to `t`.
    fn splice(&mut self, row: usize, splice: SpliceId, t: TestPointId) -> Result<()> {
        self.resolver.require_splice(splice)?;
        let node = NodeId::Splice(splice);
        self.resolver.check_fanout(node)?;
        for (other_row, far) in self.resolver.incident(node, Some(row)) {
            match far {
                NodeId::TestPoint(f) if f == t => {}
                NodeId::TestPoint(f) => self.symmetric(t, f, Relation::Direct),
                other => warn!(splice = %splice, row = other_row, far = %other, "splice leads to a non test point; not propagated"),
            }
        }
        Ok(())
    }

    fn pin(&mut self, row: usize, pin: PinId, t: TestPointId) -> Result<()> {
        let component = self.resolver.component(pin)?;
        self.resolver.check_fanout(NodeId::Pin(pin))?;
        match component.kind {
            ComponentKind::Diode | ComponentKind::Resistor => {}
            ComponentKind::Capacitor => {
                error!(component = %component.name, pin = %pin, "capacitors are not supported in a connection; skipped");
                return Ok(());
            }
        }

        // Same pin, same net
        for (other_row, far) in self.resolver.incident(NodeId::Pin(pin), Some(row)) {
            match far {
                NodeId::TestPoint(f) if f == t => {}
                NodeId::TestPoint(f) => self.symmetric(t, f, Relation::Direct),
                other => warn!(pin = %pin, row = other_row, far = %other, "pin leads to a non test point; not propagated"),
            }
        }

        // Across the component
        let sibling = NodeId::Pin(pin.sibling());
        for (other_row, far) in self.resolver.incident(sibling, None) {
            let f = match far {
                NodeId::TestPoint(f) => f,
                other => {
                    warn!(pin = %pin.sibling(), row = other_row, far = %other, "pin leads to a non test point; not propagated");
                    continue;
                }
            };
            if f == t {
                warn!(component = %component.name, point = %t, "both pins land on the same test point");
                continue;
            }
            self.across(component, pin, t, f);
        }
        Ok(())
    }

    /// Relation between `near` (on `pin`) and `far` (on the sibling pin).
    fn across(&mut self, component: &Component, pin: PinId, near: TestPointId, far: TestPointId) {
        match component.kind {
            ComponentKind::Resistor => self.symmetric(near, far, Relation::Resistor(component.value)),
            ComponentKind::Diode => {
                let (anode, cathode) = match pin.parity() {
                    Parity::Input => (near, far),
                    Parity::Output => (far, near),
                };
                self.directed(anode, cathode, Relation::Diode);
                self.directed(cathode, anode, Relation::Open);
            }
            ComponentKind::Capacitor => {}
        }
    }

    fn symmetric(&mut self, a: TestPointId, b: TestPointId, relation: Relation) {
        if a == b {
            return;
        }
        self.directed(a, b, relation);
        self.directed(b, a, relation);
    }

    fn directed(&mut self, from: TestPointId, to: TestPointId, relation: Relation) {
        match self.table.write(from, to, relation) {
            CellWrite::Inserted => debug!(%from, %to, %relation, "relation"),
            CellWrite::Duplicate => debug!(%from, %to, %relation, "duplicate relation skipped"),
            CellWrite::Conflict(kept) => {
                warn!(%from, %to, %kept, rejected = %relation, "conflicting relation; keeping the first")
            }
        }
    }
}

/// Build the expected relation table for a netlist.
pub fn build_relations(resolver: Resolver<'_>) -> Result<RelationTable> {
    RelationBuilder::new(resolver).build()
}
