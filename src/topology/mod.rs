//! Topology resolution and the expected-relation table.
//!
//! The netlist only states wires. This module works out what an ohmmeter
//! between any two test points should read:
//!
//! - test point to test point: [`Relation::Direct`]
//! - test points sharing a splice or a component pin: [`Relation::Direct`]
//! - test points across a resistor: [`Relation::Resistor`], both directions
//! - test points across a diode: [`Relation::Diode`] anode to cathode,
//!   [`Relation::Open`] cathode to anode

mod builder;
mod relation;
mod resolver;

pub use builder::{build_relations, RelationBuilder};
pub use relation::{CellWrite, Relation, RelationTable};
pub use resolver::{FanoutPolicy, Resolver};
