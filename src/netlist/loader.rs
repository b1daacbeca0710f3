//! Event-driven netlist loader.
//!
//! The loader knows nothing about markup syntax. It consumes
//! [`DocumentEvent`]s, tracks which section it is in, and hands section text
//! to the record decoders.

use std::collections::btree_map::Entry;

use tracing::{debug, info, warn};

use super::ids::NodeId;
use super::model::{Connection, Fixture, Netlist, Splice, Window};
use super::records::{self, FixtureRecord};

/// One event from the markup tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    StartElement(String),
    Attribute { name: String, value: String },
    Text(String),
    EndElement(String),
}

/// Netlist sections the loader collects records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Fixture,
    Splices,
    Components,
    Connections,
    Continuity,
    Short,
}

impl Section {
    fn from_element(name: &str) -> Option<Self> {
        match name {
            "Fixture" => Some(Self::Fixture),
            "Splices" => Some(Self::Splices),
            "Components" => Some(Self::Components),
            "GroupInfo" => Some(Self::Connections),
            "Cont" => Some(Self::Continuity),
            "Short" => Some(Self::Short),
            _ => None,
        }
    }
}

/// `opts`/`val` attributes of one `Cont` or `Short` element.
#[derive(Debug, Default)]
struct PendingLimit {
    multiplier: Option<Option<f64>>,
    value: Option<String>,
}

/// Builds a [`Netlist`] from document events.
#[derive(Debug, Default)]
pub struct NetlistLoader {
    netlist: Netlist,
    section: Option<Section>,
    fixture_group: String,
    pending_limit: PendingLimit,
    skipped: usize,
}

impl NetlistLoader {
    /// Create a loader with empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event.
    pub fn handle(&mut self, event: DocumentEvent) {
        match event {
            DocumentEvent::StartElement(name) => {
                if let Some(section) = Section::from_element(&name) {
                    debug!(element = %name, "entering section");
                    if section == Section::Fixture {
                        self.fixture_group.clear();
                    }
                    self.pending_limit = PendingLimit::default();
                    self.section = Some(section);
                }
            }
            DocumentEvent::Attribute { name, value } => self.attribute(&name, &value),
            DocumentEvent::Text(text) => self.text(&text),
            DocumentEvent::EndElement(_) => {
                self.section = None;
                self.fixture_group.clear();
            }
        }
    }

    /// Number of records skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Finish loading and return the netlist.
    pub fn finish(self) -> Netlist {
        let netlist = self.netlist;
        if netlist.limits.continuity.is_none() {
            warn!("no <Cont> window configured; direct connections cannot pass");
        }
        info!(
            fixtures = netlist.fixtures.len(),
            splices = netlist.splices.len(),
            components = netlist.components.len(),
            connections = netlist.connections.len(),
            skipped = self.skipped,
            "netlist loaded"
        );
        netlist
    }

    fn attribute(&mut self, name: &str, value: &str) {
        match self.section {
            Some(Section::Fixture) if name == "name" => {
                debug!(group = value, "fixture group");
                self.fixture_group = value.to_string();
            }
            Some(section @ (Section::Continuity | Section::Short)) => {
                match name {
                    "opts" => {
                        let multiplier = records::limit_multiplier(value);
                        if multiplier.is_none() {
                            warn!(opts = value, "unrecognised limit option, window left unset");
                        }
                        self.pending_limit.multiplier = Some(multiplier);
                    }
                    "val" => self.pending_limit.value = Some(value.to_string()),
                    _ => return,
                }
                self.apply_limit(section);
            }
            _ => {}
        }
    }

    fn apply_limit(&mut self, section: Section) {
        let (Some(multiplier), Some(value)) = (self.pending_limit.multiplier, self.pending_limit.value.as_deref()) else {
            return;
        };
        let Some(multiplier) = multiplier else {
            return;
        };
        let Ok(value) = value.trim().parse::<f64>() else {
            warn!(val = value, "limit value is not a number");
            self.skipped += 1;
            return;
        };

        let slot = match section {
            Section::Continuity => &mut self.netlist.limits.continuity,
            _ => &mut self.netlist.limits.short,
        };
        if slot.is_some() {
            debug!(?section, "limit window already set by an earlier element");
            return;
        }
        let window = Window::symmetric(multiplier * value);
        info!(?section, min = window.min, max = window.max, "limit window set");
        *slot = Some(window);
    }

    fn text(&mut self, text: &str) {
        let Some(section) = self.section else {
            return;
        };
        for record in records::split_records(text) {
            let outcome = match section {
                Section::Fixture => records::decode_fixture(record).map(|r| self.add_fixture(r)),
                Section::Splices => records::decode_splice(record).map(|(id, name)| self.add_splice(Splice { id, name })),
                Section::Components => records::decode_component(record).map(|c| {
                    debug!(pin = %c.pin, name = %c.name, kind = c.kind.label(), value = c.value, "component");
                    match self.netlist.components.entry(c.pin) {
                        Entry::Vacant(slot) => {
                            slot.insert(c);
                        }
                        Entry::Occupied(_) => warn!(pin = %c.pin, "component declared twice, keeping the first"),
                    }
                }),
                Section::Connections => records::decode_connection(record).map(|c| self.add_connection(c)),
                // Limits come from attributes only
                Section::Continuity | Section::Short => Ok(()),
            };
            if let Err(e) = outcome {
                warn!(?section, record, error = %e, "skipping malformed record");
                self.skipped += 1;
            }
        }
    }

    fn add_fixture(&mut self, record: FixtureRecord) {
        match record {
            FixtureRecord::Point { id, suffix } => {
                let name = format!("{}{}", self.fixture_group, suffix);
                debug!(point = %id, name = %name, "fixture");
                if let Some(old) = self.netlist.fixtures.insert(id, Fixture { id, name }) {
                    warn!(point = %id, previous = %old.name, "fixture point redefined");
                }
            }
            FixtureRecord::Switch { a, label, b } => {
                let name = format!("{}{}", self.fixture_group, label);
                self.add_connection(Connection { a, b, name, color: 0 });
            }
        }
    }

    fn add_splice(&mut self, splice: Splice) {
        debug!(splice = %splice.id, name = %splice.name, "splice");
        match self.netlist.splices.entry(splice.id) {
            Entry::Vacant(slot) => {
                slot.insert(splice);
            }
            Entry::Occupied(_) => warn!(splice = %splice.id, "splice declared twice, keeping the first"),
        }
    }

    fn add_connection(&mut self, connection: Connection) {
        debug!(a = %connection.a, b = %connection.b, name = %connection.name, "connection");
        if connection.a == connection.b {
            warn!(node = %connection.a, name = %connection.name, "connection loops back to the same node");
        }
        if let (NodeId::Splice(_), NodeId::Splice(_)) = (connection.a, connection.b) {
            debug!(name = %connection.name, "splice-to-splice connection stored; the builder rejects it");
        }
        self.netlist.connections.push(connection);
    }
}

/// Load a netlist from an event sequence.
pub fn load_events<I>(events: I) -> Netlist
where
    I: IntoIterator<Item = DocumentEvent>,
{
    let mut loader = NetlistLoader::new();
    for event in events {
        loader.handle(event);
    }
    loader.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::{ComponentKind, PinId, SpliceId, TestPointId};
    use approx::assert_relative_eq;

    fn start(name: &str) -> DocumentEvent {
        DocumentEvent::StartElement(name.to_string())
    }

    fn end(name: &str) -> DocumentEvent {
        DocumentEvent::EndElement(name.to_string())
    }

    fn attr(name: &str, value: &str) -> DocumentEvent {
        DocumentEvent::Attribute {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn text(value: &str) -> DocumentEvent {
        DocumentEvent::Text(value.to_string())
    }

    #[test]
    fn test_fixture_names_use_group() {
        let netlist = load_events(vec![
            start("Fixture"),
            attr("name", "J1"),
            text("\r\n\t0,-1\r\n\t1,-2\r\n"),
            end("Fixture"),
        ]);
        assert_eq!(netlist.fixtures.len(), 2);
        assert_eq!(netlist.fixture(TestPointId(0)).unwrap().name, "J1-1");
        assert_eq!(netlist.fixture(TestPointId(1)).unwrap().name, "J1-2");
    }

    #[test]
    fn test_switch_fixture_becomes_connection() {
        let netlist = load_events(vec![
            start("Fixture"),
            attr("name", "SW"),
            text("4,A,9\r\n"),
            end("Fixture"),
        ]);
        assert!(netlist.fixtures.is_empty());
        assert_eq!(netlist.connections.len(), 1);
        assert_eq!(netlist.connections[0].name, "SWA");
        assert_eq!(netlist.connections[0].b, NodeId::TestPoint(TestPointId(9)));
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let mut loader = NetlistLoader::new();
        for event in vec![
            start("GroupInfo"),
            text("0,7,TESTW1,0\r\n0,7,BROKEN\r\n2,65636,TESTW6,16\r\n"),
            end("GroupInfo"),
            start("Splices"),
            text("65636,S1\r\n65637\r\n"),
            end("Splices"),
        ] {
            loader.handle(event);
        }
        assert_eq!(loader.skipped(), 2);
        let netlist = loader.finish();
        assert_eq!(netlist.connections.len(), 2);
        assert!(netlist.has_splice(SpliceId(65636)));
    }

    #[test]
    fn test_components_section() {
        let netlist = load_events(vec![
            start("Components"),
            text("\r\n\t\t\t81920,d,D1,26,-1,90,0\r\n\t\t\t81922,r,R1,10,0,10,k\r\n\t\t"),
            end("Components"),
        ]);
        assert_eq!(netlist.components.len(), 2);
        assert_eq!(netlist.component_for(PinId(81921)).unwrap().kind, ComponentKind::Diode);
        assert_relative_eq!(netlist.component_for(PinId(81922)).unwrap().value, 10_000.0);
    }

    #[test]
    fn test_text_outside_sections_is_ignored() {
        let netlist = load_events(vec![start("Harness"), text("0,7,W,0\r\n"), end("Harness")]);
        assert!(netlist.connections.is_empty());
    }

    #[test]
    fn test_end_element_closes_section() {
        let netlist = load_events(vec![
            start("GroupInfo"),
            end("GroupInfo"),
            text("0,7,W,0\r\n"),
        ]);
        assert!(netlist.connections.is_empty());
    }

    #[test]
    fn test_first_limit_window_wins() {
        let netlist = load_events(vec![
            start("Cont"),
            attr("opts", "eo"),
            attr("val", "2"),
            end("Cont"),
            start("Cont"),
            attr("opts", "ek"),
            attr("val", "5"),
            end("Cont"),
            start("Short"),
            attr("val", "1.5"),
            attr("opts", "ek"),
            end("Short"),
        ]);
        assert_eq!(netlist.limits.continuity, Some(Window { min: -2.0, max: 2.0 }));
        assert_eq!(netlist.limits.short, Some(Window { min: -1500.0, max: 1500.0 }));
    }

    #[test]
    fn test_unrecognised_limit_option_leaves_window_unset() {
        let netlist = load_events(vec![
            start("Cont"),
            attr("opts", "x"),
            attr("val", "2"),
            end("Cont"),
            start("Cont"),
            attr("opts", "eo"),
            attr("val", "3"),
            end("Cont"),
        ]);
        assert_eq!(netlist.limits.continuity, Some(Window::symmetric(3.0)));
    }
}
