//! Comma-separated record decoding.
//!
//! Each netlist section carries its records as one text block, one record
//! per line. Records are decoded here; a [`RecordError`] means the record is
//! skipped, never that loading stops.

use thiserror::Error;
use tracing::warn;

use super::ids::{NodeId, SpliceId, TestPointId};
use super::model::{Component, ComponentKind, Connection};

/// Why a single record was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found}")]
    Arity { expected: &'static str, found: usize },

    #[error("field '{field}' is not a number: '{text}'")]
    Number { field: &'static str, text: String },

    #[error("id {id} is not a valid {expected} id")]
    Range { id: u32, expected: &'static str },

    #[error("unknown component kind '{0}'")]
    Kind(String),
}

/// Split a section's text into trimmed, non-empty records.
///
/// Records end at `\r\n`; a bare `\n` is accepted as well.
pub fn split_records(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r').trim_matches(|c| c == ' ' || c == '\t'))
        .filter(|line| !line.is_empty())
}

fn fields(record: &str) -> Vec<&str> {
    record.split(',').map(str::trim).collect()
}

fn number<T: std::str::FromStr>(field: &'static str, text: &str) -> Result<T, RecordError> {
    text.parse().map_err(|_| RecordError::Number {
        field,
        text: text.to_string(),
    })
}

fn node(field: &'static str, text: &str) -> Result<NodeId, RecordError> {
    let raw: u32 = number(field, text)?;
    NodeId::from_raw(raw).ok_or(RecordError::Range { id: raw, expected: "node" })
}

fn test_point(field: &'static str, text: &str) -> Result<TestPointId, RecordError> {
    let raw: u32 = number(field, text)?;
    NodeId::from_raw(raw)
        .and_then(|n| n.as_test_point())
        .ok_or(RecordError::Range { id: raw, expected: "test point" })
}

/// Multiplier for a resistor unit suffix.
pub fn unit_multiplier(unit: &str) -> Option<f64> {
    match unit {
        "o" => Some(1.0),
        "k" => Some(1e3),
        "m" => Some(1e6),
        "M" => Some(1e-6),
        _ => None,
    }
}

/// Multiplier for the `opts` attribute of `Cont`/`Short`.
pub fn limit_multiplier(opts: &str) -> Option<f64> {
    match opts {
        "eo" => Some(1.0),
        "ek" => Some(1e3),
        "em" => Some(1e6),
        _ => None,
    }
}

/// A decoded line of a `Fixture` block.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureRecord {
    /// `<id>,<suffix>`
    Point { id: TestPointId, suffix: String },
    /// `<id>,<label>,<pairId>`: a switch wired between two points
    Switch { a: NodeId, label: String, b: NodeId },
}

pub fn decode_fixture(record: &str) -> Result<FixtureRecord, RecordError> {
    match fields(record).as_slice() {
        [id, label, pair] => Ok(FixtureRecord::Switch {
            a: node("id", id)?,
            label: label.to_string(),
            b: node("pair", pair)?,
        }),
        [id, suffix] => Ok(FixtureRecord::Point {
            id: test_point("id", id)?,
            suffix: suffix.to_string(),
        }),
        other => Err(RecordError::Arity {
            expected: "2 or 3",
            found: other.len(),
        }),
    }
}

/// `<id>,<name>`
pub fn decode_splice(record: &str) -> Result<(SpliceId, String), RecordError> {
    match fields(record).as_slice() {
        [id, name] => {
            let raw: u32 = number("id", id)?;
            match NodeId::from_raw(raw) {
                Some(NodeId::Splice(splice)) => Ok((splice, name.to_string())),
                _ => Err(RecordError::Range { id: raw, expected: "splice" }),
            }
        }
        other => Err(RecordError::Arity {
            expected: "2",
            found: other.len(),
        }),
    }
}

/// `<pointA>,<pointB>,<name>,<color>`
pub fn decode_connection(record: &str) -> Result<Connection, RecordError> {
    match fields(record).as_slice() {
        [a, b, name, color] => Ok(Connection {
            a: node("pointA", a)?,
            b: node("pointB", b)?,
            name: name.to_string(),
            color: number("color", color)?,
        }),
        other => Err(RecordError::Arity {
            expected: "4",
            found: other.len(),
        }),
    }
}

/// `<id>,<kind>,<name>,<mantissa>,<exponent>,<tolerance>,<unit>`
///
/// An unknown resistor unit is logged and gives a value of 0; the component
/// is still returned.
pub fn decode_component(record: &str) -> Result<Component, RecordError> {
    let parts = fields(record);
    let [id, kind, name, mantissa, exponent, tolerance, unit] = parts[..] else {
        return Err(RecordError::Arity {
            expected: "7",
            found: parts.len(),
        });
    };

    let raw: u32 = number("id", id)?;
    let pin = match NodeId::from_raw(raw) {
        Some(NodeId::Pin(pin)) if pin == pin.input() => pin,
        _ => return Err(RecordError::Range { id: raw, expected: "component input pin" }),
    };
    let kind = ComponentKind::from_code(kind).ok_or_else(|| RecordError::Kind(kind.to_string()))?;
    let tolerance_percent: i32 = number("tolerance", tolerance)?;

    let value = match kind {
        ComponentKind::Resistor => {
            let mantissa: f64 = number("mantissa", mantissa)?;
            let exponent: i32 = number("exponent", exponent)?;
            match unit_multiplier(unit) {
                Some(multiplier) => mantissa * 10f64.powi(exponent) * multiplier,
                None => {
                    warn!(component = name, unit, "unknown resistor unit, value set to 0");
                    0.0
                }
            }
        }
        ComponentKind::Diode | ComponentKind::Capacitor => 0.0,
    };

    Ok(Component {
        pin,
        name: name.to_string(),
        kind,
        value,
        tolerance_percent,
    })
}
