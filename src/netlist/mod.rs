//! Netlist model and loader.
//!
//! A harness netlist is an XML document whose interesting content is plain
//! text: each section element carries comma-separated records, one per line.
//!
//! # Sections
//!
//! | Element | Record | Fields |
//! |---------|--------|--------|
//! | `Fixture name="J1"` | `<id>,<suffix>` | test point named `J1<suffix>` |
//! | `Fixture name="SW"` | `<id>,<label>,<pairId>` | switch wired `id ↔ pairId` |
//! | `Splices` | `<id>,<name>` | splice declaration |
//! | `Components` | `<id>,<r\|d\|c>,<name>,<mantissa>,<exponent>,<tolerance>,<unit>` | component keyed by its input pin |
//! | `GroupInfo` | `<pointA>,<pointB>,<name>,<color>` | wire |
//! | `Cont`, `Short` | attributes `opts="eo\|ek\|em"` and `val` | window `±opts·val` |
//!
//! # Node ids
//!
//! | Range | Meaning |
//! |-------|---------|
//! | `0..999` | test point |
//! | `65636..81920` | splice |
//! | `81920..` | component pin, even = input, odd = output |
//!
//! # Example
//!
//! ```text
//! <Harness>
//!   <Cont opts="eo" val="2"/>
//!   <Fixture name="J1">
//!     0,-1
//!     1,-2
//!   </Fixture>
//!   <Components>
//!     81922,r,R1,10,1,5,o
//!   </Components>
//!   <GroupInfo>
//!     0,81922,W1,0
//!     81923,1,W2,0
//!   </GroupInfo>
//! </Harness>
//! ```

mod ids;
mod loader;
mod model;
mod records;
mod xml;

pub use ids::*;
pub use loader::{load_events, DocumentEvent, NetlistLoader};
pub use model::*;
pub use records::{decode_component, decode_connection, decode_fixture, decode_splice, FixtureRecord, RecordError};
pub use xml::{parse_str, read_into};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{HarnessError, Result};

/// Parse a netlist file.
pub fn parse_file(path: &Path) -> Result<Netlist> {
    let file = File::open(path).map_err(|e| HarnessError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut loader = NetlistLoader::new();
    read_into(BufReader::new(file), &mut loader)?;
    Ok(loader.finish())
}
