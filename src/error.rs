//! Error types for the harness tester.
//!
//! Only fatal conditions are errors. Malformed netlist records are logged and
//! skipped by the loader, and a failing pair is a report row, not an error.

use thiserror::Error;

use crate::netlist::{NodeId, PinId, SpliceId};

/// Result type alias using [`HarnessError`].
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Unified error type for all harness tester operations.
#[derive(Error, Debug)]
pub enum HarnessError {
    // ============ Input Errors ============
    /// Error reading the netlist file
    #[error("Failed to read netlist '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The netlist markup could not be tokenized
    #[error("Malformed netlist markup: {source}")]
    Markup {
        #[source]
        source: quick_xml::Error,
    },

    // ============ Topology Errors ============
    /// A connection references a splice that was never declared
    #[error("Splice {splice} is referenced but not declared in <Splices>")]
    UnknownSplice { splice: SpliceId },

    /// A connection references a component pin with no component record
    #[error("No component registered for pin {pin}")]
    MissingComponent { pin: PinId },

    /// Neither end of a connection is a test point
    #[error("Connection '{name}' joins {a} and {b}; at least one end must be a test point")]
    IndirectConnection { name: String, a: NodeId, b: NodeId },

    /// A splice or pin does not lead to a test point
    #[error("Node {node} does not resolve to a test point: {message}")]
    UnresolvedNode { node: NodeId, message: String },

    /// Strict fan-out is enabled and a splice or pin has several connections
    #[error("Node {node} has {count} incident connections; strict fan-out allows one")]
    AmbiguousNode { node: NodeId, count: usize },

    // ============ Hardware Errors ============
    /// GPIO export, direction or value write failed
    #[error("GPIO {pin}: {message}: {source}")]
    Gpio {
        pin: u32,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// ADC open, init or conversion failed
    #[error("ADC {device}: {message}")]
    Adc { device: String, message: String },

    /// A matrix point does not fit the 10-bit domain address
    #[error("Point {point} cannot be addressed on a 10-bit domain")]
    PointOutOfRange { point: u32 },

    /// The probe was used out of order (e.g. sampled before selection)
    #[error("Probe used out of order: {message}")]
    ProbeState { message: String },
}

impl HarnessError {
    /// Create an unresolved-node error
    pub fn unresolved(node: NodeId, message: impl Into<String>) -> Self {
        Self::UnresolvedNode {
            node,
            message: message.into(),
        }
    }

    /// Create a GPIO error
    pub fn gpio(pin: u32, message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Gpio {
            pin,
            message: message.into(),
            source,
        }
    }

    /// Create an ADC error
    pub fn adc(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Adc {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a probe ordering error
    pub fn probe_state(message: impl Into<String>) -> Self {
        Self::ProbeState {
            message: message.into(),
        }
    }

    /// Whether this error came from the hardware boundary
    pub fn is_hardware(&self) -> bool {
        matches!(
            self,
            Self::Gpio { .. } | Self::Adc { .. } | Self::PointOutOfRange { .. } | Self::ProbeState { .. }
        )
    }
}

impl From<quick_xml::Error> for HarnessError {
    fn from(source: quick_xml::Error) -> Self {
        Self::Markup { source }
    }
}
