//! Hardware boundary.
//!
//! The measurement engine talks to a [`MatrixProbe`]: select a point on each
//! domain, then sample. [`Bench`] implements it over a GPIO-addressed
//! [`SwitchMatrix`] and an [`Adc`]; [`SimulatedHarness`] implements it from a
//! table of resistances.

mod bench;
mod iio;
mod matrix;
mod sim;
mod sysfs;

pub use bench::{Bench, SampleMode};
pub use iio::{IioAdc, ADC_CHANNELS, DEFAULT_ADC_DEVICE};
pub use matrix::{SwitchMatrix, DOMAIN_WIDTH};
pub use sim::{SimulatedHarness, DIODE_FORWARD_OHMS};
pub use sysfs::{SysfsGpio, DEFAULT_GPIO_ROOT};

use std::fmt;

use crate::error::Result;
use crate::netlist::TestPointId;

/// Default GPIO lines for domain A, least significant bit first.
pub const DEFAULT_DOMAIN_A: [u32; DOMAIN_WIDTH] = [8, 9, 10, 11, 117, 7, 6, 31, 30, 29];

/// Default GPIO lines for domain B, least significant bit first.
pub const DEFAULT_DOMAIN_B: [u32; DOMAIN_WIDTH] = [98, 100, 44, 45, 89, 46, 87, 88, 5, 4];

/// ADC channel carrying the divider top.
pub const CHANNEL_NUMERATOR: u8 = 0;

/// ADC channel carrying the reference.
pub const CHANNEL_REFERENCE: u8 = 2;

/// One of the two point-selection buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    A,
    B,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::A => write!(f, "A"),
            Domain::B => write!(f, "B"),
        }
    }
}

/// Raw values of the two ADC channels for one selected pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    /// Channel 0
    pub adc0: f64,
    /// Channel 2
    pub adc2: f64,
}

/// Output-only GPIO lines.
pub trait Gpio {
    /// Export a line, make it an output and drive it low.
    fn export_output(&mut self, pin: u32) -> Result<()>;

    /// Drive a line.
    fn write(&mut self, pin: u32, high: bool) -> Result<()>;

    /// Release a line.
    fn unexport(&mut self, pin: u32) -> Result<()>;
}

/// A multi-channel ADC.
pub trait Adc {
    fn init(&mut self) -> Result<()>;

    /// Convert one channel; returns one or more raw samples.
    fn convert(&mut self, channel: u8) -> Result<Vec<u32>>;

    /// Convert every channel once; index = channel.
    fn convert_multichannel(&mut self) -> Result<Vec<u32>>;

    fn deinit(&mut self) -> Result<()>;
}

/// What the measurement engine needs from the hardware.
///
/// Callers select domain A, then domain B, then sample. A sample belongs to
/// the pair selected when it was taken.
pub trait MatrixProbe {
    fn select(&mut self, domain: Domain, point: TestPointId) -> Result<()>;

    fn sample(&mut self) -> Result<RawReading>;
}
