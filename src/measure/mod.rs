//! Measurement and classification.
//!
//! # Resistance
//!
//! The matrix places the harness path in a divider with a reference
//! resistor. With `R2` the reference and `Rsw` one analog switch:
//!
//! ```text
//! R = adc0 * R2 / adc2 - R2 - n * Rsw
//! ```
//!
//! `adc2 == 0` means no current flowed; the result is [`MAX_RESIST`].
//!
//! # Verdicts
//!
//! | Expected | Pass when |
//! |----------|-----------|
//! | open / none | `R == MAX_RESIST` |
//! | diode | `0 < R < MAX_RESIST` |
//! | direct | inside the continuity window |
//! | resistor below 100 Ω | within 5 Ω |
//! | resistor below 10 kΩ | within 5 % |
//! | resistor below 50 kΩ | within 10 % |
//! | resistor 50 kΩ and up | never |

mod cache;
mod classify;
mod engine;

pub use cache::MeasurementCache;
pub use classify::{classify, resistor_passes, self_test_passes, Verdict};
pub use engine::{MeasurementEngine, PairResult, SelfTestReport, SelfTestRow, SweepReport};

use crate::hardware::RawReading;

/// Open-circuit sentinel, in ohms.
pub const MAX_RESIST: f64 = 1e7;

/// Divider constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Reference resistor (R2), ohms
    pub reference_ohms: f64,
    /// On-resistance of one analog switch, ohms
    pub switch_ohms: f64,
    /// Switches in series with the harness path
    pub switches_in_path: u32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            reference_ohms: 2000.0,
            switch_ohms: 5.75,
            switches_in_path: 4,
        }
    }
}

impl Calibration {
    /// Series resistance the matrix itself adds.
    pub fn path_ohms(&self) -> f64 {
        self.switch_ohms * f64::from(self.switches_in_path)
    }

    /// Resistance of the harness path for a raw reading.
    pub fn resistance(&self, reading: RawReading) -> f64 {
        if reading.adc2 == 0.0 {
            return MAX_RESIST;
        }
        reading.adc0 * self.reference_ohms / reading.adc2 - self.reference_ohms - self.path_ohms()
    }
}

/// [`Calibration::resistance`] with the default calibration.
pub fn resistance(adc0: f64, adc2: f64) -> f64 {
    Calibration::default().resistance(RawReading { adc0, adc2 })
}
