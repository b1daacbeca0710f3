//! Two-domain switch matrix over GPIO.

use tracing::{debug, info, warn};

use super::{Domain, Gpio};
use crate::error::{HarnessError, Result};

/// Address lines per domain.
pub const DOMAIN_WIDTH: usize = 10;

/// A switch matrix addressed by two 10-bit GPIO buses.
#[derive(Debug)]
pub struct SwitchMatrix<G> {
    gpio: G,
    domain_a: [u32; DOMAIN_WIDTH],
    domain_b: [u32; DOMAIN_WIDTH],
}

impl<G: Gpio> SwitchMatrix<G> {
    pub fn new(gpio: G, domain_a: [u32; DOMAIN_WIDTH], domain_b: [u32; DOMAIN_WIDTH]) -> Self {
        Self {
            gpio,
            domain_a,
            domain_b,
        }
    }

    fn lines(&self, domain: Domain) -> [u32; DOMAIN_WIDTH] {
        match domain {
            Domain::A => self.domain_a,
            Domain::B => self.domain_b,
        }
    }

    /// Export every address line as a low output.
    pub fn open(&mut self) -> Result<()> {
        for pin in self.domain_a.into_iter().chain(self.domain_b) {
            self.gpio.export_output(pin)?;
        }
        info!(lines = 2 * DOMAIN_WIDTH, "switch matrix exported");
        Ok(())
    }

    /// Put `point` on a domain's address lines, least significant bit on
    /// the first line.
    pub fn select(&mut self, domain: Domain, point: u32) -> Result<()> {
        if point >= 1 << DOMAIN_WIDTH {
            return Err(HarnessError::PointOutOfRange { point });
        }
        debug!(%domain, point, "select");
        for (bit, pin) in self.lines(domain).into_iter().enumerate() {
            self.gpio.write(pin, (point >> bit) & 1 == 1)?;
        }
        Ok(())
    }

    /// Release every address line, returning the first failure.
    pub fn close(&mut self) -> Result<()> {
        let mut first = None;
        for pin in self.domain_a.into_iter().chain(self.domain_b) {
            if let Err(e) = self.gpio.unexport(pin) {
                warn!(pin, error = %e, "unexport failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }
}
