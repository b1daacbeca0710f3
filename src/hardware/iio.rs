//! ADC over the Linux IIO sysfs interface.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::Adc;
use crate::error::{HarnessError, Result};

/// Default IIO device directory.
pub const DEFAULT_ADC_DEVICE: &str = "/sys/bus/iio/devices/iio:device0";

/// Channels read by a multi-channel conversion.
pub const ADC_CHANNELS: u8 = 4;

/// An IIO ADC read through `in_voltage<ch>_raw` attributes.
#[derive(Debug, Clone)]
pub struct IioAdc {
    device: PathBuf,
    samples_per_read: usize,
    ready: bool,
}

impl IioAdc {
    pub fn new(device: impl Into<PathBuf>, samples_per_read: usize) -> Self {
        Self {
            device: device.into(),
            samples_per_read: samples_per_read.max(1),
            ready: false,
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    fn error(&self, message: impl Into<String>) -> HarnessError {
        HarnessError::adc(self.device.display().to_string(), message)
    }

    fn read_raw(&self, channel: u8) -> Result<u32> {
        if !self.ready {
            return Err(self.error("converted before init"));
        }
        let path = self.device.join(format!("in_voltage{}_raw", channel));
        let text = fs::read_to_string(&path)
            .map_err(|e| self.error(format!("read {}: {}", path.display(), e)))?;
        text.trim()
            .parse()
            .map_err(|_| self.error(format!("channel {} returned '{}'", channel, text.trim())))
    }
}

impl Adc for IioAdc {
    fn init(&mut self) -> Result<()> {
        if !self.device.is_dir() {
            return Err(self.error("device directory not found"));
        }
        self.ready = true;
        // One probe read so a missing channel fails at open time
        if let Err(e) = self.read_raw(0) {
            self.ready = false;
            return Err(e);
        }
        info!(device = %self.device.display(), samples = self.samples_per_read, "adc ready");
        Ok(())
    }

    fn convert(&mut self, channel: u8) -> Result<Vec<u32>> {
        let samples = (0..self.samples_per_read)
            .map(|_| self.read_raw(channel))
            .collect::<Result<Vec<_>>>()?;
        debug!(channel, ?samples, "adc convert");
        Ok(samples)
    }

    fn convert_multichannel(&mut self) -> Result<Vec<u32>> {
        (0..ADC_CHANNELS).map(|ch| self.read_raw(ch)).collect()
    }

    fn deinit(&mut self) -> Result<()> {
        self.ready = false;
        Ok(())
    }
}
