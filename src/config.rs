//! Bench configuration.

use std::path::PathBuf;

use crate::hardware::{
    IioAdc, SampleMode, SwitchMatrix, SysfsGpio, DEFAULT_ADC_DEVICE, DEFAULT_DOMAIN_A, DEFAULT_DOMAIN_B,
    DEFAULT_GPIO_ROOT, DOMAIN_WIDTH,
};
use crate::measure::Calibration;
use crate::topology::FanoutPolicy;

/// Default samples averaged per channel conversion.
pub const DEFAULT_SAMPLES_PER_READ: usize = 4;

/// Default self-test matrix size.
pub const DEFAULT_SELF_TEST_POINTS: u32 = 256;

/// Everything needed to open a bench and run a test.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Sysfs GPIO root
    pub gpio_root: PathBuf,
    /// IIO device directory
    pub adc_device: PathBuf,
    /// Domain A address lines, LSB first
    pub domain_a: [u32; DOMAIN_WIDTH],
    /// Domain B address lines, LSB first
    pub domain_b: [u32; DOMAIN_WIDTH],
    pub sample_mode: SampleMode,
    pub samples_per_read: usize,
    pub calibration: Calibration,
    pub self_test_points: u32,
    pub fanout: FanoutPolicy,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            gpio_root: PathBuf::from(DEFAULT_GPIO_ROOT),
            adc_device: PathBuf::from(DEFAULT_ADC_DEVICE),
            domain_a: DEFAULT_DOMAIN_A,
            domain_b: DEFAULT_DOMAIN_B,
            sample_mode: SampleMode::default(),
            samples_per_read: DEFAULT_SAMPLES_PER_READ,
            calibration: Calibration::default(),
            self_test_points: DEFAULT_SELF_TEST_POINTS,
            fanout: FanoutPolicy::default(),
        }
    }
}

impl BenchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gpio_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.gpio_root = root.into();
        self
    }

    pub fn with_adc_device(mut self, device: impl Into<PathBuf>) -> Self {
        self.adc_device = device.into();
        self
    }

    /// Replace both address buses.
    pub fn with_domains(mut self, domain_a: [u32; DOMAIN_WIDTH], domain_b: [u32; DOMAIN_WIDTH]) -> Self {
        self.domain_a = domain_a;
        self.domain_b = domain_b;
        self
    }

    pub fn with_sample_mode(mut self, mode: SampleMode) -> Self {
        self.sample_mode = mode;
        self
    }

    /// Samples averaged per channel in [`SampleMode::PerChannel`]. At least one.
    pub fn with_samples_per_read(mut self, samples: usize) -> Self {
        self.samples_per_read = samples.max(1);
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_self_test_points(mut self, points: u32) -> Self {
        self.self_test_points = points;
        self
    }

    pub fn with_fanout(mut self, policy: FanoutPolicy) -> Self {
        self.fanout = policy;
        self
    }

    /// A switch matrix over sysfs GPIO at the configured root.
    pub fn switch_matrix(&self) -> SwitchMatrix<SysfsGpio> {
        SwitchMatrix::new(SysfsGpio::new(&self.gpio_root), self.domain_a, self.domain_b)
    }

    /// An IIO ADC at the configured device.
    pub fn adc(&self) -> IioAdc {
        IioAdc::new(&self.adc_device, self.samples_per_read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.domain_a[4], 117);
        assert_eq!(config.domain_b[0], 98);
        assert_eq!(config.samples_per_read, 4);
        assert_eq!(config.self_test_points, 256);
        assert_eq!(config.fanout, FanoutPolicy::Lenient);
        assert_eq!(config.gpio_root, PathBuf::from("/sys/class/gpio"));
    }

    #[test]
    fn test_builder() {
        let config = BenchConfig::new()
            .with_gpio_root("/tmp/gpio")
            .with_adc_device("/tmp/iio")
            .with_sample_mode(SampleMode::MultiChannel)
            .with_samples_per_read(0)
            .with_self_test_points(16)
            .with_fanout(FanoutPolicy::Strict);
        assert_eq!(config.gpio_root, PathBuf::from("/tmp/gpio"));
        assert_eq!(config.adc().device(), std::path::Path::new("/tmp/iio"));
        assert_eq!(config.sample_mode, SampleMode::MultiChannel);
        assert_eq!(config.samples_per_read, 1);
        assert_eq!(config.self_test_points, 16);
        assert_eq!(config.fanout, FanoutPolicy::Strict);
    }
}
