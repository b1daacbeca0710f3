//! The physical test bench: switch matrix plus ADC.

use tracing::{info, warn};

use super::{Adc, Domain, Gpio, MatrixProbe, RawReading, SwitchMatrix, CHANNEL_NUMERATOR, CHANNEL_REFERENCE};
use crate::error::{HarnessError, Result};
use crate::netlist::TestPointId;

/// How the two channels are read for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleMode {
    /// One conversion per channel, averaging the returned samples
    #[default]
    PerChannel,
    /// One multi-channel conversion, using results 0 and 2
    MultiChannel,
}

/// A [`MatrixProbe`] over real hardware.
#[derive(Debug)]
pub struct Bench<G, A> {
    matrix: SwitchMatrix<G>,
    adc: A,
    mode: SampleMode,
    selected: [Option<TestPointId>; 2],
}

impl<G: Gpio, A: Adc> Bench<G, A> {
    /// Export the matrix lines and initialise the ADC.
    pub fn open(mut matrix: SwitchMatrix<G>, mut adc: A, mode: SampleMode) -> Result<Self> {
        matrix.open()?;
        if let Err(e) = adc.init() {
            if let Err(close_err) = matrix.close() {
                warn!(error = %close_err, "releasing matrix lines after ADC init failure");
            }
            return Err(e);
        }
        info!(?mode, "bench open");
        Ok(Self {
            matrix,
            adc,
            mode,
            selected: [None, None],
        })
    }

    /// Release the ADC and every matrix line. Both steps always run; the
    /// first error is returned.
    pub fn close(mut self) -> Result<()> {
        let deinit = self.adc.deinit();
        let released = self.matrix.close();
        deinit?;
        released?;
        info!("bench closed");
        Ok(())
    }

    fn average(&mut self, channel: u8) -> Result<f64> {
        let samples = self.adc.convert(channel)?;
        if samples.is_empty() {
            return Err(HarnessError::adc("bench", format!("channel {} returned no samples", channel)));
        }
        Ok(samples.iter().map(|&s| f64::from(s)).sum::<f64>() / samples.len() as f64)
    }
}

impl<G: Gpio, A: Adc> MatrixProbe for Bench<G, A> {
    fn select(&mut self, domain: Domain, point: TestPointId) -> Result<()> {
        self.matrix.select(domain, point.0)?;
        let slot = match domain {
            Domain::A => 0,
            Domain::B => 1,
        };
        self.selected[slot] = Some(point);
        Ok(())
    }

    fn sample(&mut self) -> Result<RawReading> {
        if self.selected.iter().any(Option::is_none) {
            return Err(HarnessError::probe_state("sampled before both domains were selected"));
        }
        match self.mode {
            SampleMode::PerChannel => Ok(RawReading {
                adc0: self.average(CHANNEL_NUMERATOR)?,
                adc2: self.average(CHANNEL_REFERENCE)?,
            }),
            SampleMode::MultiChannel => {
                let results = self.adc.convert_multichannel()?;
                match (
                    results.get(usize::from(CHANNEL_NUMERATOR)),
                    results.get(usize::from(CHANNEL_REFERENCE)),
                ) {
                    (Some(&adc0), Some(&adc2)) => Ok(RawReading {
                        adc0: f64::from(adc0),
                        adc2: f64::from(adc2),
                    }),
                    _ => Err(HarnessError::adc(
                        "bench",
                        format!("multi-channel conversion returned {} results", results.len()),
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::matrix::tests::RecordingGpio;
    use crate::hardware::{DEFAULT_DOMAIN_A, DEFAULT_DOMAIN_B};
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Returns fixed per-channel samples.
    #[derive(Debug, Default)]
    struct ScriptedAdc {
        channels: Vec<Vec<u32>>,
        initialised: bool,
    }

    impl Adc for ScriptedAdc {
        fn init(&mut self) -> Result<()> {
            self.initialised = true;
            Ok(())
        }

        fn convert(&mut self, channel: u8) -> Result<Vec<u32>> {
            Ok(self.channels[usize::from(channel)].clone())
        }

        fn convert_multichannel(&mut self) -> Result<Vec<u32>> {
            Ok(self.channels.iter().map(|c| c[0]).collect())
        }

        fn deinit(&mut self) -> Result<()> {
            self.initialised = false;
            Ok(())
        }
    }

    /// Fails on request during init or deinit.
    #[derive(Debug, Default)]
    struct FailingAdc {
        fail_init: bool,
        fail_deinit: bool,
    }

    impl Adc for FailingAdc {
        fn init(&mut self) -> Result<()> {
            if self.fail_init {
                return Err(HarnessError::adc("iio:device0", "enable failed"));
            }
            Ok(())
        }

        fn convert(&mut self, _channel: u8) -> Result<Vec<u32>> {
            Ok(vec![0])
        }

        fn convert_multichannel(&mut self) -> Result<Vec<u32>> {
            Ok(vec![0, 0, 0])
        }

        fn deinit(&mut self) -> Result<()> {
            if self.fail_deinit {
                return Err(HarnessError::adc("iio:device0", "disable failed"));
            }
            Ok(())
        }
    }

    /// Keeps the GPIO state visible after the bench takes the matrix.
    impl Gpio for Rc<RefCell<RecordingGpio>> {
        fn export_output(&mut self, pin: u32) -> Result<()> {
            self.borrow_mut().export_output(pin)
        }

        fn write(&mut self, pin: u32, high: bool) -> Result<()> {
            self.borrow_mut().write(pin, high)
        }

        fn unexport(&mut self, pin: u32) -> Result<()> {
            self.borrow_mut().unexport(pin)
        }
    }

    fn shared_matrix() -> (Rc<RefCell<RecordingGpio>>, SwitchMatrix<Rc<RefCell<RecordingGpio>>>) {
        let gpio = Rc::new(RefCell::new(RecordingGpio::default()));
        let matrix = SwitchMatrix::new(Rc::clone(&gpio), DEFAULT_DOMAIN_A, DEFAULT_DOMAIN_B);
        (gpio, matrix)
    }

    fn bench(mode: SampleMode) -> Bench<RecordingGpio, ScriptedAdc> {
        let adc = ScriptedAdc {
            channels: vec![vec![100, 200, 300, 400], vec![0], vec![1000, 1002, 998, 1000]],
            initialised: false,
        };
        let matrix = SwitchMatrix::new(RecordingGpio::default(), DEFAULT_DOMAIN_A, DEFAULT_DOMAIN_B);
        Bench::open(matrix, adc, mode).unwrap()
    }

    #[test]
    fn test_per_channel_averages() {
        let mut bench = bench(SampleMode::PerChannel);
        assert!(bench.adc.initialised);
        bench.select(Domain::A, TestPointId(1)).unwrap();
        bench.select(Domain::B, TestPointId(2)).unwrap();
        let reading = bench.sample().unwrap();
        assert_relative_eq!(reading.adc0, 250.0);
        assert_relative_eq!(reading.adc2, 1000.0);
        bench.close().unwrap();
    }

    #[test]
    fn test_multichannel_uses_results_zero_and_two() {
        let mut bench = bench(SampleMode::MultiChannel);
        bench.select(Domain::A, TestPointId(1)).unwrap();
        bench.select(Domain::B, TestPointId(2)).unwrap();
        let reading = bench.sample().unwrap();
        assert_relative_eq!(reading.adc0, 100.0);
        assert_relative_eq!(reading.adc2, 1000.0);
    }

    #[test]
    fn test_sample_requires_selection() {
        let mut bench = bench(SampleMode::PerChannel);
        bench.select(Domain::A, TestPointId(1)).unwrap();
        assert!(matches!(bench.sample(), Err(HarnessError::ProbeState { .. })));
    }

    #[test]
    fn test_adc_init_failure_releases_lines() {
        let (gpio, matrix) = shared_matrix();
        let adc = FailingAdc {
            fail_init: true,
            fail_deinit: false,
        };
        let opened = Bench::open(matrix, adc, SampleMode::PerChannel);
        assert!(matches!(opened, Err(HarnessError::Adc { .. })));
        assert!(gpio.borrow().exported.is_empty());
    }

    #[test]
    fn test_close_releases_lines_when_deinit_fails() {
        let (gpio, matrix) = shared_matrix();
        let adc = FailingAdc {
            fail_init: false,
            fail_deinit: true,
        };
        let bench = Bench::open(matrix, adc, SampleMode::PerChannel).unwrap();
        assert_eq!(gpio.borrow().exported.len(), 20);
        assert!(matches!(bench.close(), Err(HarnessError::Adc { .. })));
        assert!(gpio.borrow().exported.is_empty());
    }
}
