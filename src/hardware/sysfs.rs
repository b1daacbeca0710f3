//! GPIO over the legacy sysfs interface (`/sys/class/gpio`).

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::Gpio;
use crate::error::{HarnessError, Result};

/// Default sysfs GPIO root.
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// Sysfs GPIO lines. Value files stay open until the line is unexported.
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
    values: HashMap<u32, File>,
}

impl SysfsGpio {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            values: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn line_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{}", pin))
    }

    fn control(&self, pin: u32, file: &str) -> Result<()> {
        fs::write(self.root.join(file), format!("{}\n", pin))
            .map_err(|e| HarnessError::gpio(pin, format!("write {}", file), e))
    }
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new(DEFAULT_GPIO_ROOT)
    }
}

impl Gpio for SysfsGpio {
    fn export_output(&mut self, pin: u32) -> Result<()> {
        let dir = self.line_dir(pin);
        // Already exported lines reject a second export
        if !dir.is_dir() {
            self.control(pin, "export")?;
        }
        fs::write(dir.join("direction"), "out\n").map_err(|e| HarnessError::gpio(pin, "set direction", e))?;

        let mut value = OpenOptions::new()
            .write(true)
            .open(dir.join("value"))
            .map_err(|e| HarnessError::gpio(pin, "open value", e))?;
        value
            .write_all(b"0\n")
            .map_err(|e| HarnessError::gpio(pin, "write value", e))?;
        self.values.insert(pin, value);
        debug!(pin, "gpio exported as output");
        Ok(())
    }

    fn write(&mut self, pin: u32, high: bool) -> Result<()> {
        let file = self.values.get_mut(&pin).ok_or_else(|| {
            HarnessError::gpio(
                pin,
                "write value",
                std::io::Error::new(std::io::ErrorKind::NotFound, "line not exported"),
            )
        })?;
        let level: &[u8] = if high { b"1\n" } else { b"0\n" };
        file.write_all(level)
            .map_err(|e| HarnessError::gpio(pin, "write value", e))?;
        trace!(pin, high, "gpio write");
        Ok(())
    }

    fn unexport(&mut self, pin: u32) -> Result<()> {
        self.values.remove(&pin);
        self.control(pin, "unexport")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Lay out a fake sysfs tree with pre-exported line directories.
    fn fake_root(pins: &[u32]) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        for pin in pins {
            let line = dir.path().join(format!("gpio{}", pin));
            fs::create_dir(&line).unwrap();
            fs::write(line.join("value"), "").unwrap();
        }
        dir
    }

    #[test]
    fn test_export_sets_direction_and_low() {
        let root = fake_root(&[8]);
        let mut gpio = SysfsGpio::new(root.path());
        gpio.export_output(8).unwrap();

        let line = root.path().join("gpio8");
        assert_eq!(fs::read_to_string(line.join("direction")).unwrap(), "out\n");
        assert_eq!(fs::read_to_string(line.join("value")).unwrap(), "0\n");
        // Line directory existed; no export write
        assert!(!root.path().join("export").exists());
    }

    #[test]
    fn test_write_and_unexport() {
        let root = fake_root(&[9]);
        let mut gpio = SysfsGpio::new(root.path());
        gpio.export_output(9).unwrap();
        gpio.write(9, true).unwrap();
        assert_eq!(fs::read_to_string(root.path().join("gpio9/value")).unwrap(), "0\n1\n");

        gpio.unexport(9).unwrap();
        assert_eq!(fs::read_to_string(root.path().join("unexport")).unwrap(), "9\n");
        assert!(matches!(gpio.write(9, false), Err(HarnessError::Gpio { pin: 9, .. })));
    }

    #[test]
    fn test_missing_line_is_a_gpio_error() {
        let root = tempdir().unwrap();
        let mut gpio = SysfsGpio::new(root.path());
        // Export write succeeds on a plain directory, but no line appears
        let err = gpio.export_output(117).unwrap_err();
        assert!(matches!(err, HarnessError::Gpio { pin: 117, .. }));
        assert!(err.is_hardware());
    }
}
