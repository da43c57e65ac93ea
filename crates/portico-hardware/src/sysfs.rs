//! Digital output backed by the Linux sysfs GPIO interface.

use crate::{HardwareError, Result, traits::DigitalOutput, types::Level};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Root of the sysfs GPIO tree.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// GPIO line driven through its sysfs `value` file.
///
/// Each [`set_level`](DigitalOutput::set_level) writes `"1"` or `"0"` to the
/// file. The line starts out driven low.
#[derive(Debug)]
pub struct SysfsOutput {
    value_path: PathBuf,
    level: Level,
}

impl SysfsOutput {
    /// Open an output over an existing `value` file and drive it low.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationFailed`] if the file cannot be
    /// written.
    pub fn new(value_path: impl Into<PathBuf>) -> Result<Self> {
        let value_path = value_path.into();
        let mut output = Self {
            value_path,
            level: Level::Low,
        };
        output.write(Level::Low).map_err(|e| {
            HardwareError::initialization_failed(format!(
                "cannot drive {} low: {e}",
                output.value_path.display()
            ))
        })?;
        Ok(output)
    }

    /// Export `pin` through sysfs, configure it as an output and open it.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationFailed`] if the pin cannot be
    /// exported or configured.
    pub fn export(pin: u32) -> Result<Self> {
        let root = Path::new(SYSFS_GPIO_ROOT);
        let pin_dir = root.join(format!("gpio{pin}"));

        if !pin_dir.exists() {
            fs::write(root.join("export"), pin.to_string()).map_err(|e| {
                HardwareError::initialization_failed(format!("cannot export gpio{pin}: {e}"))
            })?;
            debug!(pin, "exported gpio");
        }

        fs::write(pin_dir.join("direction"), "out").map_err(|e| {
            HardwareError::initialization_failed(format!(
                "cannot set gpio{pin} direction: {e}"
            ))
        })?;

        info!(pin, "gpio output ready");
        Self::new(pin_dir.join("value"))
    }

    /// Path of the `value` file.
    pub fn value_path(&self) -> &Path {
        &self.value_path
    }

    fn write(&mut self, level: Level) -> Result<()> {
        fs::write(&self.value_path, level.as_sysfs())?;
        self.level = level;
        Ok(())
    }
}

impl DigitalOutput for SysfsOutput {
    fn set_level(&mut self, level: Level) -> Result<()> {
        self.write(level).map_err(|e| {
            HardwareError::output(format!(
                "cannot write {} to {}: {e}",
                level.as_sysfs(),
                self.value_path.display()
            ))
        })
    }

    fn level(&self) -> Level {
        self.level
    }
}
