//! Timed alarm on a digital output.

use crate::{Result, traits::DigitalOutput, types::Level};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{error, info, warn};

/// Drives a [`DigitalOutput`] high for a bounded time.
///
/// The output is forced low when an activation ends, however it ends: after
/// the full duration, on error, or when the activating future is dropped.
/// Overlapping activations are allowed; whichever ends first drives the
/// output low.
///
/// # Examples
///
/// ```
/// use portico_hardware::alarm::AlarmActuator;
/// use portico_hardware::mock::MockOutput;
/// use portico_hardware::types::Level;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> portico_hardware::Result<()> {
///     let (output, handle) = MockOutput::new();
///     let alarm = AlarmActuator::new(output);
///
///     alarm.activate(Duration::from_millis(10)).await?;
///
///     assert_eq!(handle.transitions(), vec![Level::High, Level::Low]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct AlarmActuator<O> {
    output: Mutex<O>,
}

impl<O: DigitalOutput> AlarmActuator<O> {
    /// Wrap an output. The output is not touched until the first activation.
    pub fn new(output: O) -> Self {
        Self {
            output: Mutex::new(output),
        }
    }

    fn output(&self) -> MutexGuard<'_, O> {
        self.output
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drive the output high for `duration`, then low.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven high. The output is
    /// still driven low before returning.
    pub async fn activate(&self, duration: Duration) -> Result<()> {
        let _low = LowOnDrop { actuator: self };

        // Lock released here; the guard relocks on the error path.
        let raised = self.output().set_level(Level::High);
        if let Err(e) = raised {
            error!(error = %e, "failed to raise alarm output");
            return Err(e);
        }

        info!(duration_ms = duration.as_millis() as u64, "alarm raised");
        tokio::time::sleep(duration).await;
        Ok(())
    }

    /// Drive the output low immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn deactivate(&self) -> Result<()> {
        self.output().set_level(Level::Low)
    }

    /// True while the output is high.
    pub fn is_active(&self) -> bool {
        self.output().level().is_high()
    }
}

struct LowOnDrop<'a, O: DigitalOutput> {
    actuator: &'a AlarmActuator<O>,
}

impl<O: DigitalOutput> Drop for LowOnDrop<'_, O> {
    fn drop(&mut self) {
        match self.actuator.deactivate() {
            Ok(()) => info!("alarm cleared"),
            Err(e) => warn!(error = %e, "failed to clear alarm output"),
        }
    }
}
