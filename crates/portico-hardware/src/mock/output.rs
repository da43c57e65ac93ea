//! Mock digital output for testing and development.
//!
//! The output keeps no real line. Every level change is recorded in state
//! shared with a [`MockOutputHandle`] so tests can inspect the full history
//! of transitions after the fact.

use crate::{HardwareError, Result, traits::DigitalOutput, types::Level};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct OutputState {
    level: Level,
    transitions: Vec<Level>,
    activations: usize,
    fail_on_high: bool,
}

/// Mock digital output.
///
/// # Examples
///
/// ```
/// use portico_hardware::mock::MockOutput;
/// use portico_hardware::traits::DigitalOutput;
/// use portico_hardware::types::Level;
///
/// let (mut output, handle) = MockOutput::new();
/// output.set_level(Level::High).unwrap();
/// output.set_level(Level::Low).unwrap();
///
/// assert_eq!(handle.transitions(), vec![Level::High, Level::Low]);
/// assert_eq!(handle.activations(), 1);
/// ```
#[derive(Debug)]
pub struct MockOutput {
    state: Arc<Mutex<OutputState>>,
}

impl MockOutput {
    /// Create a new mock output, initially low.
    pub fn new() -> (Self, MockOutputHandle) {
        let state = Arc::new(Mutex::new(OutputState::default()));
        let output = Self {
            state: Arc::clone(&state),
        };
        (output, MockOutputHandle { state })
    }
}

fn lock(state: &Mutex<OutputState>) -> MutexGuard<'_, OutputState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DigitalOutput for MockOutput {
    fn set_level(&mut self, level: Level) -> Result<()> {
        let mut state = lock(&self.state);

        if level.is_high() && state.fail_on_high {
            return Err(HardwareError::output("mock output refused high level"));
        }

        if level.is_high() && !state.level.is_high() {
            state.activations += 1;
        }
        state.level = level;
        state.transitions.push(level);
        Ok(())
    }

    fn level(&self) -> Level {
        lock(&self.state).level
    }
}

/// Handle for inspecting and controlling a [`MockOutput`].
#[derive(Debug, Clone)]
pub struct MockOutputHandle {
    state: Arc<Mutex<OutputState>>,
}

impl MockOutputHandle {
    /// Current level of the output.
    pub fn level(&self) -> Level {
        lock(&self.state).level
    }

    /// Every level written so far, in order.
    pub fn transitions(&self) -> Vec<Level> {
        lock(&self.state).transitions.clone()
    }

    /// Number of low-to-high transitions.
    pub fn activations(&self) -> usize {
        lock(&self.state).activations
    }

    /// Make every subsequent attempt to drive the output high fail.
    pub fn set_fail_on_high(&self, fail: bool) {
        lock(&self.state).fail_on_high = fail;
    }
}
