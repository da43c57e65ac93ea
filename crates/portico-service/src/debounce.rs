//! Duplicate-read suppression for the card reader channel.

use portico_core::Identification;
use std::time::{Duration, Instant};

/// Collapses rapid repeats of one identification into a single read.
///
/// A read is accepted when its identification differs from the last
/// accepted one, or when more than `cooldown` has passed since that
/// identification was last accepted. Rejected reads leave the state alone,
/// so holding a card on the reader does not extend the cooldown.
///
/// The debouncer is owned by the read loop and takes `&mut self`; there is
/// no internal locking.
///
/// # Examples
///
/// ```
/// use portico_core::Identification;
/// use portico_service::debounce::CardDebouncer;
/// use std::time::{Duration, Instant};
///
/// let mut debouncer = CardDebouncer::new(Duration::from_secs(5));
/// let id = Identification::new("00012345").unwrap();
/// let t0 = Instant::now();
///
/// assert!(debouncer.accept(&id, t0));
/// assert!(!debouncer.accept(&id, t0 + Duration::from_secs(2)));
/// assert!(debouncer.accept(&id, t0 + Duration::from_secs(6)));
/// ```
#[derive(Debug)]
pub struct CardDebouncer {
    cooldown: Duration,
    last: Option<(Identification, Instant)>,
}

impl CardDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decide whether the read of `identification` at `now` goes through.
    pub fn accept(&mut self, identification: &Identification, now: Instant) -> bool {
        let accepted = match &self.last {
            Some((last_id, last_at)) if last_id == identification => {
                now.saturating_duration_since(*last_at) > self.cooldown
            }
            _ => true,
        };

        if accepted {
            self.last = Some((identification.clone(), now));
        }
        accepted
    }
}
