//! Card reader polling loop.

use crate::debounce::CardDebouncer;
use crate::error::ServiceError;
use crate::worker::WorkerHandle;
use portico_core::{Channel, ChannelReadEvent, Identification};
use portico_hardware::{AnyRfidDevice, RfidDevice};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Pause after a failed poll before trying again.
const READ_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// What a single poll produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// No card, or a read that did not yield a UID.
    NoCard,
    /// Same identification inside the cooldown.
    Suppressed(Identification),
    /// Handed to the worker pool.
    Dispatched(Identification),
    /// Accepted but the worker queue was full or closed.
    Dropped(Identification),
    /// The reader reported an error.
    Failed,
}

/// Owns the reader and the debouncer for the card channel.
///
/// The loop never processes a read itself: accepted reads go to the
/// [`WorkerHandle`] and polling resumes immediately.
pub struct CardChannel {
    reader: AnyRfidDevice,
    debouncer: CardDebouncer,
    workers: WorkerHandle,
    poll_timeout: Duration,
    identification_width: usize,
}

impl CardChannel {
    pub fn new(
        reader: AnyRfidDevice,
        debouncer: CardDebouncer,
        workers: WorkerHandle,
        poll_timeout: Duration,
        identification_width: usize,
    ) -> Self {
        Self {
            reader,
            debouncer,
            workers,
            poll_timeout,
            identification_width,
        }
    }

    /// Run one poll: read, normalize, debounce, dispatch.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let card = match self.reader.poll_card(self.poll_timeout).await {
            Ok(Some(card)) => card,
            Ok(None) => return PollOutcome::NoCard,
            Err(e) => {
                warn!(error = %e, "card read failed");
                return PollOutcome::Failed;
            }
        };

        let Some(identification) = card.identification_with_width(self.identification_width)
        else {
            debug!(uid = %card.uid_hex(), "card read produced no identification");
            return PollOutcome::NoCard;
        };

        if !self.debouncer.accept(&identification, Instant::now()) {
            debug!(identification = %identification, "duplicate read suppressed");
            return PollOutcome::Suppressed(identification);
        }

        let read = ChannelReadEvent::new(identification.clone(), Channel::Card);
        match self.workers.try_submit(read) {
            Ok(()) => {
                debug!(identification = %identification, "card read dispatched");
                PollOutcome::Dispatched(identification)
            }
            Err(ServiceError::QueueFull) => {
                warn!(identification = %identification, "worker queue full, read dropped");
                PollOutcome::Dropped(identification)
            }
            Err(e) => {
                warn!(identification = %identification, error = %e, "read dropped");
                PollOutcome::Dropped(identification)
            }
        }
    }

    /// Poll forever. Failed reads are followed by a short backoff.
    pub async fn run(mut self) {
        match self.reader.get_reader_info().await {
            Ok(info) => info!(reader = %info.name, "card channel started"),
            Err(e) => warn!(error = %e, "card channel started, reader info unavailable"),
        }

        loop {
            if self.poll_once().await == PollOutcome::Failed {
                tokio::time::sleep(READ_ERROR_BACKOFF).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_hardware::mock::{MockRfid, MockRfidHandle};
    use tokio::sync::mpsc;

    const POLL: Duration = Duration::from_millis(20);

    fn channel(capacity: usize) -> (CardChannel, MockRfidHandle, mpsc::Receiver<ChannelReadEvent>) {
        let (reader, handle) = MockRfid::new();
        let (workers, rx) = WorkerHandle::test_pair(capacity);
        let channel = CardChannel::new(
            AnyRfidDevice::Mock(reader),
            CardDebouncer::new(Duration::from_secs(5)),
            workers,
            POLL,
            8,
        );
        (channel, handle, rx)
    }

    #[tokio::test]
    async fn test_valid_read_is_dispatched_zero_padded() {
        let (mut channel, handle, mut rx) = channel(4);

        handle.present_card(vec![0x00, 0x00, 0x30, 0x39]).await.unwrap();
        let outcome = channel.poll_once().await;

        let expected = Identification::new("00012345").unwrap();
        assert_eq!(outcome, PollOutcome::Dispatched(expected.clone()));

        let read = rx.recv().await.unwrap();
        assert_eq!(read.identification, expected);
        assert_eq!(read.channel, Channel::Card);
    }

    #[tokio::test]
    async fn test_repeat_within_cooldown_is_suppressed() {
        let (mut channel, handle, mut rx) = channel(4);
        let uid = vec![0x01, 0x02, 0x03, 0x04];

        handle.present_card(uid.clone()).await.unwrap();
        handle.present_card(uid).await.unwrap();

        assert!(matches!(channel.poll_once().await, PollOutcome::Dispatched(_)));
        assert!(matches!(channel.poll_once().await, PollOutcome::Suppressed(_)));

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_and_garbled_reads_emit_nothing() {
        let (mut channel, handle, mut rx) = channel(4);

        assert_eq!(channel.poll_once().await, PollOutcome::NoCard);

        handle.present_card(vec![0x00; 4]).await.unwrap();
        assert_eq!(channel.poll_once().await, PollOutcome::NoCard);

        handle.present_card(vec![0x01]).await.unwrap();
        assert_eq!(channel.poll_once().await, PollOutcome::NoCard);

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_read_error_is_contained() {
        let (mut channel, handle, _rx) = channel(4);

        handle.fail_next_read("antenna fault").await.unwrap();
        handle.present_card(vec![0x01, 0x02, 0x03, 0x04]).await.unwrap();

        assert_eq!(channel.poll_once().await, PollOutcome::Failed);
        assert!(matches!(channel.poll_once().await, PollOutcome::Dispatched(_)));
    }

    #[tokio::test]
    async fn test_full_queue_drops_read() {
        let (mut channel, handle, _rx) = channel(1);

        handle.present_card(vec![0x01, 0x02, 0x03, 0x04]).await.unwrap();
        handle.present_card(vec![0x05, 0x06, 0x07, 0x08]).await.unwrap();

        assert!(matches!(channel.poll_once().await, PollOutcome::Dispatched(_)));
        assert!(matches!(channel.poll_once().await, PollOutcome::Dropped(_)));
    }
}
