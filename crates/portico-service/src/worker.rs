//! Bounded pool of access-processing workers.
//!
//! Read loops submit [`ChannelReadEvent`]s here instead of processing them
//! inline, so a slow store or a five-second alarm never stalls polling. The
//! queue is bounded: when it is full, [`WorkerHandle::try_submit`] fails
//! immediately and the caller drops the read.

use crate::error::{ServiceError, ServiceResult};
use crate::processor::AccessEventProcessor;
use portico_core::ChannelReadEvent;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Submission side of a [`WorkerPool`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<ChannelReadEvent>,
}

impl WorkerHandle {
    /// Queue a read without waiting.
    ///
    /// # Errors
    ///
    /// [`ServiceError::QueueFull`] when every slot is taken,
    /// [`ServiceError::PoolClosed`] after shutdown.
    pub fn try_submit(&self, read: ChannelReadEvent) -> ServiceResult<()> {
        self.tx.try_send(read).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ServiceError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => ServiceError::PoolClosed,
        })
    }
}

#[cfg(test)]
impl WorkerHandle {
    /// Handle over a bare queue, with no workers draining it.
    pub(crate) fn test_pair(capacity: usize) -> (Self, mpsc::Receiver<ChannelReadEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue a read, waiting for a free slot.
    pub(crate) async fn submit(&self, read: ChannelReadEvent) -> ServiceResult<()> {
        self.tx.send(read).await.map_err(|_| ServiceError::PoolClosed)
    }
}

/// Fixed number of tasks draining a bounded queue into the processor.
pub struct WorkerPool {
    handle: WorkerHandle,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers sharing a queue of `capacity` reads.
    ///
    /// Both values are clamped to at least one.
    pub fn spawn(processor: Arc<AccessEventProcessor>, size: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..size.max(1))
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let processor = Arc::clone(&processor);
                tokio::spawn(run_worker(worker, rx, processor))
            })
            .collect::<Vec<_>>();

        info!(workers = workers.len(), capacity = capacity.max(1), "worker pool started");

        Self {
            handle: WorkerHandle { tx },
            workers,
        }
    }

    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting reads and wait for queued ones to finish.
    ///
    /// Outstanding [`WorkerHandle`] clones keep the queue open, so they
    /// must be dropped first for this to return.
    pub async fn shutdown(self) {
        drop(self.handle);
        for worker in self.workers {
            let _ = worker.await;
        }
        info!("worker pool stopped");
    }
}

async fn run_worker(
    worker: usize,
    rx: Arc<Mutex<mpsc::Receiver<ChannelReadEvent>>>,
    processor: Arc<AccessEventProcessor>,
) {
    loop {
        // One worker waits on the queue at a time; the lock is released
        // before processing.
        let next = rx.lock().await.recv().await;
        let Some(read) = next else {
            debug!(worker, "queue closed, worker exiting");
            return;
        };

        if let Err(e) = processor.process(&read).await {
            warn!(
                worker,
                identification = %read.identification,
                channel = %read.channel,
                error = %e,
                "read not processed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ProcessorConfig;
    use portico_core::{Channel, Identification};
    use portico_hardware::mock::MockOutput;
    use portico_hardware::{AlarmActuator, AnyOutput};
    use portico_storage::{AccessEventRepository, Database, SqliteAccessEventRepository};
    use std::time::Duration;

    async fn processor(db: &Database) -> Arc<AccessEventProcessor> {
        let (output, _handle) = MockOutput::new();
        let alarm = Arc::new(AlarmActuator::new(AnyOutput::Mock(output)));
        Arc::new(AccessEventProcessor::new(db, alarm, ProcessorConfig::default()))
    }

    fn read(n: usize) -> ChannelReadEvent {
        ChannelReadEvent::new(Identification::new(format!("{n:08}")).unwrap(), Channel::Card)
    }

    #[tokio::test]
    async fn test_pool_processes_all_submitted_reads() {
        let db = Database::in_memory().await.unwrap();
        let pool = WorkerPool::spawn(processor(&db).await, 3, 16);
        let handle = pool.handle();

        for n in 0..10 {
            handle.submit(read(n)).await.unwrap();
        }
        drop(handle);
        pool.shutdown().await;

        let stats = SqliteAccessEventRepository::new(db.pool().clone())
            .statistics()
            .await
            .unwrap();
        assert_eq!(stats.total_events, 10);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_blocking() {
        let (handle, _rx) = WorkerHandle::test_pair(1);

        handle.try_submit(read(1)).unwrap();
        let err = handle.try_submit(read(2)).unwrap_err();
        assert!(matches!(err, ServiceError::QueueFull));
    }

    #[tokio::test]
    async fn test_closed_pool_rejects() {
        let (handle, rx) = WorkerHandle::test_pair(4);
        drop(rx);

        assert!(matches!(
            handle.try_submit(read(1)).unwrap_err(),
            ServiceError::PoolClosed
        ));
        assert!(matches!(
            handle.submit(read(1)).await.unwrap_err(),
            ServiceError::PoolClosed
        ));
    }

    #[tokio::test]
    async fn test_failed_read_does_not_stop_worker() {
        let db = Database::in_memory().await.unwrap();
        let pool = WorkerPool::spawn(processor(&db).await, 1, 4);
        let handle = pool.handle();
        db.close().await;

        handle.submit(read(1)).await.unwrap();
        handle.submit(read(2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(pool.workers.iter().all(|w| !w.is_finished()));

        drop(handle);
        pool.shutdown().await;
    }
}
