//! The service context shared by every entry point.
//!
//! [`Portico`] is built once at startup and owns the store, the alarm, the
//! worker pool and the serial link. Channel loops are started through it,
//! each behind its own once-only guard.

use crate::admin::EmployeeAdmin;
use crate::card_channel::CardChannel;
use crate::config::{AlarmConfig, CardReaderConfig, OutputDriver, ReaderDriver, ServiceConfig};
use crate::debounce::CardDebouncer;
use crate::error::{ServiceError, ServiceResult};
use crate::processor::{AccessDecision, AccessEventProcessor, ProcessorConfig};
use crate::serial_channel::{SerialChannel, SerialEventHandler};
use crate::worker::WorkerPool;
use chrono::NaiveDate;
use portico_core::constants::DEFAULT_RECENT_EVENTS_LIMIT;
use portico_core::{Channel, ChannelReadEvent, Identification};
use portico_hardware::mock::{MockOutput, MockRfid, MockRfidHandle};
use portico_hardware::sysfs::SysfsOutput;
use portico_hardware::{AlarmActuator, AnyOutput, AnyRfidDevice};
use portico_storage::{
    AccessEventRepository, Database, EventStatistics, EventWithEmployee,
    SqliteAccessEventRepository, SqliteEmployeeRepository,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Snapshot of what is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub card_channel_running: bool,
    pub serial_channel_running: bool,
    pub serial_connected: bool,
    pub alarm_active: bool,
}

pub struct Portico {
    config: ServiceConfig,
    db: Database,
    processor: Arc<AccessEventProcessor>,
    events: SqliteAccessEventRepository,
    admin: EmployeeAdmin,
    serial: Arc<SerialChannel>,
    workers: WorkerPool,
    card_started: AtomicBool,
    serial_started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Portico {
    /// Open the store, the alarm output and the serial link described by
    /// `config`.
    ///
    /// An unopenable serial port is not an error: the serial channel runs
    /// degraded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or if
    /// the alarm output cannot be initialized.
    pub async fn from_config(config: ServiceConfig) -> ServiceResult<Self> {
        let db = Database::new(config.database.clone()).await?;
        let output = open_output(&config.alarm)?;
        let serial = if config.serial.enabled {
            SerialChannel::open(&config.serial.port, config.serial.baud)
        } else {
            info!("serial channel disabled");
            SerialChannel::degraded(config.serial.port.clone())
        };

        Ok(Self::with_components(config, db, output, serial))
    }

    /// Assemble a service from already opened parts.
    ///
    /// Must be called from within a Tokio runtime: the worker pool is
    /// spawned here.
    pub fn with_components(
        config: ServiceConfig,
        db: Database,
        output: AnyOutput,
        serial: SerialChannel,
    ) -> Self {
        let alarm = Arc::new(AlarmActuator::new(output));
        let processor = Arc::new(AccessEventProcessor::new(
            &db,
            alarm,
            ProcessorConfig::from(&config.alarm),
        ));
        let workers = WorkerPool::spawn(
            Arc::clone(&processor),
            config.workers.pool_size,
            config.workers.queue_capacity,
        );
        let serial = Arc::new(serial);
        let admin = EmployeeAdmin::new(
            SqliteEmployeeRepository::new(db.pool().clone()),
            Arc::clone(&serial),
            config.serial.sync_pacing(),
            config.serial.sync_identification_length,
        );

        Self {
            events: SqliteAccessEventRepository::new(db.pool().clone()),
            config,
            db,
            processor,
            admin,
            serial,
            workers,
            card_started: AtomicBool::new(false),
            serial_started: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn admin(&self) -> &EmployeeAdmin {
        &self.admin
    }

    pub fn serial(&self) -> &SerialChannel {
        &self.serial
    }

    /// Start polling `reader`. Returns `false` if the card channel is
    /// disabled or was already started; `reader` is dropped in that case.
    pub fn start_card_channel(&self, reader: AnyRfidDevice) -> bool {
        let config = &self.config.card_reader;
        if !config.enabled {
            info!("card channel disabled");
            return false;
        }
        if self.card_started.swap(true, Ordering::SeqCst) {
            debug!("card channel already started");
            return false;
        }

        let channel = CardChannel::new(
            reader,
            CardDebouncer::new(config.debounce_cooldown()),
            self.workers.handle(),
            config.poll_timeout(),
            config.identification_width,
        );
        self.track(tokio::spawn(channel.run()));
        true
    }

    /// Start draining inbound serial lines. Returns `false` if already
    /// started or if the link is degraded.
    ///
    /// The guard is set by the first call whatever its outcome; a degraded
    /// link stays degraded for the life of the process.
    pub fn start_serial_channel(&self) -> bool {
        if self.serial_started.swap(true, Ordering::SeqCst) {
            debug!("serial channel already started");
            return false;
        }

        let Some(lines) = self.serial.take_lines() else {
            warn!(port = %self.serial.port(), "serial link unavailable, serial channel not started");
            return false;
        };

        let handler = SerialEventHandler::new(&self.db);
        self.track(tokio::spawn(handler.run(lines)));
        true
    }

    fn track(&self, task: JoinHandle<()>) {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(task);
    }

    /// Process one read synchronously and return the decision.
    ///
    /// Unlike the channel loops this bypasses the worker pool, so any alarm
    /// activation completes before it returns.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidInput`] for an unusable identification, or the
    /// storage error if the read could not be recorded.
    pub async fn process_event(
        &self,
        identification: &str,
        channel: Channel,
    ) -> ServiceResult<AccessDecision> {
        let identification = Identification::new(identification)?;
        self.processor
            .process(&ChannelReadEvent::new(identification, channel))
            .await
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            card_channel_running: self.card_started.load(Ordering::SeqCst),
            serial_channel_running: self.serial_started.load(Ordering::SeqCst)
                && self.serial.is_connected(),
            serial_connected: self.serial.is_connected(),
            alarm_active: self.processor.alarm().is_active(),
        }
    }

    pub async fn statistics(&self) -> ServiceResult<EventStatistics> {
        Ok(self.events.statistics().await?)
    }

    /// Newest events first; `None` means the default of 50.
    pub async fn latest_events(&self, limit: Option<i64>) -> ServiceResult<Vec<EventWithEmployee>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_EVENTS_LIMIT);
        Ok(self.events.latest(limit).await?)
    }

    /// Events on the calendar days `from` through `to`, both inclusive.
    pub async fn events_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<Vec<EventWithEmployee>> {
        Ok(self.events.find_by_date_range(from, to).await?)
    }

    /// Stop the channel loops, drain the worker queue and close the store.
    pub async fn shutdown(self) {
        let tasks = self
            .tasks
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for task in tasks {
            task.abort();
            let _ = task.await;
        }

        // Channel loops held queue handles; with them gone the pool can drain.
        self.workers.shutdown().await;

        if let Err(e) = self.processor.alarm().deactivate() {
            warn!(error = %e, "failed to clear alarm output on shutdown");
        }
        self.db.close().await;
        info!("portico stopped");
    }
}

/// Build the alarm output selected in `config`.
///
/// # Errors
///
/// [`ServiceError::Config`] if the sysfs driver has neither a value path nor
/// a pin, or the hardware error if the output cannot be initialized.
pub fn open_output(config: &AlarmConfig) -> ServiceResult<AnyOutput> {
    match config.driver {
        OutputDriver::Mock => {
            let (output, _handle) = MockOutput::new();
            Ok(AnyOutput::Mock(output))
        }
        OutputDriver::Sysfs => {
            let output = match (&config.value_path, config.gpio_pin) {
                (Some(path), _) => SysfsOutput::new(path)?,
                (None, Some(pin)) => SysfsOutput::export(pin)?,
                (None, None) => {
                    return Err(ServiceError::Config(
                        "sysfs alarm output needs gpio_pin or value_path".to_string(),
                    ));
                }
            };
            Ok(AnyOutput::Sysfs(output))
        }
    }
}

/// Open the card reader selected in `config`.
///
/// The mock driver also returns the handle that feeds it cards; it must be
/// kept alive for as long as the reader is polled.
///
/// # Errors
///
/// Returns an error if the PC/SC reader cannot be opened, or if the PC/SC
/// driver is selected in a build without the `hardware-pcsc` feature.
pub fn open_card_reader(
    config: &CardReaderConfig,
) -> ServiceResult<(AnyRfidDevice, Option<MockRfidHandle>)> {
    match config.driver {
        ReaderDriver::Mock => {
            let (reader, handle) = MockRfid::new();
            Ok((AnyRfidDevice::Mock(reader), Some(handle)))
        }
        #[cfg(feature = "hardware-pcsc")]
        ReaderDriver::Pcsc => {
            use portico_hardware::pcsc_reader::PcscReader;

            let reader = match &config.reader_name {
                Some(name) => PcscReader::open(name)?,
                None => PcscReader::open_first()?,
            };
            Ok((AnyRfidDevice::Pcsc(reader), None))
        }
        #[cfg(not(feature = "hardware-pcsc"))]
        ReaderDriver::Pcsc => Err(ServiceError::Config(
            "pcsc card reader requires the hardware-pcsc feature".to_string(),
        )),
    }
}
