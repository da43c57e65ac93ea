//! Serial link to the access microcontroller.
//!
//! [`SerialChannel`] owns both halves of the link. The write half stays with
//! the channel and carries enroll/revoke commands; the read half is taken
//! once by the service and drained by [`SerialEventHandler::run`].
//!
//! If the port cannot be opened the channel is built in a degraded state:
//! every send fails fast with [`ServiceError::SerialUnavailable`] and there
//! is no read half to drain.

use crate::error::{ServiceError, ServiceResult};
use futures::{SinkExt, StreamExt};
use portico_core::{Channel, Identification, Operation};
use portico_protocol::{DeviceCommand, DeviceEvent, SerialLineCodec};
use portico_storage::{
    AccessEventRepository, Database, Employee, EmployeeRepository, NewAccessEvent,
    SqliteAccessEventRepository, SqliteEmployeeRepository, StorageError,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, StopBits};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Inbound line stream handed to [`SerialEventHandler::run`].
pub type SerialLines = FramedRead<BoxedReader, SerialLineCodec>;

pub struct SerialChannel {
    port: String,
    writer: Option<Mutex<FramedWrite<BoxedWriter, SerialLineCodec>>>,
    reader: std::sync::Mutex<Option<BoxedReader>>,
}

impl SerialChannel {
    /// Open `port` at `baud`, 8N1.
    ///
    /// Never fails: an unopenable port yields a degraded channel and a
    /// warning.
    pub fn open(port: &str, baud: u32) -> Self {
        let opened = tokio_serial::new(port, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .open_native_async();

        match opened {
            Ok(stream) => {
                info!(port, baud, "serial link open");
                Self::from_stream(port, stream)
            }
            Err(e) => {
                warn!(port, error = %e, "serial link unavailable, channel degraded");
                Self::degraded(port)
            }
        }
    }

    /// Wrap an already open duplex byte stream.
    pub fn from_stream<S>(port: impl Into<String>, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read, write) = tokio::io::split(stream);
        let writer: BoxedWriter = Box::new(write);
        let reader: BoxedReader = Box::new(read);

        Self {
            port: port.into(),
            writer: Some(Mutex::new(FramedWrite::new(writer, SerialLineCodec::new()))),
            reader: std::sync::Mutex::new(Some(reader)),
        }
    }

    /// A channel with no link behind it.
    pub fn degraded(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            writer: None,
            reader: std::sync::Mutex::new(None),
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Write one command. No acknowledgement is awaited.
    ///
    /// # Errors
    ///
    /// [`ServiceError::SerialUnavailable`] on a degraded channel,
    /// [`ServiceError::NotWireSafe`] for an identification the device cannot
    /// store, [`ServiceError::SerialWrite`] if the write fails.
    pub async fn send(&self, command: DeviceCommand) -> ServiceResult<()> {
        if !command.is_encodable() {
            return Err(ServiceError::NotWireSafe(command.identification().clone()));
        }
        let Some(writer) = &self.writer else {
            return Err(ServiceError::SerialUnavailable {
                port: self.port.clone(),
            });
        };

        debug!(port = %self.port, command = %command, "serial command");
        writer
            .lock()
            .await
            .send(command)
            .await
            .map_err(ServiceError::SerialWrite)
    }

    /// Send `A<identification>`.
    pub async fn enroll(&self, identification: &Identification) -> ServiceResult<()> {
        self.send(DeviceCommand::Enroll(identification.clone())).await
    }

    /// Send `B<identification>`.
    pub async fn revoke(&self, identification: &Identification) -> ServiceResult<()> {
        self.send(DeviceCommand::Revoke(identification.clone())).await
    }

    /// Take the inbound line stream. Returns `None` when degraded or when
    /// already taken.
    pub fn take_lines(&self) -> Option<SerialLines> {
        self.reader
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .map(|reader| FramedRead::new(reader, SerialLineCodec::new()))
    }
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("port", &self.port)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// What became of one inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Did not match the line grammar.
    Discarded,
    /// Event stored; any enroll/revoke side effect has been attempted.
    Recorded(DeviceEvent),
    /// Parsed, but the event could not be stored.
    Failed,
}

/// Applies inbound device events to the store.
///
/// Serial events bypass the access processor: the device has already made
/// its decision, and the line carries it.
#[derive(Debug, Clone)]
pub struct SerialEventHandler {
    employees: SqliteEmployeeRepository,
    events: SqliteAccessEventRepository,
}

impl SerialEventHandler {
    pub fn new(db: &Database) -> Self {
        Self {
            employees: SqliteEmployeeRepository::new(db.pool().clone()),
            events: SqliteAccessEventRepository::new(db.pool().clone()),
        }
    }

    pub async fn handle_line(&self, line: &str) -> LineOutcome {
        let event = match DeviceEvent::parse(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line, error = %e, "serial line discarded");
                return LineOutcome::Discarded;
            }
        };

        let record = NewAccessEvent::new(
            event.identification.clone(),
            event.authorized,
            Channel::Serial,
            event.operation,
        );
        if let Err(e) = self.events.record(&record).await {
            warn!(identification = %event.identification, error = %e, "serial event not recorded");
            return LineOutcome::Failed;
        }

        info!(
            identification = %event.identification,
            authorized = event.authorized,
            operation = %event.operation,
            token = %event.token,
            "serial event"
        );

        if event.authorized {
            self.apply_membership(&event).await;
        }
        LineOutcome::Recorded(event)
    }

    async fn apply_membership(&self, event: &DeviceEvent) {
        let id = &event.identification;
        match event.operation {
            Operation::Alta => {
                // The device knows no names; the identification stands in.
                let employee = Employee::new(id.clone(), id.as_str());
                match self.employees.insert(&employee).await {
                    Ok(()) => info!(identification = %id, "employee enrolled from device"),
                    Err(StorageError::DuplicateIdentity { .. }) => {
                        debug!(identification = %id, "already enrolled")
                    }
                    Err(e) => warn!(identification = %id, error = %e, "enrollment failed"),
                }
            }
            Operation::Baja => match self.employees.remove(id).await {
                Ok(()) => info!(identification = %id, "employee removed from device"),
                Err(StorageError::NotFound { .. }) => debug!(identification = %id, "not enrolled"),
                Err(e) => warn!(identification = %id, error = %e, "removal failed"),
            },
            Operation::Access | Operation::Modificacion => {}
        }
    }

    /// Drain `lines` until the link closes.
    pub async fn run<R>(self, mut lines: FramedRead<R, SerialLineCodec>)
    where
        R: AsyncRead + Unpin,
    {
        info!("serial channel started");
        while let Some(next) = lines.next().await {
            match next {
                Ok(line) => {
                    self.handle_line(&line).await;
                }
                Err(e) => warn!(error = %e, "serial read failed"),
            }
        }
        info!("serial link closed, serial channel stopped");
    }
}
