//! Integration tests for SerialLineCodec with Tokio streams.
//!
//! A duplex pipe stands in for the serial port: the "device" side writes
//! raw bytes, the host side reads framed lines and writes framed commands.

use futures::{SinkExt, StreamExt};
use portico_core::{Identification, Operation};
use portico_protocol::{DeviceCommand, DeviceEvent, SerialLineCodec};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::codec::{FramedRead, FramedWrite};

#[tokio::test]
async fn test_lines_arrive_in_order_across_chunks() {
    let (mut device, host) = tokio::io::duplex(64);
    let mut lines = FramedRead::new(host, SerialLineCodec::new());

    tokio::spawn(async move {
        device.write_all(b"tiempo=0001, cedula=1111").await.unwrap();
        device.write_all(b"1111, autorizado=Si, operacion=Alta\r\n").await.unwrap();
        device.write_all(b"tiempo=0002, cedula=22222222, autorizado=No, operacion=Access\r\n").await.unwrap();
    });

    let first = DeviceEvent::parse(&lines.next().await.unwrap().unwrap()).unwrap();
    let second = DeviceEvent::parse(&lines.next().await.unwrap().unwrap()).unwrap();

    assert_eq!(first.identification.as_str(), "11111111");
    assert_eq!(first.operation, Operation::Alta);
    assert_eq!(second.identification.as_str(), "22222222");
    assert!(!second.authorized);

    // Device side dropped: stream ends cleanly.
    assert!(lines.next().await.is_none());
}

#[tokio::test]
async fn test_malformed_line_does_not_end_stream() {
    let input: &[u8] = b"tiempo=0001, cedula=12345678\r\n\
        garbage\xff\xfe\r\n\
        tiempo=0003, cedula=12345678, autorizado=Si, operacion=Baja\r\n";
    let mut lines = FramedRead::new(input, SerialLineCodec::new());

    let mut parsed = Vec::new();
    let mut rejected = 0;
    while let Some(line) = lines.next().await {
        match DeviceEvent::parse(&line.unwrap()) {
            Ok(event) => parsed.push(event),
            Err(_) => rejected += 1,
        }
    }

    assert_eq!(rejected, 2);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].operation, Operation::Baja);
}

#[tokio::test]
async fn test_commands_written_back_to_back() {
    let (device, host) = tokio::io::duplex(64);
    let (_, host_write) = tokio::io::split(host);
    let mut sink = FramedWrite::new(host_write, SerialLineCodec::new());

    let id = Identification::new("49432642").unwrap();
    sink.send(DeviceCommand::Enroll(id.clone())).await.unwrap();
    sink.send(DeviceCommand::Revoke(id)).await.unwrap();

    let (mut device_read, _) = tokio::io::split(device);
    let mut buf = [0u8; 18];
    device_read.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"A49432642B49432642");
}
