//! Serial port byte source.
//!
//! The meters transmit continuously on their port at 115200 8N1 (2400 8N1 on
//! some older hardware); this side only ever reads.

use crate::error::P1Error;
use crate::transport::ByteSource;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::time::timeout;
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// A serial port opened for reading meter telegrams.
pub struct SerialSource {
    stream: SerialStream,
    port_name: String,
    read_timeout: Duration,
}

impl SerialSource {
    /// Opens `port` at `baud_rate`, 8N1.
    pub async fn connect(port: &str, baud_rate: u32) -> Result<Self, P1Error> {
        log::info!("opening serial port {port} at {baud_rate} baud");

        let stream = tokio_serial::new(port, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .open_native_async()
            .map_err(|e| P1Error::SerialPortError(format!("{port}: {e}")))?;

        Ok(SerialSource {
            stream,
            port_name: port.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    pub fn set_read_timeout(&mut self, read_timeout: Duration) {
        self.read_timeout = read_timeout;
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl ByteSource for SerialSource {
    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, P1Error> {
        match timeout(self.read_timeout, self.stream.read(buf)).await {
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(P1Error::SerialPortError(format!(
                "{}: {e}",
                self.port_name
            ))),
            // Nothing arrived in the window; not an error, the meter sends
            // telegrams on its own schedule.
            Err(_) => Ok(0),
        }
    }
}
