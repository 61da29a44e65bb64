//! # p1port-rs
//!
//! A Rust crate for reading smart electricity meters over the P1 port. It
//! frames, checks and decodes both telegram variants found in the field:
//!
//! - **ASCII**: line-oriented DSMR-style telegrams (`/ ... !XXXX`) with a
//!   CRC-16 transmitted as four hex digits.
//! - **HDLC**: binary DLMS data-notification frames (`7E ... 7E`) with a
//!   little-endian frame check sequence.
//!
//! Decoded readings are routed to a fixed vocabulary of named output
//! channels (cumulative and momentary energy, per-phase power, voltage and
//! current) through the [`channel::OutputSink`] trait, with base units
//! normalized to the kilo units the channels publish in.
//!
//! ## Quick start
//!
//! ```no_run
//! use p1port_rs::{connect, channel::{NumericChannel, OutputSink, TextChannel}};
//! # struct Printer;
//! # impl OutputSink for Printer {
//! #     fn numeric(&mut self, c: NumericChannel, v: f64) { println!("{} = {v}", c.name()); }
//! #     fn text(&mut self, c: TextChannel, v: &str, _internal: bool) { println!("{} = {v}", c.name()); }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), p1port_rs::error::P1Error> {
//!     let mut reader = connect("/dev/ttyUSB0", 115200).await?;
//!     let mut sink = Printer;
//!     loop {
//!         reader.poll(&mut sink).await?;
//!         tokio::time::sleep(std::time::Duration::from_millis(1000)).await;
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - `framer`: byte stream to complete telegrams, bounded buffers, resync
//! - `decode`: per-variant telegram decoders with checksum verification
//! - `channel`: output channel vocabulary, OBIS mapping table, dispatcher
//! - `reader`: the poll scheduler tying the pipeline together
//! - `transport`: the serial byte source and a scripted test source

pub mod channel;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod framer;
pub mod logging;
pub mod obis;
pub mod reader;
pub mod telegram;
pub mod transport;
pub mod util;

pub use channel::{ChannelTable, Dispatcher, NumericChannel, OutputSink, TextChannel};
pub use config::{P1Config, ProtocolType};
pub use error::P1Error;
pub use obis::ObisCode;
pub use reader::{P1Reader, PollState};
pub use telegram::{DataItem, DataValue, Telegram, Unit};
pub use transport::{ByteSource, SerialSource};

/// Opens a serial port with the default configuration (ASCII variant, all
/// channels enabled) and returns a ready reader.
pub async fn connect(port: &str, baud_rate: u32) -> Result<P1Reader<SerialSource>, P1Error> {
    connect_with_config(port, baud_rate, &P1Config::default()).await
}

/// Opens a serial port and builds a reader from an explicit configuration.
pub async fn connect_with_config(
    port: &str,
    baud_rate: u32,
    config: &P1Config,
) -> Result<P1Reader<SerialSource>, P1Error> {
    let source = SerialSource::connect(port, baud_rate).await?;
    P1Reader::new(source, config)
}
