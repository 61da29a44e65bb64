//! Command line interface for reading and decoding P1 port telegrams.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use p1port_rs::channel::{Dispatcher, NumericChannel, OutputSink, TextChannel};
use p1port_rs::config::{P1Config, ProtocolType};
use p1port_rs::decode::TelegramDecoder;
use p1port_rs::framer::TelegramFramer;
use p1port_rs::logging;
use p1port_rs::transport::SerialSource;
use p1port_rs::reader::P1Reader;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "p1port-cli", about = "Read and decode P1 port meter telegrams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read telegrams from a serial port and print channel values.
    Read {
        /// Serial device, e.g. /dev/ttyUSB0.
        port: String,
        #[arg(long, default_value_t = 115200)]
        baud: u32,
        /// Wire variant; defaults to the config file's choice, else ascii.
        #[arg(long, value_enum)]
        protocol: Option<ProtocolArg>,
        /// ASCII line buffer capacity override.
        #[arg(long)]
        buffer_size: Option<usize>,
        /// Delay between polls in milliseconds.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// JSON configuration file; command line flags take precedence.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Decode a captured byte stream from a file.
    DecodeFile {
        path: PathBuf,
        #[arg(long, value_enum, default_value = "ascii")]
        protocol: ProtocolArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProtocolArg {
    Ascii,
    Hdlc,
}

impl From<ProtocolArg> for ProtocolType {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Ascii => ProtocolType::Ascii,
            ProtocolArg::Hdlc => ProtocolType::Hdlc,
        }
    }
}

/// Prints every dispatched value to stdout.
struct StdoutSink;

impl OutputSink for StdoutSink {
    fn numeric(&mut self, channel: NumericChannel, value: f64) {
        println!("{} = {value} {}", channel.name(), channel.unit().symbol());
    }

    fn text(&mut self, channel: TextChannel, value: &str, internal: bool) {
        if internal {
            log::debug!("{} = {value} (internal)", channel.name());
        } else {
            println!("{} = {value}", channel.name());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Command::Read {
            port,
            baud,
            protocol,
            buffer_size,
            interval_ms,
            config,
        } => {
            let mut config = match config {
                Some(path) => P1Config::from_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => P1Config::default(),
            };
            if let Some(protocol) = protocol {
                config.protocol = protocol.into();
            }
            if buffer_size.is_some() {
                config.buffer_size = buffer_size;
            }

            let source = SerialSource::connect(&port, baud)
                .await
                .with_context(|| format!("opening {port}"))?;
            let mut reader = P1Reader::new(source, &config)?;
            let mut sink = StdoutSink;

            logging::log_info(&format!(
                "polling {port} every {interval_ms} ms ({:?} variant)",
                config.protocol
            ));

            reader
                .run(&mut sink, Duration::from_millis(interval_ms))
                .await?;
            Ok(())
        }
        Command::DecodeFile { path, protocol } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("reading {}", path.display()))?;

            let config = P1Config {
                protocol: protocol.into(),
                ..Default::default()
            };
            let mut framer =
                TelegramFramer::new(config.protocol, config.effective_buffer_size());
            let mut decoder = TelegramDecoder::new(config.protocol);
            let mut dispatcher = Dispatcher::new(&config)?;
            let mut sink = StdoutSink;

            framer.add_bytes(&bytes);
            loop {
                match framer.try_telegram() {
                    Ok(Some(telegram)) => match decoder.decode(&telegram) {
                        Ok(items) => dispatcher.dispatch(&items, &mut sink),
                        Err(e) => eprintln!("telegram dropped: {e}"),
                    },
                    Ok(None) => break,
                    Err(e) => eprintln!("framing: {e}"),
                }
            }

            let decoded = decoder.stats();
            eprintln!(
                "{} telegram(s) decoded, {} checksum failure(s), {} malformed record(s)",
                decoded.telegrams_decoded, decoded.checksum_failures, decoded.malformed_records
            );
            Ok(())
        }
    }
}
