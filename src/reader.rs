//! # Poll Scheduler
//!
//! [`P1Reader`] ties the pipeline together: each poll drains the byte source
//! into the framer, decodes every telegram that completed, and dispatches the
//! resulting data items to the output sink.
//!
//! Decode-path errors (overflow, checksum mismatch, parse failure) are local
//! to one telegram: they are counted, logged with throttling, and the reader
//! returns to idle for the next poll. Only transport failures propagate.

use crate::channel::{DispatchStats, Dispatcher, OutputSink};
use crate::config::P1Config;
use crate::decode::{DecoderStats, TelegramDecoder};
use crate::error::P1Error;
use crate::framer::{FramerStats, TelegramFramer};
use crate::transport::ByteSource;
use crate::util::logging::LogThrottle;
use std::time::Duration;

const READ_CHUNK_SIZE: usize = 512;

/// Where the reader is within the current poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Framing,
    Decoding,
    Dispatching,
}

/// Counters over the reader's lifetime.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReaderStats {
    pub polls: u64,
    pub bytes_read: u64,
    pub telegrams_decoded: u64,
    pub checksum_failures: u64,
    pub buffer_overflows: u64,
    pub parse_failures: u64,
}

/// Polling reader over any byte source.
pub struct P1Reader<S: ByteSource> {
    source: S,
    framer: TelegramFramer,
    decoder: TelegramDecoder,
    dispatcher: Dispatcher,
    state: PollState,
    stats: ReaderStats,
    throttle: LogThrottle,
    read_buf: Vec<u8>,
}

impl<S: ByteSource> P1Reader<S> {
    pub fn new(source: S, config: &P1Config) -> Result<Self, P1Error> {
        config.validate()?;
        Ok(P1Reader {
            source,
            framer: TelegramFramer::new(config.protocol, config.effective_buffer_size()),
            decoder: TelegramDecoder::new(config.protocol),
            dispatcher: Dispatcher::new(config)?,
            state: PollState::Idle,
            stats: ReaderStats::default(),
            throttle: LogThrottle::new(5000, 5),
            read_buf: vec![0u8; READ_CHUNK_SIZE],
        })
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    pub fn framer_stats(&self) -> FramerStats {
        self.framer.stats()
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Runs one poll cycle: read, frame, decode, dispatch. Returns after the
    /// source has nothing more to give. Only transport errors propagate.
    pub async fn poll(&mut self, sink: &mut dyn OutputSink) -> Result<(), P1Error> {
        self.stats.polls += 1;
        self.state = PollState::Framing;

        loop {
            let n = match self.source.read_bytes(&mut self.read_buf).await {
                Ok(n) => n,
                Err(e) => {
                    self.state = PollState::Idle;
                    return Err(e);
                }
            };
            if n == 0 {
                break;
            }
            self.stats.bytes_read += n as u64;
            self.framer.add_bytes(&self.read_buf[..n]);
            self.drain_telegrams(sink);
            self.state = PollState::Framing;
        }

        self.state = PollState::Idle;
        Ok(())
    }

    /// Polls forever at the given interval. Intended for the CLI; library
    /// users typically drive [`poll`](Self::poll) themselves.
    pub async fn run(
        &mut self,
        sink: &mut dyn OutputSink,
        interval: Duration,
    ) -> Result<(), P1Error> {
        loop {
            self.poll(sink).await?;
            tokio::time::sleep(interval).await;
        }
    }

    fn drain_telegrams(&mut self, sink: &mut dyn OutputSink) {
        loop {
            match self.framer.try_telegram() {
                Ok(Some(telegram)) => {
                    self.state = PollState::Decoding;
                    match self.decoder.decode(&telegram) {
                        Ok(items) => {
                            self.state = PollState::Dispatching;
                            self.stats.telegrams_decoded += 1;
                            self.dispatcher.dispatch(&items, sink);
                        }
                        Err(P1Error::ChecksumMismatch {
                            expected,
                            calculated,
                        }) => {
                            self.stats.checksum_failures += 1;
                            if self.throttle.allow() {
                                log::warn!(
                                    "dropping telegram: checksum mismatch \
                                     (expected {expected:04X}, calculated {calculated:04X})"
                                );
                            }
                        }
                        Err(e) => {
                            self.stats.parse_failures += 1;
                            if self.throttle.allow() {
                                log::warn!("dropping telegram: {e}");
                            }
                        }
                    }
                    self.decoder.reset();
                }
                Ok(None) => return,
                Err(P1Error::BufferOverflow { .. }) => {
                    // The framer already logged and resynchronized.
                    self.stats.buffer_overflows += 1;
                }
                Err(e) => {
                    self.stats.parse_failures += 1;
                    if self.throttle.allow() {
                        log::warn!("framing error: {e}");
                    }
                }
            }
        }
    }
}
