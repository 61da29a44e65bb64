//! # Byte Framer
//!
//! Turns the raw transport byte stream into complete candidate telegrams.
//! The framer owns a bounded receive buffer; a telegram whose bytes arrive
//! split across many polls is assembled incrementally, and a telegram that
//! outgrows the buffer is discarded so framing always makes forward progress.
//!
//! ASCII mode buffers one line at a time (the configured capacity bounds a
//! single line, matching the serial line discipline of the meters); completed
//! lines accumulate into the in-flight telegram. A line starting with `/`
//! opens a telegram, a `!XXXX` checksum line closes it.
//!
//! HDLC mode scans for the 0x7E flag and uses the 11-bit length of the frame
//! format field to locate the closing flag, yielding the frame in one piece.

use crate::config::ProtocolType;
use crate::constants::*;
use crate::error::P1Error;
use crate::telegram::Telegram;
use crate::util::logging::LogThrottle;
use bytes::{Buf, BytesMut};
use std::collections::VecDeque;

/// Counters for framing activity, cumulative over the framer's lifetime.
#[derive(Debug, Default, Clone, Copy)]
pub struct FramerStats {
    pub telegrams: u64,
    pub overflows: u64,
    pub discarded_bytes: u64,
}

/// Incremental telegram framer over a bounded receive buffer.
#[derive(Debug)]
pub struct TelegramFramer {
    mode: ProtocolType,
    capacity: usize,
    /// ASCII: line assembly buffer. HDLC: frame assembly buffer.
    buf: BytesMut,
    /// ASCII only: the telegram assembled from completed lines.
    pending: BytesMut,
    in_telegram: bool,
    /// Skipping the tail of a line that overflowed the buffer.
    discarding_line: bool,
    ready: VecDeque<Telegram>,
    overflows_pending: u32,
    stats: FramerStats,
    throttle: LogThrottle,
}

impl TelegramFramer {
    pub fn new(mode: ProtocolType, capacity: usize) -> Self {
        TelegramFramer {
            mode,
            capacity,
            buf: BytesMut::with_capacity(capacity),
            pending: BytesMut::new(),
            in_telegram: false,
            discarding_line: false,
            ready: VecDeque::new(),
            overflows_pending: 0,
            stats: FramerStats::default(),
            throttle: LogThrottle::new(1000, 5),
        }
    }

    /// Appends transport bytes and returns the next complete telegram, if the
    /// boundary was reached. An overflow discards only the in-flight telegram
    /// and is reported once as `Err(BufferOverflow)`.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Option<Telegram>, P1Error> {
        self.add_bytes(bytes);
        self.try_telegram()
    }

    /// Appends transport bytes without extracting anything yet.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        match self.mode {
            ProtocolType::Ascii => self.add_bytes_ascii(bytes),
            ProtocolType::Hdlc => self.add_bytes_hdlc(bytes),
        }
    }

    /// Returns the next complete telegram, a pending overflow report, or
    /// `Ok(None)` when more bytes are needed.
    pub fn try_telegram(&mut self) -> Result<Option<Telegram>, P1Error> {
        if self.mode == ProtocolType::Hdlc {
            self.scan_hdlc();
        }
        if let Some(telegram) = self.ready.pop_front() {
            return Ok(Some(telegram));
        }
        if self.overflows_pending > 0 {
            self.overflows_pending -= 1;
            return Err(P1Error::BufferOverflow {
                capacity: self.capacity,
            });
        }
        Ok(None)
    }

    /// Discards all buffered state. Statistics are kept.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.pending.clear();
        self.in_telegram = false;
        self.discarding_line = false;
        self.ready.clear();
        self.overflows_pending = 0;
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    fn record_overflow(&mut self) {
        self.stats.overflows += 1;
        self.overflows_pending += 1;
        self.stats.discarded_bytes += (self.buf.len() + self.pending.len()) as u64;
        self.buf.clear();
        self.pending.clear();
        self.in_telegram = false;
        if self.throttle.allow() {
            log::warn!(
                "receive buffer overflow (capacity {}), discarding in-flight telegram",
                self.capacity
            );
        }
    }

    // ---- ASCII framing -----------------------------------------------------

    fn add_bytes_ascii(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.discarding_line {
                if b == b'\n' {
                    self.discarding_line = false;
                }
                continue;
            }
            if self.buf.len() >= self.capacity {
                // Line longer than the buffer; drop it and the telegram it
                // belonged to, then resynchronize at the next line break.
                self.record_overflow();
                self.discarding_line = b != b'\n';
                continue;
            }
            self.buf.extend_from_slice(&[b]);
            if b == b'\n' {
                self.process_line();
            }
        }
    }

    fn process_line(&mut self) {
        let line = self.buf.split();

        if line.first() == Some(&ASCII_START_MARKER) {
            // Start marker always opens a fresh telegram, aborting any
            // half-received one.
            if self.in_telegram {
                self.stats.discarded_bytes += self.pending.len() as u64;
                if self.throttle.allow() {
                    log::warn!("new telegram start inside unfinished telegram, resyncing");
                }
            }
            self.pending.clear();
            self.pending.extend_from_slice(&line);
            self.in_telegram = true;
            return;
        }

        if !self.in_telegram {
            // Junk between telegrams.
            self.stats.discarded_bytes += line.len() as u64;
            return;
        }

        self.pending.extend_from_slice(&line);
        if self.pending.len() > ASCII_MAX_TELEGRAM_SIZE {
            self.record_overflow();
            return;
        }

        if is_checksum_line(&line) {
            self.stats.telegrams += 1;
            self.in_telegram = false;
            self.ready.push_back(Telegram::new(self.pending.split()));
        }
    }

    // ---- HDLC framing ------------------------------------------------------

    fn add_bytes_hdlc(&mut self, bytes: &[u8]) {
        if self.buf.len() + bytes.len() > self.capacity {
            self.record_overflow();
            if bytes.len() > self.capacity {
                let tail = &bytes[bytes.len() - self.capacity..];
                self.stats.discarded_bytes += (bytes.len() - tail.len()) as u64;
                self.buf.extend_from_slice(tail);
                return;
            }
        }
        self.buf.extend_from_slice(bytes);
    }

    fn scan_hdlc(&mut self) {
        loop {
            // Drop garbage ahead of the first flag.
            match self.buf.iter().position(|&b| b == HDLC_FLAG) {
                None => {
                    self.stats.discarded_bytes += self.buf.len() as u64;
                    self.buf.clear();
                    return;
                }
                Some(0) => {}
                Some(pos) => {
                    self.stats.discarded_bytes += pos as u64;
                    self.buf.advance(pos);
                }
            }

            if self.buf.len() < 3 {
                return; // Need the frame format field to learn the length.
            }

            let format = self.buf[1];
            if format & 0xF0 != HDLC_FORMAT_TYPE {
                // A stray or closing flag, not a frame start.
                self.stats.discarded_bytes += 1;
                self.buf.advance(1);
                continue;
            }

            let frame_len = (((format & 0x07) as usize) << 8) | self.buf[2] as usize;
            let total = frame_len + 2; // declared length excludes the flags

            if total < HDLC_MIN_TELEGRAM_SIZE {
                self.stats.discarded_bytes += 1;
                self.buf.advance(1);
                continue;
            }
            if total > self.capacity {
                // Declared frame can never fit; treat like an overflow and
                // keep scanning behind this flag.
                self.stats.overflows += 1;
                self.overflows_pending += 1;
                self.stats.discarded_bytes += 1;
                self.buf.advance(1);
                if self.throttle.allow() {
                    log::warn!(
                        "declared frame length {total} exceeds buffer capacity {}",
                        self.capacity
                    );
                }
                continue;
            }

            if self.buf.len() < total {
                return; // Await the rest of the frame.
            }

            let frame = self.buf.split_to(total);
            self.stats.telegrams += 1;
            self.ready.push_back(Telegram::new(frame));
        }
    }
}

/// A checksum line is `!` followed by exactly four hex digits and the line
/// terminator.
fn is_checksum_line(line: &[u8]) -> bool {
    let body = trim_line_ending(line);
    body.len() == 1 + ASCII_CHECKSUM_DIGITS
        && body[0] == ASCII_CHECKSUM_MARKER
        && body[1..].iter().all(|b| b.is_ascii_hexdigit())
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_line_detection() {
        assert!(is_checksum_line(b"!7B61\r\n"));
        assert!(is_checksum_line(b"!00ff\n"));
        assert!(!is_checksum_line(b"!7B6\r\n"));
        assert!(!is_checksum_line(b"!7B612\r\n"));
        assert!(!is_checksum_line(b"!7Z61\r\n"));
        assert!(!is_checksum_line(b"1-0:1.8.0(1.0*kWh)\r\n"));
    }

    #[test]
    fn test_junk_before_start_is_discarded() {
        let mut framer = TelegramFramer::new(ProtocolType::Ascii, 60);
        framer.add_bytes(b"garbage line\r\n");
        assert!(matches!(framer.try_telegram(), Ok(None)));
        assert!(framer.stats().discarded_bytes > 0);
    }
}
