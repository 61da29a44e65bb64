//! # Telegram Decoders
//!
//! One decoder per wire variant. Both take a complete framed telegram,
//! verify its checksum, and produce the decoded data items. Decode errors
//! are local to the telegram: the caller drops it and keeps polling.

pub mod ascii;
pub mod hdlc;

use crate::config::ProtocolType;
use crate::error::P1Error;
use crate::telegram::{DataItem, Telegram};

pub use ascii::{AsciiDecoder, AsciiDecoderState};
pub use hdlc::{HdlcDecoder, HdlcDecoderState};

/// Counters for decoding activity, cumulative over the decoder's lifetime.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecoderStats {
    pub telegrams_decoded: u64,
    pub checksum_failures: u64,
    /// Records or entries skipped inside otherwise valid telegrams.
    pub malformed_records: u64,
}

/// Variant-selected telegram decoder.
#[derive(Debug)]
pub enum TelegramDecoder {
    Ascii(AsciiDecoder),
    Hdlc(HdlcDecoder),
}

impl TelegramDecoder {
    pub fn new(protocol: ProtocolType) -> Self {
        match protocol {
            ProtocolType::Ascii => TelegramDecoder::Ascii(AsciiDecoder::new()),
            ProtocolType::Hdlc => TelegramDecoder::Hdlc(HdlcDecoder::new()),
        }
    }

    /// Decodes one telegram into data items. Checksum verification happens
    /// before any record is parsed; a mismatch yields no items at all.
    pub fn decode(&mut self, telegram: &Telegram) -> Result<Vec<DataItem>, P1Error> {
        match self {
            TelegramDecoder::Ascii(d) => d.decode(telegram),
            TelegramDecoder::Hdlc(d) => d.decode(telegram),
        }
    }

    pub fn stats(&self) -> DecoderStats {
        match self {
            TelegramDecoder::Ascii(d) => d.stats(),
            TelegramDecoder::Hdlc(d) => d.stats(),
        }
    }

    /// Returns the decoder to its idle state, dropping partial progress.
    pub fn reset(&mut self) {
        match self {
            TelegramDecoder::Ascii(d) => d.reset(),
            TelegramDecoder::Hdlc(d) => d.reset(),
        }
    }
}
