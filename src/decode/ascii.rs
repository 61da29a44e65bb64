//! # ASCII Telegram Decoder
//!
//! Decodes line-oriented DSMR-style telegrams:
//!
//! ```text
//! /ELL5\253833635_A
//!
//! 0-0:1.0.0(210217184019W)
//! 1-0:1.8.0(00006678.394*kWh)
//! ...
//! !7B61
//! ```
//!
//! The CRC-16 covers every byte from the leading `/` through the `!`
//! inclusive; the four hex digits after `!` carry the transmitted value.
//! A record is an OBIS code followed by parenthesized value groups; each
//! group yields one data item, with `*unit` marking a group numeric.

use crate::constants::{ASCII_CHECKSUM_DIGITS, ASCII_CHECKSUM_MARKER, ASCII_START_MARKER};
use crate::decode::DecoderStats;
use crate::error::P1Error;
use crate::obis::{self, parse_obis, ObisCode};
use crate::telegram::{DataItem, Telegram, Unit};
use crate::util::crc::crc16;
use nom::{
    bytes::complete::take_while,
    character::complete::char,
    combinator::all_consuming,
    multi::many0,
    sequence::{delimited, pair},
    IResult,
};

/// Decoder progress through the most recent telegram, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsciiDecoderState {
    Idle,
    Checksum,
    Identification,
    Records,
}

#[derive(Debug)]
pub struct AsciiDecoder {
    state: AsciiDecoderState,
    stats: DecoderStats,
}

impl Default for AsciiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AsciiDecoder {
    pub fn new() -> Self {
        AsciiDecoder {
            state: AsciiDecoderState::Idle,
            stats: DecoderStats::default(),
        }
    }

    pub fn state(&self) -> AsciiDecoderState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn reset(&mut self) {
        self.state = AsciiDecoderState::Idle;
    }

    /// Decodes one complete telegram. Checksum first; on mismatch no data
    /// items are produced. Individually malformed records are skipped and
    /// counted, the remaining records still decode.
    pub fn decode(&mut self, telegram: &Telegram) -> Result<Vec<DataItem>, P1Error> {
        self.state = AsciiDecoderState::Checksum;
        let bytes = telegram.as_bytes();

        let bang = bytes
            .iter()
            .rposition(|&b| b == ASCII_CHECKSUM_MARKER)
            .ok_or_else(|| {
                P1Error::TelegramParseError("telegram has no checksum marker".into())
            })?;

        let expected = parse_checksum_token(&bytes[bang + 1..])?;
        let calculated = crc16(&bytes[..=bang]);
        if expected != calculated {
            self.stats.checksum_failures += 1;
            self.state = AsciiDecoderState::Idle;
            return Err(P1Error::ChecksumMismatch {
                expected,
                calculated,
            });
        }

        let text = std::str::from_utf8(&bytes[..bang]).map_err(|_| {
            P1Error::TelegramParseError("telegram contains invalid UTF-8".into())
        })?;

        self.state = AsciiDecoderState::Identification;
        let mut items = Vec::new();
        let mut lines = text.lines();

        match lines.next() {
            Some(banner) if banner.as_bytes().first() == Some(&ASCII_START_MARKER) => {
                items.push(DataItem::text(obis::IDENTIFICATION, banner[1..].trim()));
            }
            _ => {
                self.state = AsciiDecoderState::Idle;
                return Err(P1Error::TelegramParseError(
                    "telegram does not start with an identification line".into(),
                ));
            }
        }

        self.state = AsciiDecoderState::Records;
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((code, groups)) = parse_line(line) else {
                self.stats.malformed_records += 1;
                log::debug!("skipping malformed record: {line}");
                continue;
            };
            for group in groups {
                match decode_group(code, group) {
                    Some(item) => items.push(item),
                    None => {
                        self.stats.malformed_records += 1;
                        log::debug!("skipping malformed value group for {code}: ({group})");
                    }
                }
            }
        }

        self.stats.telegrams_decoded += 1;
        self.state = AsciiDecoderState::Idle;
        Ok(items)
    }
}

/// Parses the four hex digits transmitted after `!`.
fn parse_checksum_token(tail: &[u8]) -> Result<u16, P1Error> {
    let token = tail
        .get(..ASCII_CHECKSUM_DIGITS)
        .and_then(|t| std::str::from_utf8(t).ok())
        .ok_or_else(|| {
            P1Error::TelegramParseError("truncated checksum token".into())
        })?;
    u16::from_str_radix(token, 16)
        .map_err(|_| P1Error::TelegramParseError(format!("bad checksum token: {token}")))
}

/// nom parser for a data record: an OBIS code followed by zero or more
/// parenthesized groups. Rate-tier tariff lines carry several groups on one
/// code; each group yields its own data item.
fn parse_record(input: &str) -> IResult<&str, (ObisCode, Vec<&str>)> {
    pair(
        parse_obis,
        many0(delimited(char('('), take_while(|c| c != ')'), char(')'))),
    )(input)
}

fn parse_line(line: &str) -> Option<(ObisCode, Vec<&str>)> {
    all_consuming(parse_record)(line).ok().map(|(_, r)| r)
}

/// Decodes one value group into a data item, or `None` if malformed. A `*`
/// splits value from unit and marks the group numeric; a group without `*`
/// is carried as text.
fn decode_group(code: ObisCode, group: &str) -> Option<DataItem> {
    match group.split_once('*') {
        Some((value, unit)) => {
            let value: f64 = value.parse().ok()?;
            Some(DataItem::numeric(code, value, Unit::from_symbol(unit)))
        }
        None => Some(DataItem::text(code, group)),
    }
}
