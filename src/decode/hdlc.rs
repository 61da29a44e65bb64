//! # HDLC Telegram Decoder
//!
//! Decodes binary data-notification frames:
//!
//! ```text
//! 7E | format len | dst src ctrl | HCS | E6 E7 00 | 0F | invoke-id(4) |
//!      datetime-len datetime | 01 count | entry* | FCS | 7E
//! ```
//!
//! Each entry is a structure `02 <body-len> <body>`; the body carries an
//! octet-string logical name (the OBIS code), a typed value, and for numeric
//! values a scaler/unit structure. The byte-count length prefix lets a
//! malformed entry be skipped without losing the rest of the telegram.
//!
//! The FCS is the same CRC-16 as the ASCII checksum, computed over every
//! byte between the flags excluding the FCS itself, stored little-endian.

use crate::constants::*;
use crate::decode::DecoderStats;
use crate::error::P1Error;
use crate::obis::ObisCode;
use crate::telegram::{DataItem, Telegram, Unit};
use crate::util::crc::crc16;
use crate::util::hex::format_hex_compact;

/// Decoder progress through the most recent telegram, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdlcDecoderState {
    Idle,
    Header,
    Entries,
}

#[derive(Debug)]
pub struct HdlcDecoder {
    state: HdlcDecoderState,
    stats: DecoderStats,
}

impl Default for HdlcDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HdlcDecoder {
    pub fn new() -> Self {
        HdlcDecoder {
            state: HdlcDecoderState::Idle,
            stats: DecoderStats::default(),
        }
    }

    pub fn state(&self) -> HdlcDecoderState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn reset(&mut self) {
        self.state = HdlcDecoderState::Idle;
    }

    /// Decodes one complete frame. The FCS is verified before anything else
    /// is parsed; a mismatch yields no data items. Individually malformed
    /// entries are skipped and counted.
    pub fn decode(&mut self, telegram: &Telegram) -> Result<Vec<DataItem>, P1Error> {
        self.state = HdlcDecoderState::Header;
        let b = telegram.as_bytes();

        let result = self.decode_inner(b);
        if let Err(P1Error::TelegramParseError(_)) = &result {
            log::debug!(
                "undecodable frame head: {}",
                format_hex_compact(&b[..b.len().min(20)])
            );
        }
        self.state = HdlcDecoderState::Idle;
        result
    }

    fn decode_inner(&mut self, b: &[u8]) -> Result<Vec<DataItem>, P1Error> {
        if b.len() < HDLC_MIN_TELEGRAM_SIZE {
            return Err(P1Error::TelegramParseError(format!(
                "frame too short: {} bytes",
                b.len()
            )));
        }
        if b[0] != HDLC_FLAG || b[b.len() - 1] != HDLC_FLAG {
            return Err(P1Error::TelegramParseError(
                "frame not delimited by flags".into(),
            ));
        }
        if b[1] & 0xF0 != HDLC_FORMAT_TYPE {
            return Err(P1Error::TelegramParseError(format!(
                "unexpected frame format field: {:02X}",
                b[1]
            )));
        }
        let declared = (((b[1] & 0x07) as usize) << 8) | b[2] as usize;
        if declared + 2 != b.len() {
            return Err(P1Error::TelegramParseError(format!(
                "declared length {declared} does not match frame of {} bytes",
                b.len()
            )));
        }

        // FCS covers everything between the flags except itself.
        let fcs_pos = b.len() - 3;
        let expected = u16::from_le_bytes([b[fcs_pos], b[fcs_pos + 1]]);
        let calculated = crc16(&b[1..fcs_pos]);
        if expected != calculated {
            self.stats.checksum_failures += 1;
            return Err(P1Error::ChecksumMismatch {
                expected,
                calculated,
            });
        }

        // Addressing (b[3..6]) and the HCS (b[6..8]) carry nothing we route
        // on; the FCS already covers them.
        if b[8..11] != HDLC_LLC {
            return Err(P1Error::TelegramParseError("unexpected LLC header".into()));
        }
        if b[11] != HDLC_APDU_DATA_NOTIFICATION {
            return Err(P1Error::TelegramParseError(format!(
                "not a data-notification APDU: tag {:02X}",
                b[11]
            )));
        }
        if b[12..16] != HDLC_INVOKE_ID {
            return Err(P1Error::TelegramParseError(
                "unexpected invoke-id-and-priority".into(),
            ));
        }

        let datetime_len = b[16] as usize;
        let mut pos = 17 + datetime_len;
        if pos + 2 > fcs_pos {
            return Err(P1Error::TelegramParseError(
                "truncated notification body".into(),
            ));
        }
        if b[pos] != DLMS_TAG_ARRAY {
            return Err(P1Error::TelegramParseError(format!(
                "notification body is not an array: tag {:02X}",
                b[pos]
            )));
        }
        let count = b[pos + 1] as usize;
        pos += 2;

        self.state = HdlcDecoderState::Entries;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            if pos + 2 > fcs_pos || b[pos] != DLMS_TAG_STRUCT {
                // Without the structure header the entry boundary is lost;
                // nothing behind this point can be trusted.
                self.stats.malformed_records += 1;
                log::debug!("entry list truncated at offset {pos}");
                break;
            }
            let body_len = b[pos + 1] as usize;
            pos += 2;
            if pos + body_len > fcs_pos {
                self.stats.malformed_records += 1;
                log::debug!("entry body overruns frame at offset {pos}");
                break;
            }
            match decode_entry(&b[pos..pos + body_len]) {
                Some(item) => items.push(item),
                None => {
                    self.stats.malformed_records += 1;
                    log::debug!("skipping malformed entry at offset {pos}");
                }
            }
            pos += body_len;
        }

        self.stats.telegrams_decoded += 1;
        Ok(items)
    }
}

/// Decodes one entry body: logical name, typed value, and for numeric types
/// the scaler/unit structure. Returns `None` for anything malformed.
fn decode_entry(body: &[u8]) -> Option<DataItem> {
    // Logical name: octet string of exactly 6 bytes. Entries without one
    // cannot be routed.
    if *body.first()? != DLMS_TAG_OCTET_STRING || *body.get(1)? != 6 {
        return None;
    }
    let code = ObisCode::from_logical_name(body.get(2..8)?).ok()?;
    let rest = &body[8..];

    let (raw, rest) = match *rest.first()? {
        DLMS_TAG_DOUBLE_LONG_UNSIGNED => {
            let v = u32::from_be_bytes(rest.get(1..5)?.try_into().ok()?);
            (v as f64, &rest[5..])
        }
        DLMS_TAG_LONG => {
            let v = i16::from_be_bytes(rest.get(1..3)?.try_into().ok()?);
            (v as f64, &rest[3..])
        }
        DLMS_TAG_LONG_UNSIGNED => {
            let v = u16::from_be_bytes(rest.get(1..3)?.try_into().ok()?);
            (v as f64, &rest[3..])
        }
        DLMS_TAG_OCTET_STRING | DLMS_TAG_VISIBLE_STRING => {
            let len = *rest.get(1)? as usize;
            let text = String::from_utf8_lossy(rest.get(2..2 + len)?).into_owned();
            if rest.len() != 2 + len {
                return None;
            }
            return Some(DataItem::text(code, text));
        }
        _ => return None,
    };

    // Scaler/unit structure: 02 02 0F <scaler> 16 <unit>. A bare numeric
    // value without it is taken as scaler 0, no unit.
    match rest {
        [] => Some(DataItem::numeric(code, raw, Unit::None)),
        [DLMS_TAG_STRUCT, 2, DLMS_TAG_INTEGER, scaler, DLMS_TAG_ENUM, unit] => {
            let value = raw * 10f64.powi(*scaler as i8 as i32);
            Some(DataItem::numeric(code, value, Unit::from_dlms(*unit)))
        }
        _ => None,
    }
}
