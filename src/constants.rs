//! P1 Protocol Constants
//!
//! This module defines constants used by the P1 telegram framer and decoders,
//! covering both the ASCII (DSMR-style) and binary (HDLC data-notification)
//! wire variants.

/// Start marker of an ASCII telegram (first byte of the identification line).
pub const ASCII_START_MARKER: u8 = b'/';

/// Checksum marker terminating an ASCII telegram, followed by 4 hex digits.
pub const ASCII_CHECKSUM_MARKER: u8 = b'!';

/// Width of the transmitted ASCII checksum token (hex digits).
pub const ASCII_CHECKSUM_DIGITS: usize = 4;

/// Default ASCII line buffer capacity, overridable via configuration.
pub const ASCII_DEFAULT_BUFFER_SIZE: usize = 60;

/// Upper bound on an assembled ASCII telegram. A transmitter that never sends
/// the checksum line hits this bound and the telegram is discarded.
pub const ASCII_MAX_TELEGRAM_SIZE: usize = 8192;

/// HDLC frame boundary flag.
pub const HDLC_FLAG: u8 = 0x7E;

/// High nibble of the HDLC frame format field (frame format type 3).
pub const HDLC_FORMAT_TYPE: u8 = 0xA0;

/// Receive buffer capacity in HDLC mode (not configurable, matches the
/// largest data-notification frames seen on the wire).
pub const HDLC_BUFFER_SIZE: usize = 4096;

/// Smallest structurally valid HDLC telegram: flags, format, addressing,
/// HCS, LLC, APDU tag, invoke id, empty datetime, array header, FCS.
pub const HDLC_MIN_TELEGRAM_SIZE: usize = 22;

/// LLC header bytes preceding the APDU.
pub const HDLC_LLC: [u8; 3] = [0xE6, 0xE7, 0x00];

/// APDU tag for a DLMS data-notification.
pub const HDLC_APDU_DATA_NOTIFICATION: u8 = 0x0F;

/// Expected invoke-id-and-priority bytes of a data-notification.
pub const HDLC_INVOKE_ID: [u8; 4] = [0x40, 0x00, 0x00, 0x00];

// DLMS type tags carried in the notification body.
pub const DLMS_TAG_ARRAY: u8 = 0x01;
pub const DLMS_TAG_STRUCT: u8 = 0x02;
pub const DLMS_TAG_DOUBLE_LONG_UNSIGNED: u8 = 0x06;
pub const DLMS_TAG_OCTET_STRING: u8 = 0x09;
pub const DLMS_TAG_VISIBLE_STRING: u8 = 0x0A;
pub const DLMS_TAG_INTEGER: u8 = 0x0F;
pub const DLMS_TAG_LONG: u8 = 0x10;
pub const DLMS_TAG_LONG_UNSIGNED: u8 = 0x12;
pub const DLMS_TAG_ENUM: u8 = 0x16;

// DLMS unit codes (IEC 62056-6-2) used by the binary variant.
pub const DLMS_UNIT_WATT: u8 = 27;
pub const DLMS_UNIT_VAR: u8 = 29;
pub const DLMS_UNIT_WATT_HOUR: u8 = 30;
pub const DLMS_UNIT_VAR_HOUR: u8 = 32;
pub const DLMS_UNIT_AMPERE: u8 = 33;
pub const DLMS_UNIT_VOLT: u8 = 35;
