//! # Utility Modules
//!
//! Common helpers shared by the framer, decoders and reader: the telegram
//! CRC16 routine, hex formatting for log output, and rate-limited logging.

pub mod crc;
pub mod hex;
pub mod logging;

pub use crc::{crc16, crc16_update};
pub use hex::{decode_hex, encode_hex, format_hex_compact};
pub use logging::LogThrottle;
