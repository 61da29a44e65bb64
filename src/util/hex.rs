//! # Hex Encoding/Decoding Utilities
//!
//! Thin wrappers over the `hex` crate used for log output and for building
//! binary test frames.

use thiserror::Error;

/// Errors that can occur during hex operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to a lowercase hex string.
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode a hex string (whitespace tolerated) into bytes.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format bytes as space-separated uppercase hex pairs for log lines.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data = [0x7E, 0xA0, 0x10, 0x02];
        assert_eq!(encode_hex(&data), "7ea01002");
        assert_eq!(decode_hex("7E A0 10 02").unwrap(), data);
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_hex_compact(&[0x01, 0xAB]), "01 AB");
    }

    #[test]
    fn test_decode_invalid() {
        assert!(decode_hex("zz").is_err());
    }
}
