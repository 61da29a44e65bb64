//! # P1 Error Handling
//!
//! This module defines the P1Error enum, which represents the different error
//! types that can occur in the p1port-rs crate.

use thiserror::Error;

/// Represents the different error types that can occur while reading the P1 port.
///
/// All decode-path errors are local to a single telegram: the poll scheduler
/// records them and returns to idle, it never terminates on them.
#[derive(Debug, Error)]
pub enum P1Error {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// Indicates that an in-flight telegram exceeded the receive buffer.
    /// The buffered bytes were discarded and framing restarted.
    #[error("Receive buffer overflow: capacity {capacity} bytes")]
    BufferOverflow { capacity: usize },

    /// Indicates that the computed telegram checksum disagrees with the
    /// transmitted value. No data items from the telegram are forwarded.
    #[error("Checksum mismatch: expected {expected:04X}, calculated {calculated:04X}")]
    ChecksumMismatch { expected: u16, calculated: u16 },

    /// Indicates a telegram whose overall structure could not be parsed.
    #[error("Error parsing telegram: {0}")]
    TelegramParseError(String),

    /// Indicates an OBIS code that could not be parsed.
    #[error("Invalid OBIS code: {0}")]
    InvalidObisCode(String),

    /// Indicates an invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A catch-all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}
