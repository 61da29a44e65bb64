//! # Reader Configuration
//!
//! The configuration surface is fixed once at startup and handed into the
//! reader by value: protocol variant, receive buffer capacity, and the set of
//! active output channels. There is no runtime protocol switching.

use crate::constants::{ASCII_DEFAULT_BUFFER_SIZE, HDLC_BUFFER_SIZE};
use crate::error::P1Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Wire variant emitted by the meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolType {
    /// Line-oriented DSMR-style telegrams (`/ ... !XXXX`).
    #[default]
    Ascii,
    /// Binary HDLC data-notification frames (`7E ... 7E`).
    Hdlc,
}

/// Configuration for a single text channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSensorConfig {
    /// Channel name, e.g. `meter_identification`.
    pub name: String,
    /// Marked internal-only; the output sink decides what that means.
    #[serde(default)]
    pub internal: bool,
}

/// Immutable reader configuration, constructed once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct P1Config {
    /// Wire variant; selects the decoder and the default buffer capacity.
    #[serde(default)]
    pub protocol: ProtocolType,

    /// Overrides the ASCII line buffer capacity only. The HDLC buffer is
    /// always [`HDLC_BUFFER_SIZE`].
    #[serde(default)]
    pub buffer_size: Option<usize>,

    /// Numeric channels to enable by name. Empty enables all of them.
    #[serde(default)]
    pub sensors: Vec<String>,

    /// Text channels to enable. Empty enables all, non-internal.
    #[serde(default)]
    pub text_sensors: Vec<TextSensorConfig>,
}

impl P1Config {
    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, P1Error> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| P1Error::ConfigError(e.to_string()))?;
        let config: P1Config =
            serde_json::from_str(&raw).map_err(|e| P1Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), P1Error> {
        if let Some(size) = self.buffer_size {
            // The line buffer must at least hold a checksum line ("!XXXX\r\n").
            if size < 16 {
                return Err(P1Error::ConfigError(format!(
                    "buffer_size {size} is too small (minimum 16)"
                )));
            }
        }
        Ok(())
    }

    /// Receive buffer capacity for the configured protocol.
    pub fn effective_buffer_size(&self) -> usize {
        match self.protocol {
            ProtocolType::Ascii => self.buffer_size.unwrap_or(ASCII_DEFAULT_BUFFER_SIZE),
            ProtocolType::Hdlc => HDLC_BUFFER_SIZE,
        }
    }
}
