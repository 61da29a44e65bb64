//! # Telegrams and Decoded Data Items
//!
//! A [`Telegram`] is one complete framed transmission extracted by the
//! framer; it is handed to a decoder and discarded, never retained across
//! polls. Decoding produces [`DataItem`]s: immutable (code, value) pairs.

use crate::constants::*;
use crate::obis::ObisCode;
use bytes::BytesMut;

/// One complete framed transmission from the meter, bounded by the
/// variant-specific start and end markers, checksum still unverified.
#[derive(Debug)]
pub struct Telegram {
    bytes: BytesMut,
}

impl Telegram {
    pub(crate) fn new(bytes: BytesMut) -> Self {
        Telegram { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A single decoded (code, value) pair extracted from a telegram.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    pub code: ObisCode,
    pub value: DataValue,
}

impl DataItem {
    pub fn numeric(code: ObisCode, value: f64, unit: Unit) -> Self {
        DataItem {
            code,
            value: DataValue::Numeric { value, unit },
        }
    }

    pub fn text(code: ObisCode, value: impl Into<String>) -> Self {
        DataItem {
            code,
            value: DataValue::Text(value.into()),
        }
    }
}

/// The value of a data item: a scaled decimal with its wire unit, or a
/// free-form string for identification/text fields.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Numeric { value: f64, unit: Unit },
    Text(String),
}

/// Unit tag attached to a numeric value, as declared on the wire.
///
/// The ASCII variant spells units out (`*kWh`); the binary variant carries
/// DLMS unit codes and a scaler. Base units (Wh, W, var, varh) are divided
/// by 1000 at dispatch so both variants publish in the kilo units the
/// channel vocabulary is defined in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    WattHour,
    KilowattHour,
    Watt,
    Kilowatt,
    Var,
    Kilovar,
    VarHour,
    KilovarHour,
    Volt,
    Ampere,
    None,
    Other(String),
}

impl Unit {
    /// Parses an ASCII unit suffix (the text after `*` in a value group).
    pub fn from_symbol(symbol: &str) -> Unit {
        match symbol {
            "Wh" => Unit::WattHour,
            "kWh" => Unit::KilowattHour,
            "W" => Unit::Watt,
            "kW" => Unit::Kilowatt,
            "var" => Unit::Var,
            "kvar" => Unit::Kilovar,
            "varh" => Unit::VarHour,
            "kvarh" => Unit::KilovarHour,
            "V" => Unit::Volt,
            "A" => Unit::Ampere,
            "" => Unit::None,
            other => Unit::Other(other.to_string()),
        }
    }

    /// Maps a DLMS unit code from the binary variant.
    pub fn from_dlms(code: u8) -> Unit {
        match code {
            DLMS_UNIT_WATT => Unit::Watt,
            DLMS_UNIT_VAR => Unit::Var,
            DLMS_UNIT_WATT_HOUR => Unit::WattHour,
            DLMS_UNIT_VAR_HOUR => Unit::VarHour,
            DLMS_UNIT_AMPERE => Unit::Ampere,
            DLMS_UNIT_VOLT => Unit::Volt,
            other => Unit::Other(format!("dlms-{other}")),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Unit::WattHour => "Wh",
            Unit::KilowattHour => "kWh",
            Unit::Watt => "W",
            Unit::Kilowatt => "kW",
            Unit::Var => "var",
            Unit::Kilovar => "kvar",
            Unit::VarHour => "varh",
            Unit::KilovarHour => "kvarh",
            Unit::Volt => "V",
            Unit::Ampere => "A",
            Unit::None => "",
            Unit::Other(s) => s,
        }
    }
}
