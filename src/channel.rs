//! # Output Channels and Dispatch
//!
//! Decoded data items are routed to a closed vocabulary of named output
//! channels: 26 numeric electricity quantities plus the identification text
//! fields. The mapping from OBIS code to channel is a table with defaults
//! covering the Swedish utility meters, extensible for meters that report
//! per-tariff codes (e.g. `1-0:1.8.1`) instead.
//!
//! The dispatcher also normalizes units: the binary variant reports base
//! units (Wh, W, var, varh) which are divided by 1000 here, so every channel
//! publishes in the kilo units it is defined in. Voltage and current pass
//! through unchanged.

use crate::config::P1Config;
use crate::error::P1Error;
use crate::obis::{self, ObisCode};
use crate::telegram::{DataItem, DataValue, Unit};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// The numeric quantities a meter can report, in the kilo units each channel
/// publishes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericChannel {
    CumulativeActiveImport,
    CumulativeActiveExport,
    CumulativeReactiveImport,
    CumulativeReactiveExport,
    MomentaryActiveImport,
    MomentaryActiveExport,
    MomentaryReactiveImport,
    MomentaryReactiveExport,
    MomentaryActiveImportL1,
    MomentaryActiveExportL1,
    MomentaryActiveImportL2,
    MomentaryActiveExportL2,
    MomentaryActiveImportL3,
    MomentaryActiveExportL3,
    MomentaryReactiveImportL1,
    MomentaryReactiveExportL1,
    MomentaryReactiveImportL2,
    MomentaryReactiveExportL2,
    MomentaryReactiveImportL3,
    MomentaryReactiveExportL3,
    VoltageL1,
    VoltageL2,
    VoltageL3,
    CurrentL1,
    CurrentL2,
    CurrentL3,
}

impl NumericChannel {
    pub const ALL: [NumericChannel; 26] = [
        NumericChannel::CumulativeActiveImport,
        NumericChannel::CumulativeActiveExport,
        NumericChannel::CumulativeReactiveImport,
        NumericChannel::CumulativeReactiveExport,
        NumericChannel::MomentaryActiveImport,
        NumericChannel::MomentaryActiveExport,
        NumericChannel::MomentaryReactiveImport,
        NumericChannel::MomentaryReactiveExport,
        NumericChannel::MomentaryActiveImportL1,
        NumericChannel::MomentaryActiveExportL1,
        NumericChannel::MomentaryActiveImportL2,
        NumericChannel::MomentaryActiveExportL2,
        NumericChannel::MomentaryActiveImportL3,
        NumericChannel::MomentaryActiveExportL3,
        NumericChannel::MomentaryReactiveImportL1,
        NumericChannel::MomentaryReactiveExportL1,
        NumericChannel::MomentaryReactiveImportL2,
        NumericChannel::MomentaryReactiveExportL2,
        NumericChannel::MomentaryReactiveImportL3,
        NumericChannel::MomentaryReactiveExportL3,
        NumericChannel::VoltageL1,
        NumericChannel::VoltageL2,
        NumericChannel::VoltageL3,
        NumericChannel::CurrentL1,
        NumericChannel::CurrentL2,
        NumericChannel::CurrentL3,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NumericChannel::CumulativeActiveImport => "cumulative_active_import",
            NumericChannel::CumulativeActiveExport => "cumulative_active_export",
            NumericChannel::CumulativeReactiveImport => "cumulative_reactive_import",
            NumericChannel::CumulativeReactiveExport => "cumulative_reactive_export",
            NumericChannel::MomentaryActiveImport => "momentary_active_import",
            NumericChannel::MomentaryActiveExport => "momentary_active_export",
            NumericChannel::MomentaryReactiveImport => "momentary_reactive_import",
            NumericChannel::MomentaryReactiveExport => "momentary_reactive_export",
            NumericChannel::MomentaryActiveImportL1 => "momentary_active_import_l1",
            NumericChannel::MomentaryActiveExportL1 => "momentary_active_export_l1",
            NumericChannel::MomentaryActiveImportL2 => "momentary_active_import_l2",
            NumericChannel::MomentaryActiveExportL2 => "momentary_active_export_l2",
            NumericChannel::MomentaryActiveImportL3 => "momentary_active_import_l3",
            NumericChannel::MomentaryActiveExportL3 => "momentary_active_export_l3",
            NumericChannel::MomentaryReactiveImportL1 => "momentary_reactive_import_l1",
            NumericChannel::MomentaryReactiveExportL1 => "momentary_reactive_export_l1",
            NumericChannel::MomentaryReactiveImportL2 => "momentary_reactive_import_l2",
            NumericChannel::MomentaryReactiveExportL2 => "momentary_reactive_export_l2",
            NumericChannel::MomentaryReactiveImportL3 => "momentary_reactive_import_l3",
            NumericChannel::MomentaryReactiveExportL3 => "momentary_reactive_export_l3",
            NumericChannel::VoltageL1 => "voltage_l1",
            NumericChannel::VoltageL2 => "voltage_l2",
            NumericChannel::VoltageL3 => "voltage_l3",
            NumericChannel::CurrentL1 => "current_l1",
            NumericChannel::CurrentL2 => "current_l2",
            NumericChannel::CurrentL3 => "current_l3",
        }
    }

    /// The unit the channel publishes in.
    pub fn unit(&self) -> Unit {
        use NumericChannel::*;
        match self {
            CumulativeActiveImport | CumulativeActiveExport => Unit::KilowattHour,
            CumulativeReactiveImport | CumulativeReactiveExport => Unit::KilovarHour,
            MomentaryActiveImport | MomentaryActiveExport | MomentaryActiveImportL1
            | MomentaryActiveExportL1 | MomentaryActiveImportL2 | MomentaryActiveExportL2
            | MomentaryActiveImportL3 | MomentaryActiveExportL3 => Unit::Kilowatt,
            MomentaryReactiveImport | MomentaryReactiveExport | MomentaryReactiveImportL1
            | MomentaryReactiveExportL1 | MomentaryReactiveImportL2
            | MomentaryReactiveExportL2 | MomentaryReactiveImportL3
            | MomentaryReactiveExportL3 => Unit::Kilovar,
            VoltageL1 | VoltageL2 | VoltageL3 => Unit::Volt,
            CurrentL1 | CurrentL2 | CurrentL3 => Unit::Ampere,
        }
    }

    pub fn from_name(name: &str) -> Option<NumericChannel> {
        NumericChannel::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// Free-form text fields a meter reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextChannel {
    /// The identification banner (manufacturer and model line).
    MeterIdentification,
    /// The equipment/serial identifier (`0-0:96.1.1`).
    EquipmentIdentifier,
}

impl TextChannel {
    pub const ALL: [TextChannel; 2] = [
        TextChannel::MeterIdentification,
        TextChannel::EquipmentIdentifier,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TextChannel::MeterIdentification => "meter_identification",
            TextChannel::EquipmentIdentifier => "equipment_identifier",
        }
    }

    pub fn from_name(name: &str) -> Option<TextChannel> {
        TextChannel::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// OBIS code to channel mapping.
#[derive(Debug, Clone)]
pub struct ChannelTable {
    numeric: HashMap<ObisCode, NumericChannel>,
    text: HashMap<ObisCode, TextChannel>,
}

/// The default mapping used unless a custom table is supplied.
pub static DEFAULT_TABLE: Lazy<ChannelTable> = Lazy::new(ChannelTable::with_defaults);

impl ChannelTable {
    /// The standard mapping for the supported meters.
    pub fn with_defaults() -> Self {
        use NumericChannel::*;
        let mut table = ChannelTable {
            numeric: HashMap::new(),
            text: HashMap::new(),
        };
        let bind = [
            ((1, 0, 1, 8, 0), CumulativeActiveImport),
            ((1, 0, 2, 8, 0), CumulativeActiveExport),
            ((1, 0, 3, 8, 0), CumulativeReactiveImport),
            ((1, 0, 4, 8, 0), CumulativeReactiveExport),
            ((1, 0, 1, 7, 0), MomentaryActiveImport),
            ((1, 0, 2, 7, 0), MomentaryActiveExport),
            ((1, 0, 3, 7, 0), MomentaryReactiveImport),
            ((1, 0, 4, 7, 0), MomentaryReactiveExport),
            ((1, 0, 21, 7, 0), MomentaryActiveImportL1),
            ((1, 0, 22, 7, 0), MomentaryActiveExportL1),
            ((1, 0, 41, 7, 0), MomentaryActiveImportL2),
            ((1, 0, 42, 7, 0), MomentaryActiveExportL2),
            ((1, 0, 61, 7, 0), MomentaryActiveImportL3),
            ((1, 0, 62, 7, 0), MomentaryActiveExportL3),
            ((1, 0, 23, 7, 0), MomentaryReactiveImportL1),
            ((1, 0, 24, 7, 0), MomentaryReactiveExportL1),
            ((1, 0, 43, 7, 0), MomentaryReactiveImportL2),
            ((1, 0, 44, 7, 0), MomentaryReactiveExportL2),
            ((1, 0, 63, 7, 0), MomentaryReactiveImportL3),
            ((1, 0, 64, 7, 0), MomentaryReactiveExportL3),
            ((1, 0, 32, 7, 0), VoltageL1),
            ((1, 0, 52, 7, 0), VoltageL2),
            ((1, 0, 72, 7, 0), VoltageL3),
            ((1, 0, 31, 7, 0), CurrentL1),
            ((1, 0, 51, 7, 0), CurrentL2),
            ((1, 0, 71, 7, 0), CurrentL3),
        ];
        for ((a, b, c, d, e), channel) in bind {
            table.numeric.insert(ObisCode::new(a, b, c, d, e), channel);
        }
        table
            .text
            .insert(obis::IDENTIFICATION, TextChannel::MeterIdentification);
        table
            .text
            .insert(ObisCode::new(0, 0, 96, 1, 1), TextChannel::EquipmentIdentifier);
        table
    }

    /// Adds or replaces a numeric binding, e.g. routing the per-tariff code
    /// `1-0:1.8.1` to `cumulative_active_import` on meters that never report
    /// the total register.
    pub fn bind_numeric(&mut self, code: ObisCode, channel: NumericChannel) -> &mut Self {
        self.numeric.insert(code, channel);
        self
    }

    pub fn bind_text(&mut self, code: ObisCode, channel: TextChannel) -> &mut Self {
        self.text.insert(code, channel);
        self
    }

    pub fn numeric_channel(&self, code: ObisCode) -> Option<NumericChannel> {
        self.numeric.get(&code).copied()
    }

    pub fn text_channel(&self, code: ObisCode) -> Option<TextChannel> {
        self.text.get(&code).copied()
    }
}

impl Default for ChannelTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

/// Receives dispatched channel values. Implemented by whatever publishes the
/// readings (MQTT bridge, in-memory store, test recorder).
pub trait OutputSink: Send {
    fn numeric(&mut self, channel: NumericChannel, value: f64);
    /// `internal` mirrors the configuration flag for the channel; the sink
    /// decides whether such values leave the process.
    fn text(&mut self, channel: TextChannel, value: &str, internal: bool);
}

/// Counters for dispatch activity, cumulative.
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchStats {
    pub forwarded: u64,
    pub unmapped: u64,
    pub disabled: u64,
    pub malformed: u64,
}

/// Routes decoded data items to output channels.
///
/// Every value is forwarded on every telegram; there is no change detection
/// or deduplication at this layer.
#[derive(Debug)]
pub struct Dispatcher {
    table: ChannelTable,
    /// `None` enables every numeric channel.
    enabled_numeric: Option<HashSet<NumericChannel>>,
    /// Enabled text channels with their `internal` flag. `None` enables all
    /// of them, non-internal.
    enabled_text: Option<HashMap<TextChannel, bool>>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Builds a dispatcher over the default channel table.
    pub fn new(config: &P1Config) -> Result<Self, P1Error> {
        Self::with_table(config, ChannelTable::default())
    }

    pub fn with_table(config: &P1Config, table: ChannelTable) -> Result<Self, P1Error> {
        let enabled_numeric = if config.sensors.is_empty() {
            None
        } else {
            let mut set = HashSet::new();
            for name in &config.sensors {
                let channel = NumericChannel::from_name(name).ok_or_else(|| {
                    P1Error::ConfigError(format!("unknown sensor: {name}"))
                })?;
                set.insert(channel);
            }
            Some(set)
        };

        let enabled_text = if config.text_sensors.is_empty() {
            None
        } else {
            let mut map = HashMap::new();
            for sensor in &config.text_sensors {
                let channel = TextChannel::from_name(&sensor.name).ok_or_else(|| {
                    P1Error::ConfigError(format!("unknown text sensor: {}", sensor.name))
                })?;
                map.insert(channel, sensor.internal);
            }
            Some(map)
        };

        Ok(Dispatcher {
            table,
            enabled_numeric,
            enabled_text,
            stats: DispatchStats::default(),
        })
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Routes one telegram's data items to the sink.
    pub fn dispatch(&mut self, items: &[DataItem], sink: &mut dyn OutputSink) {
        for item in items {
            match &item.value {
                DataValue::Numeric { value, unit } => {
                    self.dispatch_numeric(item.code, *value, unit, sink)
                }
                DataValue::Text(text) => self.dispatch_text(item.code, text, sink),
            }
        }
    }

    fn dispatch_numeric(
        &mut self,
        code: ObisCode,
        value: f64,
        unit: &Unit,
        sink: &mut dyn OutputSink,
    ) {
        let Some(channel) = self.table.numeric_channel(code) else {
            self.stats.unmapped += 1;
            log::trace!("no channel bound to {code}");
            return;
        };
        if !self.numeric_enabled(channel) {
            self.stats.disabled += 1;
            return;
        }
        sink.numeric(channel, normalize(value, unit));
        self.stats.forwarded += 1;
    }

    fn dispatch_text(&mut self, code: ObisCode, text: &str, sink: &mut dyn OutputSink) {
        if let Some(channel) = self.table.text_channel(code) {
            match self.text_internal(channel) {
                Some(internal) => {
                    sink.text(channel, text, internal);
                    self.stats.forwarded += 1;
                }
                None => self.stats.disabled += 1,
            }
            return;
        }

        // A group without a unit suffix bound to a numeric channel still
        // carries a number on some meters.
        if let Some(channel) = self.table.numeric_channel(code) {
            if !self.numeric_enabled(channel) {
                self.stats.disabled += 1;
                return;
            }
            match text.parse::<f64>() {
                Ok(value) => {
                    sink.numeric(channel, value);
                    self.stats.forwarded += 1;
                }
                Err(_) => {
                    self.stats.malformed += 1;
                    log::debug!("non-numeric value for {}: {text}", channel.name());
                }
            }
            return;
        }

        self.stats.unmapped += 1;
        log::trace!("no channel bound to {code}");
    }

    fn numeric_enabled(&self, channel: NumericChannel) -> bool {
        match &self.enabled_numeric {
            None => true,
            Some(set) => set.contains(&channel),
        }
    }

    /// `Some(internal)` if the channel is enabled.
    fn text_internal(&self, channel: TextChannel) -> Option<bool> {
        match &self.enabled_text {
            None => Some(false),
            Some(map) => map.get(&channel).copied(),
        }
    }
}

/// Values in base units become kilo units; everything else passes through.
fn normalize(value: f64, unit: &Unit) -> f64 {
    match unit {
        Unit::WattHour | Unit::Watt | Unit::Var | Unit::VarHour => value / 1000.0,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name_round_trip() {
        for channel in NumericChannel::ALL {
            assert_eq!(NumericChannel::from_name(channel.name()), Some(channel));
        }
        for channel in TextChannel::ALL {
            assert_eq!(TextChannel::from_name(channel.name()), Some(channel));
        }
    }

    #[test]
    fn test_default_table_covers_all_numeric_channels() {
        let table = ChannelTable::with_defaults();
        let bound: HashSet<_> = NumericChannel::ALL
            .iter()
            .filter(|c| {
                table
                    .numeric
                    .values()
                    .any(|channel| channel == *c)
            })
            .collect();
        assert_eq!(bound.len(), NumericChannel::ALL.len());
    }

    #[test]
    fn test_normalize_base_units_only() {
        assert_eq!(normalize(6678394.0, &Unit::WattHour), 6678.394);
        assert_eq!(normalize(1420.0, &Unit::Watt), 1.42);
        assert_eq!(normalize(230.3, &Unit::Volt), 230.3);
        assert_eq!(normalize(1.5, &Unit::Ampere), 1.5);
        assert_eq!(normalize(6678.394, &Unit::KilowattHour), 6678.394);
    }

    #[test]
    fn test_custom_binding() {
        let mut table = ChannelTable::with_defaults();
        table.bind_numeric(
            ObisCode::new(1, 0, 1, 8, 1),
            NumericChannel::CumulativeActiveImport,
        );
        assert_eq!(
            table.numeric_channel(ObisCode::new(1, 0, 1, 8, 1)),
            Some(NumericChannel::CumulativeActiveImport)
        );
    }
}
