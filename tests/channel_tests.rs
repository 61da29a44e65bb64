use p1port_rs::channel::{
    ChannelTable, Dispatcher, NumericChannel, OutputSink, TextChannel,
};
use p1port_rs::config::{P1Config, TextSensorConfig};
use p1port_rs::error::P1Error;
use p1port_rs::obis::{self, ObisCode};
use p1port_rs::telegram::{DataItem, Unit};

#[derive(Default)]
struct RecordingSink {
    numeric: Vec<(NumericChannel, f64)>,
    text: Vec<(TextChannel, String, bool)>,
}

impl OutputSink for RecordingSink {
    fn numeric(&mut self, channel: NumericChannel, value: f64) {
        self.numeric.push((channel, value));
    }

    fn text(&mut self, channel: TextChannel, value: &str, internal: bool) {
        self.text.push((channel, value.to_string(), internal));
    }
}

#[test]
fn test_base_units_normalized_to_kilo() {
    let mut dispatcher = Dispatcher::new(&P1Config::default()).unwrap();
    let mut sink = RecordingSink::default();

    let items = [
        DataItem::numeric(ObisCode::new(1, 0, 1, 8, 0), 6678394.0, Unit::WattHour),
        DataItem::numeric(ObisCode::new(1, 0, 1, 7, 0), 1420.0, Unit::Watt),
        DataItem::numeric(ObisCode::new(1, 0, 3, 7, 0), 500.0, Unit::Var),
        DataItem::numeric(ObisCode::new(1, 0, 32, 7, 0), 230.3, Unit::Volt),
        DataItem::numeric(ObisCode::new(1, 0, 31, 7, 0), 4.2, Unit::Ampere),
    ];
    dispatcher.dispatch(&items, &mut sink);

    assert_eq!(
        sink.numeric,
        vec![
            (NumericChannel::CumulativeActiveImport, 6678.394),
            (NumericChannel::MomentaryActiveImport, 1.42),
            (NumericChannel::MomentaryReactiveImport, 0.5),
            (NumericChannel::VoltageL1, 230.3),
            (NumericChannel::CurrentL1, 4.2),
        ]
    );
    assert_eq!(dispatcher.stats().forwarded, 5);
}

#[test]
fn test_kilo_units_pass_through() {
    let mut dispatcher = Dispatcher::new(&P1Config::default()).unwrap();
    let mut sink = RecordingSink::default();

    let items = [DataItem::numeric(
        ObisCode::new(1, 0, 1, 8, 0),
        6678.394,
        Unit::KilowattHour,
    )];
    dispatcher.dispatch(&items, &mut sink);
    assert_eq!(
        sink.numeric,
        vec![(NumericChannel::CumulativeActiveImport, 6678.394)]
    );
}

#[test]
fn test_text_channels_carry_internal_flag() {
    let config = P1Config {
        text_sensors: vec![
            TextSensorConfig {
                name: "meter_identification".to_string(),
                internal: true,
            },
            TextSensorConfig {
                name: "equipment_identifier".to_string(),
                internal: false,
            },
        ],
        ..Default::default()
    };
    let mut dispatcher = Dispatcher::new(&config).unwrap();
    let mut sink = RecordingSink::default();

    let items = [
        DataItem::text(obis::IDENTIFICATION, "ELL5\\253833635_A"),
        DataItem::text(ObisCode::new(0, 0, 96, 1, 1), "5123456789"),
    ];
    dispatcher.dispatch(&items, &mut sink);

    assert_eq!(
        sink.text,
        vec![
            (
                TextChannel::MeterIdentification,
                "ELL5\\253833635_A".to_string(),
                true
            ),
            (
                TextChannel::EquipmentIdentifier,
                "5123456789".to_string(),
                false
            ),
        ]
    );
}

#[test]
fn test_sensor_filter_disables_other_channels() {
    let config = P1Config {
        sensors: vec!["voltage_l1".to_string()],
        ..Default::default()
    };
    let mut dispatcher = Dispatcher::new(&config).unwrap();
    let mut sink = RecordingSink::default();

    let items = [
        DataItem::numeric(ObisCode::new(1, 0, 32, 7, 0), 230.3, Unit::Volt),
        DataItem::numeric(ObisCode::new(1, 0, 1, 8, 0), 6678.394, Unit::KilowattHour),
    ];
    dispatcher.dispatch(&items, &mut sink);

    assert_eq!(sink.numeric, vec![(NumericChannel::VoltageL1, 230.3)]);
    assert_eq!(dispatcher.stats().disabled, 1);
}

#[test]
fn test_unknown_sensor_name_rejected() {
    let config = P1Config {
        sensors: vec!["not_a_channel".to_string()],
        ..Default::default()
    };
    assert!(matches!(
        Dispatcher::new(&config),
        Err(P1Error::ConfigError(_))
    ));
}

#[test]
fn test_unmapped_code_counted() {
    let mut dispatcher = Dispatcher::new(&P1Config::default()).unwrap();
    let mut sink = RecordingSink::default();

    let items = [DataItem::numeric(
        ObisCode::new(0, 1, 24, 2, 1),
        428.255,
        Unit::Other("m3".to_string()),
    )];
    dispatcher.dispatch(&items, &mut sink);

    assert!(sink.numeric.is_empty());
    assert_eq!(dispatcher.stats().unmapped, 1);
}

#[test]
fn test_unitless_text_on_numeric_channel_parses() {
    let mut dispatcher = Dispatcher::new(&P1Config::default()).unwrap();
    let mut sink = RecordingSink::default();

    let items = [
        DataItem::text(ObisCode::new(1, 0, 32, 7, 0), "230.3"),
        DataItem::text(ObisCode::new(1, 0, 52, 7, 0), "not a number"),
    ];
    dispatcher.dispatch(&items, &mut sink);

    assert_eq!(sink.numeric, vec![(NumericChannel::VoltageL1, 230.3)]);
    assert_eq!(dispatcher.stats().malformed, 1);
}

#[test]
fn test_custom_table_binding() {
    let mut table = ChannelTable::with_defaults();
    table.bind_numeric(
        ObisCode::new(1, 0, 1, 8, 1),
        NumericChannel::CumulativeActiveImport,
    );
    let mut dispatcher = Dispatcher::with_table(&P1Config::default(), table).unwrap();
    let mut sink = RecordingSink::default();

    // A per-tariff register, as meters that never report the total emit it.
    let items = [DataItem::numeric(
        ObisCode::new(1, 0, 1, 8, 1),
        671.578,
        Unit::KilowattHour,
    )];
    dispatcher.dispatch(&items, &mut sink);
    assert_eq!(
        sink.numeric,
        vec![(NumericChannel::CumulativeActiveImport, 671.578)]
    );
}
