mod common;

use common::{garbage_entry, hdlc_frame, long_entry, numeric_entry, text_entry};
use p1port_rs::config::ProtocolType;
use p1port_rs::decode::hdlc::HdlcDecoder;
use p1port_rs::error::P1Error;
use p1port_rs::framer::TelegramFramer;
use p1port_rs::obis::ObisCode;
use p1port_rs::telegram::{DataValue, Telegram, Unit};

fn frame_one(bytes: &[u8]) -> Telegram {
    let mut framer = TelegramFramer::new(ProtocolType::Hdlc, 4096);
    framer
        .feed(bytes)
        .expect("framing failed")
        .expect("no frame extracted")
}

fn unwrap_numeric(value: &DataValue) -> (f64, Unit) {
    match value {
        DataValue::Numeric { value, unit } => (*value, unit.clone()),
        other => panic!("expected a numeric value, got {other:?}"),
    }
}

#[test]
fn test_decode_full_frame() {
    let frame = hdlc_frame(&[
        numeric_entry([1, 0, 1, 8, 0, 255], 66783940, -1, 30), // 6678394.0 Wh
        numeric_entry([1, 0, 1, 7, 0, 255], 1420, 0, 27),      // 1420 W
        numeric_entry([1, 0, 32, 7, 0, 255], 2303, -1, 35),    // 230.3 V
        long_entry([1, 0, 31, 7, 0, 255], 42, -1, 33),         // 4.2 A
        text_entry([0, 0, 96, 1, 1, 255], "5123456789"),
    ]);
    let telegram = frame_one(&frame);
    let mut decoder = HdlcDecoder::new();

    let items = decoder.decode(&telegram).unwrap();
    assert_eq!(items.len(), 5);

    assert_eq!(items[0].code, ObisCode::new(1, 0, 1, 8, 0));
    let (energy, unit) = unwrap_numeric(&items[0].value);
    assert!((energy - 6678394.0).abs() < 1e-3);
    assert_eq!(unit, Unit::WattHour);

    let (voltage, unit) = unwrap_numeric(&items[2].value);
    assert!((voltage - 230.3).abs() < 1e-9);
    assert_eq!(unit, Unit::Volt);

    let (current, unit) = unwrap_numeric(&items[3].value);
    assert!((current - 4.2).abs() < 1e-9);
    assert_eq!(unit, Unit::Ampere);

    assert_eq!(items[4].value, DataValue::Text("5123456789".to_string()));

    assert_eq!(decoder.stats().telegrams_decoded, 1);
}

#[test]
fn test_negative_reactive_value() {
    let frame = hdlc_frame(&[long_entry([1, 0, 3, 7, 0, 255], -1234, 0, 29)]);
    let telegram = frame_one(&frame);

    let items = HdlcDecoder::new().decode(&telegram).unwrap();
    assert_eq!(
        items[0].value,
        DataValue::Numeric {
            value: -1234.0,
            unit: Unit::Var
        }
    );
}

#[test]
fn test_corrupt_fcs_rejected() {
    let mut frame = hdlc_frame(&[numeric_entry([1, 0, 1, 8, 0, 255], 1000, 0, 30)]);
    let len = frame.len();
    frame[len - 3] ^= 0xFF; // high FCS byte

    let telegram = frame_one(&frame);
    let mut decoder = HdlcDecoder::new();

    match decoder.decode(&telegram) {
        Err(P1Error::ChecksumMismatch { .. }) => {}
        other => panic!("expected checksum mismatch, got {other:?}"),
    }
    assert_eq!(decoder.stats().checksum_failures, 1);
}

#[test]
fn test_corrupt_payload_fails_fcs_before_parsing() {
    let mut frame = hdlc_frame(&[numeric_entry([1, 0, 1, 8, 0, 255], 1000, 0, 30)]);
    frame[20] ^= 0x01;

    let telegram = frame_one(&frame);
    assert!(matches!(
        HdlcDecoder::new().decode(&telegram),
        Err(P1Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_malformed_entry_skipped_rest_decoded() {
    let frame = hdlc_frame(&[
        numeric_entry([1, 0, 1, 8, 0, 255], 1000, 0, 30),
        garbage_entry(12),
        numeric_entry([1, 0, 32, 7, 0, 255], 2303, -1, 35),
    ]);
    let telegram = frame_one(&frame);
    let mut decoder = HdlcDecoder::new();

    let items = decoder.decode(&telegram).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].code, ObisCode::new(1, 0, 32, 7, 0));
    assert_eq!(decoder.stats().malformed_records, 1);
}

#[test]
fn test_unexpected_apdu_rejected() {
    let mut frame = hdlc_frame(&[numeric_entry([1, 0, 1, 8, 0, 255], 1, 0, 30)]);
    // Rewrite the APDU tag, then fix the FCS so only the tag is at fault.
    frame[11] = 0xC0;
    let len = frame.len();
    let fcs = p1port_rs::util::crc::crc16(&frame[1..len - 3]).to_le_bytes();
    frame[len - 3] = fcs[0];
    frame[len - 2] = fcs[1];

    let telegram = frame_one(&frame);
    assert!(matches!(
        HdlcDecoder::new().decode(&telegram),
        Err(P1Error::TelegramParseError(_))
    ));
}

#[test]
fn test_empty_notification_yields_no_items() {
    let frame = hdlc_frame(&[]);
    let telegram = frame_one(&frame);

    let items = HdlcDecoder::new().decode(&telegram).unwrap();
    assert!(items.is_empty());
}
