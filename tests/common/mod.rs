//! Shared fixture builders: ASCII telegrams and HDLC data-notification
//! frames with correct checksums, assembled from record/entry lists.

use p1port_rs::util::crc::crc16;

/// Builds a complete ASCII telegram with a valid checksum line.
pub fn ascii_telegram(records: &[&str]) -> Vec<u8> {
    ascii_telegram_with_banner("ELL5\\253833635_A", records)
}

pub fn ascii_telegram_with_banner(banner: &str, records: &[&str]) -> Vec<u8> {
    let mut t = Vec::new();
    t.push(b'/');
    t.extend_from_slice(banner.as_bytes());
    t.extend_from_slice(b"\r\n\r\n");
    for record in records {
        t.extend_from_slice(record.as_bytes());
        t.extend_from_slice(b"\r\n");
    }
    t.push(b'!');
    let crc = crc16(&t);
    t.extend_from_slice(format!("{crc:04X}\r\n").as_bytes());
    t
}

/// DLMS structure entry carrying a double-long-unsigned value with a
/// scaler/unit structure.
pub fn numeric_entry(obis: [u8; 6], value: u32, scaler: i8, unit: u8) -> Vec<u8> {
    let mut body = vec![0x09, 6];
    body.extend_from_slice(&obis);
    body.push(0x06);
    body.extend_from_slice(&value.to_be_bytes());
    body.extend_from_slice(&[0x02, 2, 0x0F, scaler as u8, 0x16, unit]);
    wrap_entry(body)
}

/// DLMS structure entry carrying a signed 16-bit value.
pub fn long_entry(obis: [u8; 6], value: i16, scaler: i8, unit: u8) -> Vec<u8> {
    let mut body = vec![0x09, 6];
    body.extend_from_slice(&obis);
    body.push(0x10);
    body.extend_from_slice(&value.to_be_bytes());
    body.extend_from_slice(&[0x02, 2, 0x0F, scaler as u8, 0x16, unit]);
    wrap_entry(body)
}

/// DLMS structure entry carrying a visible string.
pub fn text_entry(obis: [u8; 6], text: &str) -> Vec<u8> {
    let mut body = vec![0x09, 6];
    body.extend_from_slice(&obis);
    body.push(0x0A);
    body.push(text.len() as u8);
    body.extend_from_slice(text.as_bytes());
    wrap_entry(body)
}

/// An entry whose length prefix is valid but whose body is not decodable.
pub fn garbage_entry(len: usize) -> Vec<u8> {
    wrap_entry(vec![0x55; len])
}

fn wrap_entry(body: Vec<u8>) -> Vec<u8> {
    let mut entry = vec![0x02, body.len() as u8];
    entry.extend_from_slice(&body);
    entry
}

/// Builds a complete HDLC data-notification frame around the given entries,
/// with valid length, HCS and FCS fields.
pub fn hdlc_frame(entries: &[Vec<u8>]) -> Vec<u8> {
    // Content between the flags, checksum fields still zeroed.
    let mut content = vec![0, 0]; // format + length, fixed below
    content.extend_from_slice(&[0x03, 0x01, 0x13]); // dst, src, ctrl
    content.extend_from_slice(&[0, 0]); // HCS, fixed below
    content.extend_from_slice(&[0xE6, 0xE7, 0x00]);
    content.push(0x0F);
    content.extend_from_slice(&[0x40, 0x00, 0x00, 0x00]);
    content.push(0); // empty datetime
    content.push(0x01);
    content.push(entries.len() as u8);
    for entry in entries {
        content.extend_from_slice(entry);
    }

    let declared = content.len() + 2; // everything between the flags
    content[0] = 0xA0 | ((declared >> 8) as u8 & 0x07);
    content[1] = (declared & 0xFF) as u8;
    let hcs = crc16(&content[..5]).to_le_bytes();
    content[5] = hcs[0];
    content[6] = hcs[1];

    let fcs = crc16(&content).to_le_bytes();
    let mut frame = vec![0x7E];
    frame.extend_from_slice(&content);
    frame.extend_from_slice(&fcs);
    frame.push(0x7E);
    frame
}
