//! # Telegram CRC16
//!
//! CRC-16/ARC as transmitted by P1 meters: polynomial 0xA001 (reflected),
//! initial value 0x0000, no final xor. The ASCII variant computes it over the
//! bytes from the start marker up to and including the checksum marker; the
//! binary variant computes it over the frame content between the flags,
//! excluding the checksum field itself.

/// Reflected CRC-16/ARC polynomial.
const CRC_POLY: u16 = 0xA001;

/// Feed a single byte into a running CRC.
pub fn crc16_update(mut crc: u16, byte: u8) -> u16 {
    crc ^= byte as u16;
    for _ in 0..8 {
        if crc & 1 != 0 {
            crc = (crc >> 1) ^ CRC_POLY;
        } else {
            crc >>= 1;
        }
    }
    crc
}

/// Calculate the CRC-16/ARC of a byte slice.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |crc, &b| crc16_update(crc, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_check_value() {
        // Standard CRC-16/ARC check value for "123456789".
        assert_eq!(crc16(b"123456789"), 0xBB3D);
    }

    #[test]
    fn test_crc16_incremental_matches_slice() {
        let data = b"/ELL5\\253833635_A\r\n\r\n1-0:1.8.0(00000671.578*kWh)\r\n!";
        let mut crc = 0u16;
        for &b in data.iter() {
            crc = crc16_update(crc, b);
        }
        assert_eq!(crc, crc16(data));
    }

    #[test]
    fn test_crc16_empty() {
        assert_eq!(crc16(&[]), 0);
    }
}
