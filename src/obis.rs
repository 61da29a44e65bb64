//! # OBIS-Style Codes
//!
//! Hierarchical numeric identifiers naming the physical quantity a data item
//! reports, written `A-B:C.D.E` on the ASCII wire (e.g. `1-0:1.8.0` for
//! cumulative active import energy) and carried as a 6-byte logical name in
//! the binary variant.

use crate::error::P1Error;
use nom::{
    character::complete::{char, u8 as nom_u8},
    combinator::all_consuming,
    sequence::tuple,
    IResult,
};
use std::fmt;
use std::str::FromStr;

/// A hierarchical OBIS-style code, an ordered tuple of small integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObisCode {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
}

/// Synthetic code assigned to the ASCII identification banner line, which
/// carries no code of its own on the wire.
pub const IDENTIFICATION: ObisCode = ObisCode::new(0, 0, 96, 1, 0);

impl ObisCode {
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8) -> Self {
        ObisCode { a, b, c, d, e }
    }

    /// Builds a code from the 6-byte logical name carried in binary
    /// telegrams (value groups A..F; the trailing F byte is ignored).
    pub fn from_logical_name(name: &[u8]) -> Result<Self, P1Error> {
        if name.len() != 6 {
            return Err(P1Error::InvalidObisCode(format!(
                "logical name must be 6 bytes, got {}",
                name.len()
            )));
        }
        Ok(ObisCode::new(name[0], name[1], name[2], name[3], name[4]))
    }
}

/// nom parser for an OBIS code, reusable from the ASCII line grammar.
pub fn parse_obis(input: &str) -> IResult<&str, ObisCode> {
    let (rest, (a, _, b, _, c, _, d, _, e)) = tuple((
        nom_u8,
        char('-'),
        nom_u8,
        char(':'),
        nom_u8,
        char('.'),
        nom_u8,
        char('.'),
        nom_u8,
    ))(input)?;
    Ok((rest, ObisCode::new(a, b, c, d, e)))
}

impl FromStr for ObisCode {
    type Err = P1Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(parse_obis)(s)
            .map(|(_, code)| code)
            .map_err(|_| P1Error::InvalidObisCode(s.to_string()))
    }
}

impl fmt::Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}:{}.{}.{}",
            self.a, self.b, self.c, self.d, self.e
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let code: ObisCode = "1-0:21.7.0".parse().unwrap();
        assert_eq!(code, ObisCode::new(1, 0, 21, 7, 0));
        assert_eq!(code.to_string(), "1-0:21.7.0");
    }

    #[test]
    fn test_parse_rejects_non_numeric_segments() {
        assert!("1-0:x.8.0".parse::<ObisCode>().is_err());
        assert!("1-0:1.8".parse::<ObisCode>().is_err());
        assert!("1-0:1.8.0junk".parse::<ObisCode>().is_err());
    }

    #[test]
    fn test_from_logical_name() {
        let code = ObisCode::from_logical_name(&[1, 0, 32, 7, 0, 255]).unwrap();
        assert_eq!(code, ObisCode::new(1, 0, 32, 7, 0));
        assert!(ObisCode::from_logical_name(&[1, 0, 32]).is_err());
    }
}
