use serde::Serialize;

use crate::base91;
use crate::error::DecodeError;
use crate::packet::AprsPacket;
use crate::scanner::Scanner;
use crate::symbol::Symbol;
use crate::units::{M_PER_FT, M_PER_MI, MPS_PER_KNOT};

/// How much of a coordinate the sender actually transmitted. Trailing
/// ambiguity spaces in the wire format reduce the precision step by step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    HundredthMinute,
    TenthMinute,
    Minute,
    TenthDegree,
    Degree,
}

/// A decoded coordinate in decimal degrees, tagged with its precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub degrees: f64,
    pub precision: Precision,
}

/// Where the station is. Maidenhead-only positions (from status reports)
/// carry no numeric coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Position {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Coordinate>,
    /// Meters above sea level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maidenhead: Option<String>,
    /// Pre-computed radio range in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
}

/// Dispatch between the two position encodings. Uncompressed latitudes start
/// with an ASCII digit; anything else is a compressed symbol-table byte.
pub(crate) fn parse_position(
    scanner: &mut Scanner,
    packet: &mut AprsPacket,
) -> Result<(), DecodeError> {
    match scanner.peek() {
        Some(b) if b.is_ascii_digit() => parse_uncompressed(scanner, packet),
        Some(_) => parse_compressed(scanner, packet),
        None => Err(DecodeError::TruncatedPosition),
    }
}

/// `DDMM.hhN/DDDMM.hhW-` with the symbol-table byte between latitude and
/// longitude and the symbol code after.
fn parse_uncompressed(scanner: &mut Scanner, packet: &mut AprsPacket) -> Result<(), DecodeError> {
    let lat = scanner.take(8).ok_or(DecodeError::TruncatedPosition)?;
    let table = scanner.take_byte().ok_or(DecodeError::TruncatedPosition)?;
    let lon = scanner.take(9).ok_or(DecodeError::TruncatedPosition)?;
    let code = scanner.take_byte().ok_or(DecodeError::TruncatedPosition)?;

    let latitude = parse_latitude(&lat[..7], lat[7])?;
    let longitude = parse_longitude(&lon[..8], lon[8])?;

    packet.symbol = Some(Symbol::from_bytes(table, code)?);
    let position = packet.position_mut();
    position.latitude = Some(latitude);
    position.longitude = Some(longitude);
    Ok(())
}

fn parse_latitude(body: &[u8], direction: u8) -> Result<Coordinate, DecodeError> {
    let sign = match direction {
        b'N' | b'n' => 1.0,
        b'S' | b's' => -1.0,
        other => return Err(DecodeError::InvalidLatitudeDirection(other as char)),
    };
    let (degrees, precision) = decode_ambiguous(body, 2)
        .ok_or_else(|| DecodeError::InvalidLatitude(String::from_utf8_lossy(body).into_owned()))?;
    if degrees > 90.0 {
        return Err(DecodeError::InvalidLatitude(
            String::from_utf8_lossy(body).into_owned(),
        ));
    }
    Ok(Coordinate {
        degrees: sign * degrees,
        precision,
    })
}

fn parse_longitude(body: &[u8], direction: u8) -> Result<Coordinate, DecodeError> {
    let sign = match direction {
        b'E' | b'e' => 1.0,
        b'W' | b'w' => -1.0,
        other => return Err(DecodeError::InvalidLongitudeDirection(other as char)),
    };
    let (degrees, precision) = decode_ambiguous(body, 3)
        .ok_or_else(|| DecodeError::InvalidLongitude(String::from_utf8_lossy(body).into_owned()))?;
    if degrees > 180.0 {
        return Err(DecodeError::InvalidLongitude(
            String::from_utf8_lossy(body).into_owned(),
        ));
    }
    Ok(Coordinate {
        degrees: sign * degrees,
        precision,
    })
}

/// Decode a `D…DMM.hh` body with `deg_digits` degree digits. The first
/// ambiguity space decides the precision; spaces are then padded with zeros
/// before the numeric parse.
fn decode_ambiguous(body: &[u8], deg_digits: usize) -> Option<(f64, Precision)> {
    let precision = match body.iter().position(|&b| b == b' ') {
        None => Precision::HundredthMinute,
        Some(idx) if idx == deg_digits + 4 => Precision::TenthMinute,
        Some(idx) if idx == deg_digits + 3 => Precision::Minute,
        Some(idx) if idx == deg_digits + 1 => Precision::TenthDegree,
        Some(idx) if idx == deg_digits => Precision::Degree,
        Some(_) => return None,
    };
    let padded: Vec<u8> = body
        .iter()
        .map(|&b| if b == b' ' { b'0' } else { b })
        .collect();
    let text = std::str::from_utf8(&padded).ok()?;
    let degrees: f64 = text[..deg_digits].parse().ok()?;
    let minutes: f64 = text[deg_digits..].parse().ok()?;
    if minutes >= 60.0 {
        return None;
    }
    Some((degrees + minutes / 60.0, precision))
}

const LAT_SCALE: f64 = 380_926.0;
const LON_SCALE: f64 = 190_463.0;

/// Base-91 compressed position: symbol table, four latitude bytes, four
/// longitude bytes, symbol code, two cs bytes and the compression type.
fn parse_compressed(scanner: &mut Scanner, packet: &mut AprsPacket) -> Result<(), DecodeError> {
    let body = scanner.take(13).ok_or(DecodeError::TruncatedPosition)?;
    let table = body[0];
    let lat_digits = &body[1..5];
    let lon_digits = &body[5..9];
    let code = body[9];
    let (c, s) = (body[10], body[11]);
    let comp_type = body[12];

    let lat_value = base91::decode(lat_digits).ok_or_else(|| {
        DecodeError::InvalidLatitude(String::from_utf8_lossy(lat_digits).into_owned())
    })?;
    let lon_value = base91::decode(lon_digits).ok_or_else(|| {
        DecodeError::InvalidLongitude(String::from_utf8_lossy(lon_digits).into_owned())
    })?;

    packet.symbol = Some(Symbol::from_bytes(table, code)?);
    let position = packet.position_mut();
    position.latitude = Some(Coordinate {
        degrees: 90.0 - f64::from(lat_value) / LAT_SCALE,
        precision: Precision::HundredthMinute,
    });
    position.longitude = Some(Coordinate {
        degrees: -180.0 + f64::from(lon_value) / LON_SCALE,
        precision: Precision::HundredthMinute,
    });

    // GGA-sourced packets (comp-type bits ???10???) put altitude into cs.
    let altitude_encoded =
        (33..=123).contains(&comp_type) && (comp_type - 33) & 0b0001_1000 == 0b0001_0000;
    if altitude_encoded {
        if let Some(cs) = base91::decode(&[c, s]) {
            packet.position_mut().altitude = Some(1.002_f64.powi(cs as i32) * M_PER_FT);
        }
    } else if c == b'{' && (33..=122).contains(&s) {
        packet.position_mut().range = Some(2.0 * 1.08_f64.powi(i32::from(s) - 33) * M_PER_MI);
    } else if (33..=122).contains(&c) && (33..=122).contains(&s) {
        let course = packet.course_mut();
        course.direction = Some(u16::from(c - 33) * 4);
        course.speed = Some((1.08_f64.powi(i32::from(s) - 33) - 1.0) * MPS_PER_KNOT);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parse(bytes: &[u8]) -> Result<AprsPacket, DecodeError> {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(bytes);
        parse_position(&mut scanner, &mut packet)?;
        Ok(packet)
    }

    #[test]
    fn uncompressed() {
        let packet = parse(b"4903.50N/07201.75W-").unwrap();
        let position = packet.position.unwrap();
        let lat = position.latitude.unwrap();
        let lon = position.longitude.unwrap();
        assert_relative_eq!(lat.degrees, 49.058333333333334);
        assert_relative_eq!(lon.degrees, -72.02916666666667);
        assert_eq!(lat.precision, Precision::HundredthMinute);
        assert_eq!(packet.symbol.unwrap().to_string(), "/-");
    }

    #[test]
    fn lower_case_directions() {
        let packet = parse(b"4903.50s/07201.75e-").unwrap();
        let position = packet.position.unwrap();
        assert!(position.latitude.unwrap().degrees < 0.0);
        assert!(position.longitude.unwrap().degrees > 0.0);
    }

    #[test]
    fn ambiguity_spaces_lower_precision() {
        let cases: &[(&[u8], Precision)] = &[
            (b"4903.5 N/07201.7 W-", Precision::TenthMinute),
            (b"4903.  N/07201.  W-", Precision::Minute),
            (b"490 .  N/0720 .  W-", Precision::TenthDegree),
            (b"49  .  N/072  .  W-", Precision::Degree),
        ];
        for (input, precision) in cases {
            let packet = parse(input).unwrap();
            let position = packet.position.unwrap();
            assert_eq!(position.latitude.unwrap().precision, *precision);
            assert_eq!(position.longitude.unwrap().precision, *precision);
        }
    }

    #[test]
    fn bad_direction_byte() {
        assert_eq!(
            parse(b"4903.50X/07201.75W-"),
            Err(DecodeError::InvalidLatitudeDirection('X'))
        );
        assert_eq!(
            parse(b"4903.50N/07201.75Q-"),
            Err(DecodeError::InvalidLongitudeDirection('Q'))
        );
    }

    #[test]
    fn out_of_range_latitude() {
        assert!(matches!(
            parse(b"9903.50N/07201.75W-"),
            Err(DecodeError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn short_input() {
        assert_eq!(parse(b"4903.50N/072"), Err(DecodeError::TruncatedPosition));
    }

    #[test]
    fn compressed_position() {
        // Worked example from the APRS 1.01 compressed format chapter.
        let packet = parse(b"/5L!!<*e7>7P[").unwrap();
        let position = packet.position.unwrap();
        assert_relative_eq!(position.latitude.unwrap().degrees, 49.5, max_relative = 1e-4);
        assert_relative_eq!(
            position.longitude.unwrap().degrees,
            -72.75,
            max_relative = 1e-4
        );
        let course = packet.course.unwrap();
        assert_eq!(course.direction, Some(88));
        assert_relative_eq!(course.speed.unwrap(), 18.6, max_relative = 0.01);
    }

    #[test]
    fn compressed_ignores_space_cs() {
        let packet = parse(b"I:!&N:;\")#  !").unwrap();
        assert!(packet.course.is_none());
        let position = packet.position.unwrap();
        assert!(position.altitude.is_none());
        assert!(position.range.is_none());
    }

    #[test]
    fn compressed_range() {
        // c = '{' switches cs into pre-computed range mode.
        let packet = parse(b"/5L!!<*e7>{?!").unwrap();
        let range = packet.position.unwrap().range.unwrap();
        assert_relative_eq!(range, 2.0 * 1.08_f64.powi(30) * M_PER_MI);
    }
}
