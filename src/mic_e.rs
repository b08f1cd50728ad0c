//! Mic-E decoder. The destination address is a steganographic channel: each
//! of its six bytes encodes a latitude digit, a message bit and one of the
//! N/S, longitude-offset and E/W flags. The information field carries the
//! longitude, speed and course as offset ASCII, then symbol bytes, an
//! optional device signature, an optional base-91 altitude and the comment.

use crate::base91;
use crate::error::DecodeError;
use crate::packet::AprsPacket;
use crate::position::{Coordinate, Precision};
use crate::scanner::Scanner;
use crate::symbol::Symbol;
use crate::units::MPS_PER_KNOT;

// Indexed by the three message bits.
const STANDARD_STATUS: [&str; 8] = [
    "Emergency",
    "Priority",
    "Special",
    "Committed",
    "Returning",
    "In Service",
    "En Route",
    "Off Duty",
];
const CUSTOM_STATUS: [&str; 8] = [
    "Custom Emergency",
    "Custom-6",
    "Custom-5",
    "Custom-4",
    "Custom-3",
    "Custom-2",
    "Custom-1",
    "Custom-0",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Custom,
    Standard,
}

/// One decoded destination byte.
struct DestByte {
    /// Latitude digit; `None` for the ambiguity bytes `K`/`L`/`Z`.
    digit: Option<u8>,
    bit: u8,
    flavor: Option<Flavor>,
}

fn decode_dest_byte(byte: u8) -> Result<DestByte, DecodeError> {
    Ok(match byte {
        b'0'..=b'9' => DestByte {
            digit: Some(byte - b'0'),
            bit: 0,
            flavor: None,
        },
        b'A'..=b'J' => DestByte {
            digit: Some(byte - b'A'),
            bit: 1,
            flavor: Some(Flavor::Custom),
        },
        b'K' => DestByte {
            digit: None,
            bit: 1,
            flavor: Some(Flavor::Custom),
        },
        b'L' => DestByte {
            digit: None,
            bit: 0,
            flavor: None,
        },
        b'P'..=b'Y' => DestByte {
            digit: Some(byte - b'P'),
            bit: 1,
            flavor: Some(Flavor::Standard),
        },
        b'Z' => DestByte {
            digit: None,
            bit: 1,
            flavor: Some(Flavor::Standard),
        },
        other => return Err(DecodeError::InvalidMicEDestination(other as char)),
    })
}

/// Destination bytes 4..6 carry a binary flag: south/zero-offset/east for
/// `0`-`9` and `L`, north/+100/west for `P`-`Z`. The custom range has no
/// flag capability there.
fn flag_bit(byte: u8) -> Result<bool, DecodeError> {
    match byte {
        b'0'..=b'9' | b'L' => Ok(false),
        b'P'..=b'Z' => Ok(true),
        other => Err(DecodeError::InvalidMicEDestination(other as char)),
    }
}

pub(crate) fn parse_mic_e(scanner: &mut Scanner, packet: &mut AprsPacket) -> Result<(), DecodeError> {
    let dest = packet.to.base().as_bytes().to_vec();
    if dest.len() != 6 {
        return Err(DecodeError::InvalidMicEDestinationLength(
            String::from_utf8_lossy(&dest).into_owned(),
        ));
    }

    let decoded: Vec<DestByte> = dest
        .iter()
        .map(|&b| decode_dest_byte(b))
        .collect::<Result<_, _>>()?;

    let north = flag_bit(dest[3])?;
    let lon_offset: i32 = if flag_bit(dest[4])? { 100 } else { 0 };
    let west = flag_bit(dest[5])?;

    let latitude = decode_latitude(&decoded, north)?;
    let info = scanner.take(8).ok_or(DecodeError::TruncatedMicE)?;
    let longitude = decode_longitude(&info[0..3], lon_offset, west)?;

    let position = packet.position_mut();
    position.latitude = Some(latitude);
    position.longitude = Some(longitude);

    decode_speed_course(&info[3..6], packet.course_mut());

    // Symbol code precedes its table in Mic-E.
    packet.symbol = Some(Symbol::from_bytes(info[7], info[6])?);

    packet.status = Some(message_status(&decoded).as_bytes().to_vec());

    let mut rest = scanner.take_rest();
    let (device, strip_back) = identify_device(rest);
    packet.device = device;
    rest = &rest[..rest.len() - strip_back];

    // Optional base-91 altitude `xxx}`, offset by 10 km.
    if rest.len() >= 4 && rest[3] == b'}' && base91::is_valid(&rest[..3]) {
        let value = base91::decode(&rest[..3]).expect("validity checked");
        packet.position_mut().altitude = Some(f64::from(value) - 10_000.0);
        rest = &rest[4..];
    }

    packet.comment = Some(rest.to_vec());
    Ok(())
}

fn decode_latitude(decoded: &[DestByte], north: bool) -> Result<Coordinate, DecodeError> {
    let trailing_spaces = decoded
        .iter()
        .rev()
        .take_while(|b| b.digit.is_none())
        .count();
    let precision = match trailing_spaces {
        0 => Precision::HundredthMinute,
        1 => Precision::TenthMinute,
        2 => Precision::Minute,
        3 => Precision::TenthDegree,
        _ => Precision::Degree,
    };

    let d: Vec<f64> = decoded
        .iter()
        .map(|b| f64::from(b.digit.unwrap_or(0)))
        .collect();
    let degrees = d[0] * 10.0 + d[1];
    let minutes = d[2] * 10.0 + d[3] + d[4] / 10.0 + d[5] / 100.0;
    let value = degrees + minutes / 60.0;
    if value > 90.0 {
        return Err(DecodeError::InvalidLatitude(format!("{value}")));
    }
    Ok(Coordinate {
        degrees: if north { value } else { -value },
        precision,
    })
}

fn decode_longitude(bytes: &[u8], offset: i32, west: bool) -> Result<Coordinate, DecodeError> {
    let mut degrees = i32::from(bytes[0]) - 28 + offset;
    if (180..=189).contains(&degrees) || (190..=199).contains(&degrees) {
        degrees -= 100;
    }
    let mut minutes = i32::from(bytes[1]) - 28;
    if minutes >= 60 {
        minutes -= 60;
    }
    let hundredths = i32::from(bytes[2]) - 28;

    let value = f64::from(degrees) + f64::from(minutes) / 60.0 + f64::from(hundredths) / 6000.0;
    if !(0.0..=180.0).contains(&value) {
        return Err(DecodeError::InvalidLongitude(format!("{value}")));
    }
    Ok(Coordinate {
        degrees: if west { -value } else { value },
        precision: Precision::HundredthMinute,
    })
}

fn decode_speed_course(bytes: &[u8], course: &mut crate::extensions::Course) {
    let mut sp = i32::from(bytes[0]) - 28;
    if sp >= 80 {
        sp -= 80;
    }
    let dc = i32::from(bytes[1]) - 28;
    let se = i32::from(bytes[2]) - 28;

    let mut speed = sp * 10 + dc / 10;
    if speed >= 800 {
        speed -= 800;
    }
    let mut direction = (dc % 10) * 100 + se;
    if direction >= 400 {
        direction -= 400;
    }

    course.speed = Some(f64::from(speed.max(0)) * MPS_PER_KNOT);
    course.direction = Some(direction.max(0) as u16);
}

fn message_status(decoded: &[DestByte]) -> &'static str {
    let index =
        usize::from(decoded[0].bit) * 4 + usize::from(decoded[1].bit) * 2 + usize::from(decoded[2].bit);
    let customs = decoded[..3]
        .iter()
        .filter(|b| b.flavor == Some(Flavor::Custom))
        .count();
    match customs {
        3 => CUSTOM_STATUS[index],
        0 => STANDARD_STATUS[index],
        _ => "Unknown",
    }
}

/// Best-effort device fingerprint from the comment edges. Returns the device
/// name and how many trailing signature bytes to strip; an unrecognized
/// shape leaves the comment untouched.
fn identify_device(rest: &[u8]) -> (Option<String>, usize) {
    let named = |s: &str, strip: usize| (Some(s.to_string()), strip);
    match rest.first() {
        None | Some(b' ') => named("Original Mic-E", 0),
        Some(b'>') => match rest.last() {
            Some(b'=') => named("Kenwood TH-D72", 1),
            Some(b'^') => named("Kenwood TH-D74", 1),
            _ => named("Kenwood TH-D7A", 0),
        },
        Some(b']') => match rest.last() {
            Some(b'=') => named("Kenwood TM-D710", 1),
            _ => named("Kenwood TM-D700", 0),
        },
        Some(b'`') if rest.len() >= 2 => {
            let device = match &rest[rest.len() - 2..] {
                b"_ " => Some("Yaesu VX-8"),
                b"_=" => Some("Yaesu FTM-350"),
                b"_#" => Some("Yaesu VX-8G"),
                b"_$" => Some("Yaesu FT1D"),
                b"_%" => Some("Yaesu FTM-400DR"),
                b"_)" => Some("Yaesu FTM-100D"),
                b"_(" => Some("Yaesu FT2D"),
                b"_0" => Some("Yaesu FT3D"),
                b"_3" => Some("Yaesu FT5D"),
                b"_1" => Some("Yaesu FTM-300D"),
                b" X" => Some("AP510"),
                b"(5" => Some("Anytone D578UV"),
                _ => None,
            };
            match device {
                Some(name) => named(name, 2),
                None => (None, 0),
            }
        }
        Some(b'\'') if rest.len() >= 2 => {
            let device = match &rest[rest.len() - 2..] {
                b"(8" => Some("Anytone D878UV"),
                b"|3" => Some("Byonics TinyTrack3"),
                b"|4" => Some("Byonics TinyTrack5"),
                b":4" => Some("P4dragon DR-7400"),
                b":8" => Some("P4dragon DR-7800"),
                _ => None,
            };
            match device {
                Some(name) => named(name, 2),
                None => (None, 0),
            }
        }
        _ => (None, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callsign::Callsign;
    use approx::assert_relative_eq;

    fn parse(dest: &str, info: &[u8]) -> Result<AprsPacket, DecodeError> {
        let mut packet = AprsPacket {
            to: Callsign::new(dest),
            ..AprsPacket::default()
        };
        let mut scanner = Scanner::new(info);
        parse_mic_e(&mut scanner, &mut packet)?;
        Ok(packet)
    }

    #[test]
    fn standard_position() {
        // 33°25.64'N 112°07.74'W, 88 knots, course 251, car symbol.
        let packet = parse("S3RUVT", b"(#f$nO>/").unwrap();
        let position = packet.position.clone().unwrap();
        assert_relative_eq!(
            position.latitude.unwrap().degrees,
            33.0 + 25.64 / 60.0,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            position.longitude.unwrap().degrees,
            -(112.0 + 7.0 / 60.0 + 74.0 / 6000.0),
            max_relative = 1e-9
        );
        let course = packet.course.clone().unwrap();
        assert_relative_eq!(course.speed.unwrap(), 88.0 * MPS_PER_KNOT);
        assert_eq!(course.direction, Some(251));
        assert_eq!(packet.symbol.unwrap().to_string(), "/>");
        assert_eq!(packet.status.as_deref(), Some(&b"In Service"[..]));
    }

    #[test]
    fn south_east_no_offset() {
        // Flag bytes from the digit range: south, no offset, east.
        let packet = parse("S3R564", b"(#f$nO>/").unwrap();
        let position = packet.position.unwrap();
        assert!(position.latitude.unwrap().degrees < 0.0);
        assert_relative_eq!(
            position.longitude.unwrap().degrees,
            12.0 + 7.0 / 60.0 + 74.0 / 6000.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn ambiguity_reduces_precision() {
        let packet = parse("S3RUVZ", b"(#f$nO>/").unwrap();
        let lat = packet.position.unwrap().latitude.unwrap();
        assert_eq!(lat.precision, Precision::TenthMinute);
        assert_relative_eq!(lat.degrees, 33.0 + 25.6 / 60.0, max_relative = 1e-9);
    }

    #[test]
    fn custom_status() {
        // All three message bytes in the custom range.
        let packet = parse("ADCUVT", b"(#f$nO>/").unwrap();
        assert_eq!(packet.status.as_deref(), Some(&b"Custom-0"[..]));
    }

    #[test]
    fn mixed_status_is_unknown() {
        // Custom byte next to a standard one.
        let packet = parse("A3RUVT", b"(#f$nO>/").unwrap();
        assert_eq!(packet.status.as_deref(), Some(&b"Unknown"[..]));
    }

    #[test]
    fn destination_must_be_six_bytes() {
        assert_eq!(
            parse("S3RUV", b"(#f$nO>/"),
            Err(DecodeError::InvalidMicEDestinationLength("S3RUV".into()))
        );
    }

    #[test]
    fn invalid_destination_byte() {
        assert_eq!(
            parse("s3RUVT", b"(#f$nO>/"),
            Err(DecodeError::InvalidMicEDestination('s'))
        );
    }

    #[test]
    fn flag_byte_without_capability() {
        assert_eq!(
            parse("S3RAVT", b"(#f$nO>/"),
            Err(DecodeError::InvalidMicEDestination('A'))
        );
    }

    #[test]
    fn short_information_field() {
        assert_eq!(parse("S3RUVT", b"(#f"), Err(DecodeError::TruncatedMicE));
    }

    #[test]
    fn altitude_and_comment() {
        let packet = parse("S3RUVT", b"(#f$nO>/\"4T}with comment").unwrap();
        assert_relative_eq!(packet.position.unwrap().altitude.unwrap(), 61.0);
        assert_eq!(packet.comment.as_deref(), Some(&b"with comment"[..]));
    }

    #[test]
    fn yaesu_device_signature() {
        let packet = parse("S3RUVT", b"(#f$nO>/`Test_%").unwrap();
        assert_eq!(packet.device.as_deref(), Some("Yaesu FTM-400DR"));
        assert_eq!(packet.comment.as_deref(), Some(&b"`Test"[..]));
    }

    #[test]
    fn kenwood_device_signature() {
        let packet = parse("S3RUVT", b"(#f$nO>/>Hello=").unwrap();
        assert_eq!(packet.device.as_deref(), Some("Kenwood TH-D72"));
        assert_eq!(packet.comment.as_deref(), Some(&b">Hello"[..]));
    }

    #[test]
    fn empty_comment_is_original_mic_e() {
        let packet = parse("S3RUVT", b"(#f$nO>/").unwrap();
        assert_eq!(packet.device.as_deref(), Some("Original Mic-E"));
        assert_eq!(packet.comment.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn unmatched_signature_leaves_device_absent() {
        let packet = parse("S3RUVT", b"(#f$nO>/`no suffix here").unwrap();
        assert!(packet.device.is_none());
        assert_eq!(packet.comment.as_deref(), Some(&b"`no suffix here"[..]));
    }
}
