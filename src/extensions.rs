//! Seven- and fifteen-byte data extensions that may follow a position:
//! course/speed, `PHG` power-height-gain, `DFS` direction-finding signal,
//! `RNG` pre-computed range and the `CSE/SPD/BRG/NRQ` bearing block.

use serde::Serialize;

use crate::bytes::is_digits;
use crate::error::DecodeError;
use crate::packet::AprsPacket;
use crate::scanner::Scanner;
use crate::units::{M_PER_FT, M_PER_MI, MPS_PER_KNOT};

/// Movement of the station, plus direction-finding quality when an NRQ
/// block was transmitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Course {
    /// Degrees clockwise from true north.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<u16>,
    /// Meters per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Degrees, bearing to a direction-finding target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<u16>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_quality: Option<ReportQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing_accuracy: Option<BearingAccuracy>,
}

/// The `N` digit of an NRQ block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportQuality {
    Useless,
    Rated(u8),
    Manual,
}

/// The `Q` digit of an NRQ block, as an upper bound on the bearing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BearingAccuracy {
    Useless,
    LessThanDegrees(u16),
}

/// Antenna characteristics from `PHG`/`DFS`/`RNG` extensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Antenna {
    /// Watts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    /// Received signal strength in S-points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<u8>,
    /// Meters above average terrain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Decibels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directivity: Option<Directivity>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Directivity {
    Omnidirectional,
    Degrees(u16),
}

/// Try the extensions in order on the bytes following a position. A match
/// consumes its bytes; no match leaves the scanner untouched.
pub(crate) fn parse_extensions(
    scanner: &mut Scanner,
    packet: &mut AprsPacket,
) -> Result<(), DecodeError> {
    let rest = scanner.rest();

    if is_bearing_block(rest) {
        let body = scanner.take(15).expect("length checked");
        let course = packet.course_mut();
        course.direction = Some(digits3(&body[0..3]));
        course.speed = Some(f64::from(digits3(&body[4..7])) * MPS_PER_KNOT);
        course.bearing = Some(digits3(&body[8..11]));
        course.report_quality = Some(match body[12] {
            b'0' => ReportQuality::Useless,
            b'9' => ReportQuality::Manual,
            n => ReportQuality::Rated(n - b'0'),
        });
        course.range = Some(2.0_f64.powi(i32::from(body[13] - b'0')) * M_PER_MI);
        course.bearing_accuracy = Some(match body[14] {
            b'0' => BearingAccuracy::Useless,
            q => BearingAccuracy::LessThanDegrees(1u16 << (10 - u16::from(q - b'0'))),
        });
        return Ok(());
    }

    if rest.starts_with(b"PHG") && rest.len() >= 7 && rest[3].is_ascii_digit() && rest[5].is_ascii_digit()
    {
        let body = scanner.take(7).expect("length checked");
        let antenna = packet.antenna_mut();
        antenna.power = Some(f64::from(body[3] - b'0').powi(2));
        antenna.height = Some(decode_height(body[4])?);
        antenna.gain = Some(body[5] - b'0');
        antenna.directivity = Some(decode_directivity(body[6])?);
        return Ok(());
    }

    if rest.starts_with(b"DFS") && rest.len() >= 7 && rest[3].is_ascii_digit() && rest[5].is_ascii_digit()
    {
        let body = scanner.take(7).expect("length checked");
        let antenna = packet.antenna_mut();
        antenna.strength = Some(body[3] - b'0');
        antenna.height = Some(decode_height(body[4])?);
        antenna.gain = Some(body[5] - b'0');
        antenna.directivity = Some(decode_directivity(body[6])?);
        return Ok(());
    }

    if rest.starts_with(b"RNG") && rest.len() >= 7 && is_digits(&rest[3..7]) {
        let body = scanner.take(7).expect("length checked");
        packet.antenna_mut().range = Some(f64::from(digits3(&body[3..7])) * M_PER_MI);
        return Ok(());
    }

    if rest.len() >= 7 && rest[3] == b'/' && is_digits(&rest[0..3]) && is_digits(&rest[4..7]) {
        let body = scanner.take(7).expect("length checked");
        let course = packet.course_mut();
        course.direction = Some(digits3(&body[0..3]));
        course.speed = Some(f64::from(digits3(&body[4..7])) * MPS_PER_KNOT);
        return Ok(());
    }

    Ok(())
}

fn is_bearing_block(rest: &[u8]) -> bool {
    rest.len() >= 15
        && rest[3] == b'/'
        && rest[7] == b'/'
        && rest[11] == b'/'
        && is_digits(&rest[0..3])
        && is_digits(&rest[4..7])
        && is_digits(&rest[8..11])
        && is_digits(&rest[12..15])
}

/// Height code: `2^(code − '0') × 10 ft`. Codes below `0` (down to `*`) and
/// above `9` (up to `B`) extend the table to very low and very high sites.
fn decode_height(code: u8) -> Result<f64, DecodeError> {
    if !(b'*'..=b'B').contains(&code) {
        return Err(DecodeError::InvalidHeightCode(code as char));
    }
    let exponent = i32::from(code) - i32::from(b'0');
    Ok(2.0_f64.powi(exponent) * 10.0 * M_PER_FT)
}

fn decode_directivity(code: u8) -> Result<Directivity, DecodeError> {
    match code {
        b'0' => Ok(Directivity::Omnidirectional),
        b'1'..=b'8' => Ok(Directivity::Degrees(45 * u16::from(code - b'0'))),
        other => Err(DecodeError::InvalidDirectivityCode(other as char)),
    }
}

fn digits3(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |acc, &b| acc * 10 + u16::from(b - b'0'))
}
