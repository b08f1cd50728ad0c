use std::str::FromStr;

use serde::Serialize;

use crate::bytes::{serialize_lossy, serialize_lossy_opt};
use crate::callsign::Callsign;
use crate::comment;
use crate::error::{DecodeError, ParseError};
use crate::extensions::{self, Antenna, Course};
use crate::message::{self, Message};
use crate::mic_e;
use crate::object::{self, Target};
use crate::position::Position;
use crate::scanner::Scanner;
use crate::status;
use crate::symbol::Symbol;
use crate::telemetry::{self, Telemetry};
use crate::timestamp::Timestamp;
use crate::weather::{self, Weather};

/// One parsed APRS frame. Absent fields were not present in the packet.
///
/// Free-text fields that the wire format does not constrain to UTF-8
/// (`status`, `comment`, message bytes) are kept as raw bytes and never
/// re-encoded; they serialize lossily for JSON export.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AprsPacket {
    /// The exact input bytes.
    #[serde(serialize_with = "serialize_lossy")]
    pub raw: Vec<u8>,
    pub from: Callsign,
    pub to: Callsign,
    /// Digipeater path, APRS-IS q-construct tokens stripped.
    pub via: Vec<Callsign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antenna: Option<Antenna>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Telemetry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(serialize_with = "serialize_lossy_opt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Vec<u8>>,
    /// Sender device identified from a Mic-E signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_gps: Option<String>,
    #[serde(serialize_with = "serialize_lossy_opt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<Vec<u8>>,
}

impl AprsPacket {
    pub(crate) fn position_mut(&mut self) -> &mut Position {
        self.position.get_or_insert_with(Position::default)
    }

    pub(crate) fn course_mut(&mut self) -> &mut Course {
        self.course.get_or_insert_with(Course::default)
    }

    pub(crate) fn antenna_mut(&mut self) -> &mut Antenna {
        self.antenna.get_or_insert_with(Antenna::default)
    }

    pub(crate) fn weather_mut(&mut self) -> &mut Weather {
        self.weather.get_or_insert_with(Weather::default)
    }

    pub(crate) fn telemetry_mut(&mut self) -> &mut Telemetry {
        self.telemetry.get_or_insert_with(Telemetry::default)
    }
}

impl FromStr for AprsPacket {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s.as_bytes())
    }
}

/// Parse one APRS frame. All-or-nothing: any error aborts the parse and
/// reports where in the input the decoder stopped.
pub fn parse(bytes: &[u8]) -> Result<AprsPacket, ParseError> {
    let mut scanner = Scanner::new(bytes);
    let mut packet = AprsPacket {
        raw: bytes.to_vec(),
        ..AprsPacket::default()
    };
    match parse_into(&mut scanner, &mut packet) {
        Ok(()) => Ok(packet),
        Err(error) => Err(ParseError {
            raw: bytes.to_vec(),
            near: bytes
                .len()
                .saturating_sub(scanner.remaining())
                .saturating_sub(1),
            error,
        }),
    }
}

fn parse_into(scanner: &mut Scanner, packet: &mut AprsPacket) -> Result<(), DecodeError> {
    let from = scanner.take_until(b'>').ok_or(DecodeError::MissingFrom)?;
    packet.from = Callsign::from_bytes(from, "from", true)?;

    let header = scanner.take_until(b':').ok_or(DecodeError::MissingPath)?;
    let mut parts = header.split(|&b| b == b',');
    let to = parts.next().ok_or(DecodeError::MissingPath)?;
    packet.to = Callsign::from_bytes(to, "to", true)?;
    for token in parts {
        packet.via.push(Callsign::from_bytes(token, "path", false)?);
    }
    strip_q_construct(&mut packet.via);

    let data_type = scanner.take_byte().ok_or(DecodeError::MissingDataType)?;
    match data_type {
        b'!' | b'=' => position_report(scanner, packet, false)?,
        b'@' | b'/' => position_report(scanner, packet, true)?,
        b'\'' | b'`' | 0x1c | 0x1d => {
            mic_e::parse_mic_e(scanner, packet)?;
            let body = packet.comment.take().unwrap_or_default();
            comment::post_process(&body, packet);
        }
        b'>' => status::parse_status(scanner, packet)?,
        b':' => message::parse_message(scanner, packet)?,
        b'T' => {
            let body = telemetry::parse_report(scanner, packet)?;
            comment::post_process(&body, packet);
        }
        b';' => {
            object::parse_object(scanner, packet)?;
            position_report(scanner, packet, true)?;
        }
        b')' => {
            object::parse_item(scanner, packet)?;
            position_report(scanner, packet, false)?;
        }
        b'$' => {
            let sentence = scanner.take_rest();
            let text = std::str::from_utf8(sentence)
                .map_err(|_| DecodeError::InvalidEncoding("raw_gps"))?;
            packet.raw_gps = Some(text.to_string());
        }
        b'_' => {
            let stamp: [u8; 8] = scanner
                .take(8)
                .ok_or_else(|| DecodeError::InvalidTimestamp(String::new()))?
                .try_into()
                .expect("take returned 8 bytes");
            packet.timestamp = Some(Timestamp::parse_mdhm(&stamp)?);
            let body = weather::parse_weather(scanner, packet, true)?;
            comment::post_process(&body, packet);
        }
        b'#' | b'%' | b'(' | b'*' | b',' | b'-' | b'<' | b'?' | b'[' => {
            return Err(DecodeError::UnimplementedDataType(data_type as char));
        }
        other => return Err(DecodeError::ReservedDataType(other)),
    }
    Ok(())
}

/// Shared tail of every position-bearing data type: optional timestamp,
/// position, data extensions, weather for `/_` stations, then the comment
/// pipeline.
fn position_report(
    scanner: &mut Scanner,
    packet: &mut AprsPacket,
    timestamped: bool,
) -> Result<(), DecodeError> {
    if timestamped {
        let stamp: [u8; 7] = scanner
            .take(7)
            .ok_or(DecodeError::TruncatedPosition)?
            .try_into()
            .expect("take returned 7 bytes");
        packet.timestamp = Some(Timestamp::parse(&stamp)?);
    }
    crate::position::parse_position(scanner, packet)?;
    extensions::parse_extensions(scanner, packet)?;

    let body = if packet.symbol.is_some_and(|s| s.is_weather_station()) {
        weather::parse_weather(scanner, packet, false)?
    } else {
        scanner.take_rest().to_vec()
    };
    comment::post_process(&body, packet);
    Ok(())
}

/// Remove a trailing `qA?,server` pair appended by APRS-IS; those tokens
/// never traveled over radio.
fn strip_q_construct(via: &mut Vec<Callsign>) {
    if via.len() < 2 {
        return;
    }
    let q = via[via.len() - 2].as_str();
    let server = via[via.len() - 1].as_str();
    let q_ok = q.len() == 3
        && q.starts_with("qA")
        && matches!(q.as_bytes()[2], b'C' | b'X' | b'U' | b'o' | b'S' | b'r' | b'R');
    let server_ok = (1..=8).contains(&server.len())
        && server
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-');
    if q_ok && server_ok {
        via.truncate(via.len() - 2);
    }
}
