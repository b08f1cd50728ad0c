//! Weather reports: the parameter loop shared by `/_`-symbol position
//! packets and `_` positionless reports.

use serde::Serialize;

use crate::bytes::{is_digits, parse_f64};
use crate::error::DecodeError;
use crate::packet::AprsPacket;
use crate::scanner::Scanner;
use crate::units::{M_PER_FT, M_PER_IN, M_PER_NM, MPS_PER_KNOT, MPS_PER_MPH, fahrenheit_to_celsius};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StormCategory {
    TropicalStorm,
    Hurricane,
    TropicalDepression,
}

/// Weather observation in SI units.
///
/// `barometric_pressure` keeps the wire value × 0.1 (millibars), matching
/// the historical behavior of this format.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Weather {
    /// Degrees clockwise from true north.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<u16>,
    /// Meters per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    /// Meters per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gust_speed: Option<f64>,
    /// Degrees Celsius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_last_hour: Option<f64>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_last_24_hours: Option<f64>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_since_midnight: Option<f64>,
    /// Percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Wire value × 0.1 (millibars).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barometric_pressure: Option<f64>,
    /// Watts per square meter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub luminosity: Option<f64>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snowfall: Option<f64>,
    /// Raw rain counter ticks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain_counts: Option<u16>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_height: Option<f64>,
    /// Meters per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_wind_gust: Option<f64>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hurricane_radius: Option<f64>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tropical_storm_radius: Option<f64>,
    /// Meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gale_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storm_category: Option<StormCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wx_unit: Option<String>,
}

/// Decode the weather section of the information field. Returns the bytes
/// that are left over for the comment.
pub(crate) fn parse_weather(
    scanner: &mut Scanner,
    packet: &mut AprsPacket,
    positionless: bool,
) -> Result<Vec<u8>, DecodeError> {
    // A course/speed extension in front of a weather symbol is really the
    // wind observation.
    if let Some(course) = packet.course.take() {
        let weather = packet.weather_mut();
        weather.wind_direction = course.direction;
        weather.wind_speed = course.speed;
    }

    if !positionless && packet.weather_mut().wind_direction.is_none() {
        take_wind_group(scanner, packet);
    }

    loop {
        let Some(code) = scanner.peek() else { break };
        let checkpoint = *scanner;
        scanner.take_byte();

        if code == b'/' {
            match scanner.take(2) {
                Some(b"TS") => packet.weather_mut().storm_category = Some(StormCategory::TropicalStorm),
                Some(b"HC") => packet.weather_mut().storm_category = Some(StormCategory::Hurricane),
                Some(b"TD") => packet.weather_mut().storm_category = Some(StormCategory::TropicalDepression),
                _ => {
                    *scanner = checkpoint;
                    return Ok(scanner.take_rest().to_vec());
                }
            }
            continue;
        }

        let Some(width) = value_width(code, scanner.rest()) else {
            *scanner = checkpoint;
            break;
        };
        let Some(value) = scanner.take(width) else {
            *scanner = checkpoint;
            return Ok(scanner.take_rest().to_vec());
        };

        if value.iter().all(|&b| b == b'.') || value.iter().all(|&b| b == b' ') {
            continue;
        }
        let numeric = value
            .iter()
            .all(|&b| b.is_ascii_digit() || b == b'.' || b == b'-');
        let Some(number) = (if numeric { parse_f64(value) } else { None }) else {
            *scanner = checkpoint;
            return Ok(scanner.take_rest().to_vec());
        };

        store(packet, code, number, positionless);
    }

    take_software_tag(scanner, packet)
}

/// A literal `ddd/ddd` wind group; dots and spaces mean "not measured".
fn take_wind_group(scanner: &mut Scanner, packet: &mut AprsPacket) {
    let rest = scanner.rest();
    if rest.len() < 7 || rest[3] != b'/' {
        return;
    }
    let (dir, speed) = (&rest[0..3], &rest[4..7]);
    let uniform = |g: &[u8]| {
        is_digits(g) || g.iter().all(|&b| b == b'.') || g.iter().all(|&b| b == b' ')
    };
    if !uniform(dir) || !uniform(speed) {
        return;
    }
    scanner.take(7);
    let weather = packet.weather_mut();
    if is_digits(dir) {
        weather.wind_direction = Some(dir.iter().fold(0, |acc, &b| acc * 10 + u16::from(b - b'0')));
    }
    if is_digits(speed) {
        let knots: f64 = speed.iter().fold(0.0, |acc, &b| acc * 10.0 + f64::from(b - b'0'));
        weather.wind_speed = Some(knots * MPS_PER_KNOT);
    }
}

/// Value width for a parameter code; `None` for unknown codes. Humidity and
/// pressure grow by one digit when the byte after the nominal width is
/// still a digit.
fn value_width(code: u8, rest: &[u8]) -> Option<usize> {
    Some(match code {
        b'h' => {
            if rest.len() > 2 && rest[2].is_ascii_digit() {
                3
            } else {
                2
            }
        }
        b'b' => {
            if rest.len() > 5 && rest[5].is_ascii_digit() {
                6
            } else {
                5
            }
        }
        b'g' | b't' | b'r' | b'p' | b'P' | b'c' | b's' | b'#' | b'F' | b'f' | b'^' | b'>'
        | b'&' | b'%' | b'L' | b'l' => 3,
        _ => return None,
    })
}

fn store(packet: &mut AprsPacket, code: u8, value: f64, positionless: bool) {
    let weather = packet.weather_mut();
    match code {
        b'g' => weather.gust_speed = Some(value * MPS_PER_MPH),
        b't' => weather.temperature = Some(fahrenheit_to_celsius(value)),
        b'r' => weather.rainfall_last_hour = Some(value * 0.01 * M_PER_IN),
        b'p' => weather.rainfall_last_24_hours = Some(value * 0.01 * M_PER_IN),
        b'P' => weather.rainfall_since_midnight = Some(value * 0.01 * M_PER_IN),
        b'h' => weather.humidity = Some(value),
        b'b' => weather.barometric_pressure = Some(value * 0.1),
        b'L' => weather.luminosity = Some(value),
        b'l' => weather.luminosity = Some(value * 1000.0),
        b'c' => weather.wind_direction = Some(value as u16),
        b's' => {
            if positionless && weather.wind_speed.is_none() {
                weather.wind_speed = Some(value * MPS_PER_MPH);
            } else {
                weather.snowfall = Some(value * M_PER_IN);
            }
        }
        b'#' => weather.rain_counts = Some(value as u16),
        b'F' => weather.water_height = Some(value * M_PER_FT),
        b'f' => weather.water_height = Some(value),
        b'^' => weather.peak_wind_gust = Some(value * MPS_PER_KNOT),
        b'>' => weather.hurricane_radius = Some(value * M_PER_NM),
        b'&' => weather.tropical_storm_radius = Some(value * M_PER_NM),
        b'%' => weather.gale_radius = Some(value * M_PER_NM),
        _ => unreachable!("filtered by value_width"),
    }
}

/// Consume a trailing station/software tag: one software-type byte plus up
/// to four unit bytes. Longer tails become the comment.
fn take_software_tag(
    scanner: &mut Scanner,
    packet: &mut AprsPacket,
) -> Result<Vec<u8>, DecodeError> {
    let rest = scanner.take_rest();
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    if rest.len() > 5 {
        return Ok(rest.to_vec());
    }
    let weather = packet.weather_mut();
    weather.software_type = Some(software_name(rest[0])?);
    if rest.len() > 1 {
        weather.wx_unit = Some(unit_name(&rest[1..])?);
    }
    Ok(Vec::new())
}

fn software_name(code: u8) -> Result<String, DecodeError> {
    Ok(match code {
        b'd' => "APRSdos".to_string(),
        b'M' => "MacAPRS".to_string(),
        b'P' => "pocketAPRS".to_string(),
        b'S' => "APRS+SA".to_string(),
        b'W' => "WinAPRS".to_string(),
        b'X' => "X-APRS".to_string(),
        other => {
            if !other.is_ascii() {
                return Err(DecodeError::InvalidEncoding("weather.software_type"));
            }
            format!("Unknown '{}'", other as char)
        }
    })
}

fn unit_name(token: &[u8]) -> Result<String, DecodeError> {
    Ok(match token {
        b"Dvs" => "Davis".to_string(),
        b"HKT" => "Heathkit".to_string(),
        b"PIC" => "PIC device".to_string(),
        b"RSW" => "Radio Shack WX-200".to_string(),
        b"U-II" => "Ultimeter II".to_string(),
        b"U2k" => "Ultimeter 2000".to_string(),
        b"U5" => "Ultimeter 500".to_string(),
        other => {
            let text = std::str::from_utf8(other)
                .map_err(|_| DecodeError::InvalidEncoding("weather.wx_unit"))?;
            format!("Unknown '{text}'")
        }
    })
}
