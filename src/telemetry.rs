//! Telemetry: `T#` reports, the self-addressed `PARM.`/`UNIT.`/`EQNS.`/
//! `BITS.` definition messages and base-91 `|…|` comment blocks.

use serde::Serialize;

use crate::base91;
use crate::bytes::{parse_f64, parse_u32};
use crate::callsign::Callsign;
use crate::error::DecodeError;
use crate::packet::AprsPacket;
use crate::scanner::Scanner;

const MAX_CHANNELS: usize = 5;
const MAX_BITS: usize = 8;

/// Telemetry samples and/or channel definitions for one station.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Telemetry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_counter: Option<u32>,
    /// Analog channel values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<f64>,
    /// Digital channel bits, each 0 or 1.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bits: Vec<u8>,
    /// Channel names from a `PARM.` definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parm: Option<Vec<String>>,
    /// Channel units from a `UNIT.` definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Vec<String>>,
    /// Scaling coefficients (a, b, c) per channel from an `EQNS.` definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eqns: Option<Vec<[f64; 3]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,
    /// Station the definitions belong to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Callsign>,
}

/// Parse a `T#…` report body (the `T` is already consumed). Returns the
/// leftover comment bytes.
pub(crate) fn parse_report(
    scanner: &mut Scanner,
    packet: &mut AprsPacket,
) -> Result<Vec<u8>, DecodeError> {
    if scanner.take_byte() != Some(b'#') {
        return Err(DecodeError::EmptyTelemetry);
    }

    if scanner.rest().starts_with(b"MIC") {
        scanner.take(3);
        if scanner.peek() == Some(b',') {
            scanner.take_byte();
        }
    } else {
        let digits: Vec<u8> = scanner
            .rest()
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .copied()
            .collect();
        if digits.is_empty() || digits.len() > 5 {
            return Err(DecodeError::InvalidTelemetrySequence(
                String::from_utf8_lossy(scanner.rest()).into_owned(),
            ));
        }
        scanner.take(digits.len());
        if scanner.take_byte() != Some(b',') {
            return Err(DecodeError::InvalidTelemetrySequence(
                String::from_utf8_lossy(&digits).into_owned(),
            ));
        }
        packet.telemetry_mut().sequence_counter = parse_u32(&digits);
    }

    let body = scanner.take_rest();
    if body.is_empty() {
        return Err(DecodeError::EmptyTelemetry);
    }
    let fields: Vec<&[u8]> = body.split(|&b| b == b',').collect();
    let (digital, channels) = fields.split_last().expect("split yields at least one field");

    let mut values = Vec::new();
    for field in channels {
        if field.is_empty() {
            continue;
        }
        let value = parse_f64(field)
            .ok_or_else(|| DecodeError::InvalidNumber(String::from_utf8_lossy(field).into_owned()))?;
        values.push(value);
    }
    values.truncate(MAX_CHANNELS);

    let run = digital
        .iter()
        .take(MAX_BITS)
        .take_while(|&&b| b == b'0' || b == b'1')
        .count();
    if run == 0 || (run < MAX_BITS && run < digital.len()) {
        return Err(DecodeError::InvalidTelemetryBits(
            String::from_utf8_lossy(digital).into_owned(),
        ));
    }

    let telemetry = packet.telemetry_mut();
    telemetry.values = values;
    telemetry.bits = digital[..run].iter().map(|&b| b - b'0').collect();
    Ok(digital[run..].to_vec())
}

/// Telemetry definition messages a station addresses to itself. Returns
/// `false` when the body carries no definition prefix.
pub(crate) fn parse_definition(body: &[u8], packet: &mut AprsPacket) -> Result<bool, DecodeError> {
    if let Some(rest) = body.strip_prefix(b"PARM.") {
        packet.telemetry_mut().parm = Some(split_names(rest));
    } else if let Some(rest) = body.strip_prefix(b"UNIT.") {
        packet.telemetry_mut().unit = Some(split_names(rest));
    } else if let Some(rest) = body.strip_prefix(b"EQNS.") {
        let mut coefficients = Vec::new();
        for field in rest.split(|&b| b == b',').take(15) {
            let value = parse_f64(field).ok_or_else(|| {
                DecodeError::InvalidNumber(String::from_utf8_lossy(field).into_owned())
            })?;
            coefficients.push(value);
        }
        coefficients.truncate(coefficients.len() - coefficients.len() % 3);
        packet.telemetry_mut().eqns = Some(
            coefficients
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
        );
    } else if let Some(rest) = body.strip_prefix(b"BITS.") {
        let run = rest
            .iter()
            .take(MAX_BITS)
            .take_while(|&&b| b == b'0' || b == b'1')
            .count();
        if run == 0 {
            return Err(DecodeError::InvalidTelemetryBits(
                String::from_utf8_lossy(rest).into_owned(),
            ));
        }
        let telemetry = packet.telemetry_mut();
        telemetry.bits = rest[..run].iter().map(|&b| b - b'0').collect();
        if let Some(comma) = rest.iter().position(|&b| b == b',') {
            let title = String::from_utf8_lossy(&rest[comma + 1..]).trim().to_string();
            if !title.is_empty() {
                telemetry.project_title = Some(title);
            }
        }
    } else {
        return Ok(false);
    }
    Ok(true)
}

fn split_names(rest: &[u8]) -> Vec<String> {
    rest.split(|&b| b == b',')
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .collect()
}

/// Extract an embedded `|…|` base-91 telemetry block from a comment.
/// Returns the comment with the block removed.
pub(crate) fn extract_comment_telemetry(comment: &[u8], packet: &mut AprsPacket) -> Vec<u8> {
    let Some(start) = comment.iter().position(|&b| b == b'|') else {
        return comment.to_vec();
    };
    let Some(len) = comment[start + 1..].iter().position(|&b| b == b'|') else {
        return comment.to_vec();
    };
    let inner = &comment[start + 1..start + 1 + len];
    if !matches!(inner.len(), 4 | 6 | 8 | 10 | 12) || !base91::is_valid(inner) {
        return comment.to_vec();
    }

    let telemetry = packet.telemetry_mut();
    telemetry.sequence_counter = base91::decode(&inner[0..2]);
    telemetry.values = inner[2..]
        .chunks_exact(2)
        .filter_map(base91::decode)
        .map(f64::from)
        .collect();

    let mut stripped = comment[..start].to_vec();
    stripped.extend_from_slice(&comment[start + len + 2..]);
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(bytes: &[u8]) -> Result<(AprsPacket, Vec<u8>), DecodeError> {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(bytes);
        let comment = parse_report(&mut scanner, &mut packet)?;
        Ok((packet, comment))
    }

    #[test]
    fn mic_report_without_counter() {
        let (packet, comment) = report(b"#MIC,456,789,012,345,678,10101100Comment").unwrap();
        let telemetry = packet.telemetry.unwrap();
        assert_eq!(telemetry.sequence_counter, None);
        assert_eq!(telemetry.values, vec![456.0, 789.0, 12.0, 345.0, 678.0]);
        assert_eq!(telemetry.bits, vec![1, 0, 1, 0, 1, 1, 0, 0]);
        assert_eq!(comment, b"Comment".to_vec());
    }

    #[test]
    fn mic_without_comma() {
        let (packet, _) = report(b"#MIC456,789,11110000").unwrap();
        let telemetry = packet.telemetry.unwrap();
        assert_eq!(telemetry.sequence_counter, None);
        assert_eq!(telemetry.values, vec![456.0, 789.0]);
    }

    #[test]
    fn numbered_sequence() {
        let (packet, _) = report(b"#005,199,000,255,073,123,01101001").unwrap();
        let telemetry = packet.telemetry.unwrap();
        assert_eq!(telemetry.sequence_counter, Some(5));
        assert_eq!(telemetry.values.len(), 5);
    }

    #[test]
    fn empty_channels_are_skipped() {
        let (packet, _) = report(b"#005,199,,255,01101001").unwrap();
        assert_eq!(packet.telemetry.unwrap().values, vec![199.0, 255.0]);
    }

    #[test]
    fn short_bit_string() {
        let (packet, comment) = report(b"#005,199,1010").unwrap();
        assert_eq!(packet.telemetry.unwrap().bits, vec![1, 0, 1, 0]);
        assert!(comment.is_empty());
    }

    #[test]
    fn bad_bits_fail() {
        assert!(matches!(
            report(b"#005,199,10x01001"),
            Err(DecodeError::InvalidTelemetryBits(_))
        ));
        assert!(matches!(
            report(b"#005,199,xyz"),
            Err(DecodeError::InvalidTelemetryBits(_))
        ));
    }

    #[test]
    fn bad_channel_value_fails() {
        assert!(matches!(
            report(b"#005,19a,10101010"),
            Err(DecodeError::InvalidNumber(_))
        ));
    }

    #[test]
    fn empty_report_fails() {
        assert_eq!(report(b"#005,"), Err(DecodeError::EmptyTelemetry));
        assert_eq!(
            report(b"#"),
            Err(DecodeError::InvalidTelemetrySequence(String::new()))
        );
        assert_eq!(report(b""), Err(DecodeError::EmptyTelemetry));
    }

    #[test]
    fn definitions() {
        let mut packet = AprsPacket::default();
        assert!(parse_definition(b"PARM.Battery,Temp,Pressure", &mut packet).unwrap());
        assert!(parse_definition(b"UNIT.V,deg.C,mbar", &mut packet).unwrap());
        assert!(
            parse_definition(b"EQNS.0,0.075,0,0,10,0,0,10,0,0,1,0,0,0,0", &mut packet).unwrap()
        );
        assert!(parse_definition(b"BITS.10110000,My Project", &mut packet).unwrap());

        let telemetry = packet.telemetry.unwrap();
        assert_eq!(
            telemetry.parm.as_deref(),
            Some(&["Battery".to_string(), "Temp".to_string(), "Pressure".to_string()][..])
        );
        assert_eq!(
            telemetry.unit.as_deref(),
            Some(&["V".to_string(), "deg.C".to_string(), "mbar".to_string()][..])
        );
        assert_eq!(
            telemetry.eqns.as_deref(),
            Some(
                &[
                    [0.0, 0.075, 0.0],
                    [0.0, 10.0, 0.0],
                    [0.0, 10.0, 0.0],
                    [0.0, 1.0, 0.0],
                    [0.0, 0.0, 0.0]
                ][..]
            )
        );
        assert_eq!(telemetry.bits, vec![1, 0, 1, 1, 0, 0, 0, 0]);
        assert_eq!(telemetry.project_title.as_deref(), Some("My Project"));
    }

    #[test]
    fn eqns_truncates_to_triples() {
        let mut packet = AprsPacket::default();
        parse_definition(b"EQNS.1,2,3,4,5", &mut packet).unwrap();
        assert_eq!(
            packet.telemetry.unwrap().eqns.as_deref(),
            Some(&[[1.0, 2.0, 3.0]][..])
        );
    }

    #[test]
    fn non_definition_body() {
        let mut packet = AprsPacket::default();
        assert!(!parse_definition(b"Hello there", &mut packet).unwrap());
        assert!(packet.telemetry.is_none());
    }

    #[test]
    fn comment_block() {
        let mut packet = AprsPacket::default();
        let stripped = extract_comment_telemetry(b"before|,7.qQ)K5!3N#|after", &mut packet);
        assert_eq!(stripped, b"beforeafter".to_vec());
        let telemetry = packet.telemetry.unwrap();
        assert_eq!(telemetry.sequence_counter, Some(1023));
        assert_eq!(telemetry.values, vec![1263.0, 4376.0, 3842.0, 18.0, 4097.0]);
    }

    #[test]
    fn comment_block_with_bad_length_is_kept() {
        let mut packet = AprsPacket::default();
        let stripped = extract_comment_telemetry(b"a|,7.|b", &mut packet);
        assert_eq!(stripped, b"a|,7.|b".to_vec());
        assert!(packet.telemetry.is_none());
    }
}
