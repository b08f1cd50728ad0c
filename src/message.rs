use serde::Serialize;

use crate::bytes::{serialize_lossy, serialize_lossy_opt, trim_ascii};
use crate::callsign::Callsign;
use crate::error::DecodeError;
use crate::packet::AprsPacket;
use crate::scanner::Scanner;
use crate::telemetry;

/// A directed text message, ack or reject. Message numbers are opaque
/// bytes; real feeds use alphanumerics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    /// The 9-byte addressee field, space padding included.
    #[serde(serialize_with = "serialize_lossy")]
    pub addressee: Vec<u8>,
    #[serde(serialize_with = "serialize_lossy")]
    pub message: Vec<u8>,
    #[serde(serialize_with = "serialize_lossy_opt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_no: Option<Vec<u8>>,
}

/// Parse a `:` message body: nine addressee bytes, a colon, then the text.
/// Telemetry definitions a station sends to itself populate `telemetry`
/// instead of `message`.
pub(crate) fn parse_message(
    scanner: &mut Scanner,
    packet: &mut AprsPacket,
) -> Result<(), DecodeError> {
    let addressee = scanner.take(9).ok_or(DecodeError::InvalidMessage)?;
    if scanner.take_byte() != Some(b':') {
        return Err(DecodeError::InvalidMessage);
    }
    let body = scanner.take_rest();

    let addressee_trimmed = trim_ascii(addressee);
    if addressee_trimmed == packet.from.as_str().as_bytes()
        && telemetry::parse_definition(body, packet)?
    {
        let to = String::from_utf8_lossy(addressee_trimmed).into_owned();
        packet.telemetry_mut().to = Some(Callsign::new(to));
        return Ok(());
    }

    let mut message = Message {
        addressee: addressee.to_vec(),
        ..Message::default()
    };

    if let Some(id) = body.strip_prefix(b"ack").filter(|id| !id.is_empty()) {
        message.message = b"ack".to_vec();
        message.message_no = Some(id.to_vec());
    } else if let Some(id) = body.strip_prefix(b"rej").filter(|id| !id.is_empty()) {
        message.message = b"rej".to_vec();
        message.message_no = Some(id.to_vec());
    } else if let Some(brace) = body.iter().position(|&b| b == b'{') {
        let id = &body[brace + 1..];
        if id.is_empty() {
            message.message = body.to_vec();
        } else {
            message.message = body[..brace].to_vec();
            message.message_no = Some(id.to_vec());
        }
    } else {
        message.message = body.to_vec();
    }

    packet.message = Some(message);
    Ok(())
}
