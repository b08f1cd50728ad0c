//! Objects (`;`) and items (`)`): named targets placed on the map by
//! another station. The position that follows is handled by the shared
//! position pipeline.

use serde::Serialize;

use crate::bytes::serialize_lossy;
use crate::error::DecodeError;
use crate::packet::AprsPacket;
use crate::scanner::Scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    Alive,
    Killed,
}

/// An object or item: its name bytes and whether it is alive or killed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    #[serde(serialize_with = "serialize_lossy")]
    pub name: Vec<u8>,
    pub state: TargetState,
}

/// `;NAME     *`: a fixed 9-byte name and a state byte; a timestamped
/// position follows.
pub(crate) fn parse_object(scanner: &mut Scanner, packet: &mut AprsPacket) -> Result<(), DecodeError> {
    let name = scanner.take(9).ok_or(DecodeError::TruncatedObject)?;
    let state = match scanner.take_byte() {
        Some(b'*') => TargetState::Alive,
        Some(b'_') => TargetState::Killed,
        Some(other) => return Err(DecodeError::InvalidObjectState(other as char)),
        None => return Err(DecodeError::TruncatedObject),
    };
    packet.object = Some(Target {
        name: name.to_vec(),
        state,
    });
    Ok(())
}

/// `)NAME!`: a 3..9-byte name terminated by the state byte (`!` alive,
/// `_` killed); an untimestamped position follows.
pub(crate) fn parse_item(scanner: &mut Scanner, packet: &mut AprsPacket) -> Result<(), DecodeError> {
    let rest = scanner.rest();
    let terminator = rest
        .iter()
        .take(10)
        .position(|&b| b == b'!' || b == b'_')
        .ok_or(DecodeError::InvalidItemName)?;
    if !(3..=9).contains(&terminator) {
        return Err(DecodeError::InvalidItemName);
    }
    let name = scanner.take(terminator).expect("length checked");
    let state = match scanner.take_byte() {
        Some(b'!') => TargetState::Alive,
        _ => TargetState::Killed,
    };
    packet.item = Some(Target {
        name: name.to_vec(),
        state,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_alive() {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(b"LEADER   *092345z4903.50N/07201.75W>");
        parse_object(&mut scanner, &mut packet).unwrap();
        let object = packet.object.unwrap();
        assert_eq!(object.name, b"LEADER   ".to_vec());
        assert_eq!(object.state, TargetState::Alive);
        assert_eq!(scanner.rest(), b"092345z4903.50N/07201.75W>");
    }

    #[test]
    fn object_killed() {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(b"LEADER   _092345z");
        parse_object(&mut scanner, &mut packet).unwrap();
        assert_eq!(packet.object.unwrap().state, TargetState::Killed);
    }

    #[test]
    fn object_bad_state_byte() {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(b"LEADER   x092345z");
        assert_eq!(
            parse_object(&mut scanner, &mut packet),
            Err(DecodeError::InvalidObjectState('x'))
        );
    }

    #[test]
    fn object_too_short() {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(b"LEAD");
        assert_eq!(
            parse_object(&mut scanner, &mut packet),
            Err(DecodeError::TruncatedObject)
        );
    }

    #[test]
    fn item_alive() {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(b"AID #2!4903.50N/07201.75W-");
        parse_item(&mut scanner, &mut packet).unwrap();
        let item = packet.item.unwrap();
        assert_eq!(item.name, b"AID #2".to_vec());
        assert_eq!(item.state, TargetState::Alive);
        assert_eq!(scanner.rest(), b"4903.50N/07201.75W-");
    }

    #[test]
    fn item_killed() {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(b"WATER_4903.50N/07201.75W-");
        parse_item(&mut scanner, &mut packet).unwrap();
        assert_eq!(packet.item.unwrap().state, TargetState::Killed);
    }

    #[test]
    fn item_name_too_short() {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(b"AB!4903.50N");
        assert_eq!(
            parse_item(&mut scanner, &mut packet),
            Err(DecodeError::InvalidItemName)
        );
    }

    #[test]
    fn item_without_terminator() {
        let mut packet = AprsPacket::default();
        let mut scanner = Scanner::new(b"NOTERMINATOR");
        assert_eq!(
            parse_item(&mut scanner, &mut packet),
            Err(DecodeError::InvalidItemName)
        );
    }
}
