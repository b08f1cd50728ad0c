//! `>` status reports: optional DHM timestamp or Maidenhead locator, then
//! free text.

use crate::bytes::is_digits;
use crate::error::DecodeError;
use crate::packet::AprsPacket;
use crate::scanner::Scanner;
use crate::symbol::Symbol;
use crate::timestamp::Timestamp;

pub(crate) fn parse_status(scanner: &mut Scanner, packet: &mut AprsPacket) -> Result<(), DecodeError> {
    let rest = scanner.take_rest();

    // >DDHHMMz...: zulu timestamp, everything after is the status text.
    if rest.len() >= 7 && is_digits(&rest[..6]) && rest[6] == b'z' {
        let mut stamp = [0u8; 7];
        stamp.copy_from_slice(&rest[..7]);
        packet.timestamp = Some(Timestamp::parse(&stamp)?);
        packet.status = Some(rest[7..].to_vec());
        return Ok(());
    }

    // >GGnn// : four-character grid square plus symbol, nothing else.
    if rest.len() == 6 && is_grid(&rest[..4]) {
        set_maidenhead(packet, &rest[..4], rest[4], rest[5])?;
        return Ok(());
    }

    // >GGnngg// text: six-character grid square plus symbol; any text is
    // separated by one space.
    if rest.len() >= 8 && is_grid(&rest[..6]) && (rest.len() == 8 || rest[8] == b' ') {
        set_maidenhead(packet, &rest[..6], rest[6], rest[7])?;
        if rest.len() > 9 {
            packet.status = Some(rest[9..].to_vec());
        }
        return Ok(());
    }

    packet.status = Some(rest.to_vec());
    Ok(())
}

fn set_maidenhead(
    packet: &mut AprsPacket,
    grid: &[u8],
    table: u8,
    code: u8,
) -> Result<(), DecodeError> {
    packet.symbol = Some(Symbol::from_bytes(table, code)?);
    let grid = std::str::from_utf8(grid).expect("grid bytes are ASCII");
    packet.position_mut().maidenhead = Some(grid.to_string());
    Ok(())
}

/// Maidenhead locators alternate letter pairs and digit pairs.
fn is_grid(bytes: &[u8]) -> bool {
    bytes.chunks(2).enumerate().all(|(i, pair)| {
        pair.iter().all(|&b| {
            if i % 2 == 0 {
                b.is_ascii_alphabetic()
            } else {
                b.is_ascii_digit()
            }
        })
    })
}
