//! Comment post-processing: altitude capture, embedded telemetry blocks,
//! DAO stripping and trimming.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::bytes::{parse_f64, trim_ascii};
use crate::packet::AprsPacket;
use crate::telemetry;
use crate::units::M_PER_FT;

static ALTITUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"A=(\d{6})").unwrap());
static DAO: Lazy<Regex> = Lazy::new(|| Regex::new(r"![A-Za-z][\x20-\x7e]{2}!").unwrap());

/// Apply the comment pipeline and store the result on the packet. The
/// altitude stays in the comment text; telemetry and DAO blocks are
/// removed; a comment that trims down to nothing becomes absent.
pub(crate) fn post_process(comment: &[u8], packet: &mut AprsPacket) {
    if let Some(captures) = ALTITUDE.captures(comment) {
        // Altitude attaches to an existing position only.
        if packet.position.is_some() {
            if let Some(feet) = parse_f64(&captures[1]) {
                packet.position_mut().altitude = Some(feet * M_PER_FT);
            }
        }
    }

    let comment = telemetry::extract_comment_telemetry(comment, packet);

    let comment = match DAO.find(&comment) {
        Some(m) => {
            let mut stripped = comment[..m.start()].to_vec();
            stripped.extend_from_slice(&comment[m.end()..]);
            stripped
        }
        None => comment,
    };

    let trimmed = trim_ascii(&comment);
    packet.comment = if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_vec())
    };
}
