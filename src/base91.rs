//! Base-91 arithmetic used by compressed positions, Mic-E altitudes and
//! comment telemetry blocks.
//!
//! Digits are printable ASCII starting at `!` (0x21); a value is accumulated
//! big-endian, base 91.

const DIGIT_BASE: u8 = 33;
const DIGIT_MAX: u8 = 123;

/// Decode a big-endian base-91 value. `None` if any byte is outside the
/// printable digit range.
pub(crate) fn decode(bytes: &[u8]) -> Option<u32> {
    let mut value: u32 = 0;
    for &b in bytes {
        if !(DIGIT_BASE..=DIGIT_MAX).contains(&b) {
            return None;
        }
        value = value * 91 + u32::from(b - DIGIT_BASE);
    }
    Some(value)
}

/// True if every byte is a valid base-91 digit.
pub(crate) fn is_valid(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| (DIGIT_BASE..=DIGIT_MAX).contains(b))
}
