//! Small helpers for working with raw frame bytes.

use serde::Serializer;

/// Serialize a byte field lossily for JSON export. The in-memory value keeps
/// the original bytes; only the serialized view is substituted.
pub(crate) fn serialize_lossy<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

/// Same as [`serialize_lossy`] for optional byte fields.
pub(crate) fn serialize_lossy_opt<S: Serializer>(
    bytes: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => serializer.serialize_some(&String::from_utf8_lossy(b)),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn is_digits(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit)
}

/// Parse an ASCII-decimal unsigned value.
pub(crate) fn parse_u32(bytes: &[u8]) -> Option<u32> {
    if !is_digits(bytes) {
        return None;
    }
    let mut value: u32 = 0;
    for &b in bytes {
        value = value.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    Some(value)
}

/// Parse an ASCII float (optionally signed) out of raw bytes.
pub(crate) fn parse_f64(bytes: &[u8]) -> Option<f64> {
    std::str::from_utf8(bytes).ok()?.trim().parse::<f64>().ok()
}

pub(crate) fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace());
    match (start, end) {
        (Some(s), Some(e)) => &bytes[s..=e],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits() {
        assert!(is_digits(b"092345"));
        assert!(!is_digits(b"09a345"));
        assert!(!is_digits(b""));
        assert_eq!(parse_u32(b"01023"), Some(1023));
        assert_eq!(parse_u32(b"1x"), None);
    }

    #[test]
    fn floats() {
        assert_eq!(parse_f64(b"012"), Some(12.0));
        assert_eq!(parse_f64(b"-3.5"), Some(-3.5));
        assert_eq!(parse_f64(b"abc"), None);
    }

    #[test]
    fn trimming() {
        assert_eq!(trim_ascii(b"  x  "), b"x");
        assert_eq!(trim_ascii(b"   "), b"");
    }
}
