use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::error::DecodeError;

/// A station callsign, SSID included (`N0CALL-9`, `WIDE1-1`, `TCPIP*`).
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize)]
#[serde(into = "String")]
pub struct Callsign(pub String);

impl From<Callsign> for String {
    fn from(val: Callsign) -> Self {
        val.0
    }
}

impl Callsign {
    pub fn new<T: Into<String>>(call: T) -> Callsign {
        Callsign(call.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The callsign without any `-SSID` suffix.
    pub fn base(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Capture a header callsign. `from` and `to` must be 1..=9 bytes; path
    /// entries are tolerant of arbitrary length. No field may contain
    /// control bytes or the `>` `:` `,` separators.
    pub(crate) fn from_bytes(
        bytes: &[u8],
        field: &'static str,
        enforce_length: bool,
    ) -> Result<Callsign, DecodeError> {
        let bad_length = enforce_length && !(1..=9).contains(&bytes.len());
        let bad_byte = bytes.is_empty()
            || bytes
                .iter()
                .any(|&b| b.is_ascii_control() || b == b'>' || b == b':' || b == b',');
        if bad_length || bad_byte {
            return Err(DecodeError::InvalidCallsign {
                field,
                value: String::from_utf8_lossy(bytes).into_owned(),
            });
        }
        let call = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidEncoding(field))?;
        Ok(Callsign::new(call))
    }
}

impl Display for Callsign {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_callsign() {
        assert_eq!(
            Callsign::from_bytes(b"ABCDEF", "from", true),
            Ok(Callsign::new("ABCDEF"))
        );
    }

    #[test]
    fn capture_with_ssid() {
        assert_eq!(
            Callsign::from_bytes(b"ABCDEF-42", "from", true),
            Ok(Callsign::new("ABCDEF-42"))
        );
    }

    #[test]
    fn empty_callsign() {
        assert_eq!(
            Callsign::from_bytes(b"", "from", true),
            Err(DecodeError::InvalidCallsign {
                field: "from",
                value: String::new()
            })
        );
    }

    #[test]
    fn rejects_oversized_from() {
        assert!(Callsign::from_bytes(b"ABCDEFGHIJK", "from", true).is_err());
        // Path entries are tolerant of arbitrary length.
        assert!(Callsign::from_bytes(b"ABCDEFGHIJK", "path", false).is_ok());
    }

    #[test]
    fn rejects_separators_and_controls() {
        assert!(Callsign::from_bytes(b"AB>C", "to", true).is_err());
        assert!(Callsign::from_bytes(b"AB\x01C", "to", true).is_err());
    }

    #[test]
    fn base_strips_ssid() {
        assert_eq!(Callsign::new("N0CALL-9").base(), "N0CALL");
        assert_eq!(Callsign::new("N0CALL").base(), "N0CALL");
    }
}
