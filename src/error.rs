use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use crate::bytes::serialize_lossy;

/// Everything that can go wrong while decoding a single frame.
///
/// The `Display` impl of each variant is the user-facing error message; the
/// taxonomy follows the wire format: structural problems, unrecognized data
/// types, field-shape mismatches, value errors and encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum DecodeError {
    #[error("Could not parse the FROM")]
    MissingFrom,
    #[error("Could not parse the PATH")]
    MissingPath,
    #[error("Packet has no data type identifier")]
    MissingDataType,
    #[error("Unimplemented data type identifier '{0}'")]
    UnimplementedDataType(char),
    #[error("Data type identifier 0x{0:02x} is not in spec / reserved")]
    ReservedDataType(u8),
    #[error("Invalid callsign in {field}: \"{value}\"")]
    InvalidCallsign { field: &'static str, value: String },
    #[error("Timestamp \"{0}\" contains non-digit characters")]
    InvalidTimestamp(String),
    #[error("Position field is too short")]
    TruncatedPosition,
    #[error("Unknown latitude direction byte '{0}'")]
    InvalidLatitudeDirection(char),
    #[error("Unknown longitude direction byte '{0}'")]
    InvalidLongitudeDirection(char),
    #[error("Could not parse the latitude \"{0}\"")]
    InvalidLatitude(String),
    #[error("Could not parse the longitude \"{0}\"")]
    InvalidLongitude(String),
    #[error("Invalid Mic-E destination byte '{0}'")]
    InvalidMicEDestination(char),
    #[error("Mic-E destination \"{0}\" must be 6 bytes long")]
    InvalidMicEDestinationLength(String),
    #[error("Mic-E information field is too short")]
    TruncatedMicE,
    #[error("Object name must be 9 bytes")]
    TruncatedObject,
    #[error("Unknown object state indicator '{0}'")]
    InvalidObjectState(char),
    #[error("Item name must be 3..9 bytes terminated by '!' or '_'")]
    InvalidItemName,
    #[error("Message addressee must be 9 bytes followed by ':'")]
    InvalidMessage,
    #[error("Telemetry report is empty")]
    EmptyTelemetry,
    #[error("Telemetry sequence counter \"{0}\" is not a number")]
    InvalidTelemetrySequence(String),
    #[error("Telemetry digital value \"{0}\" is not a bit string")]
    InvalidTelemetryBits(String),
    #[error("Could not parse \"{0}\" as a number")]
    InvalidNumber(String),
    #[error("Unknown PHG/DFS height code '{0}'")]
    InvalidHeightCode(char),
    #[error("Unknown PHG/DFS directivity code '{0}'")]
    InvalidDirectivityCode(char),
    #[error("Field {0} is not a valid UTF-8 string")]
    InvalidEncoding(&'static str),
}

/// Failed parse of a whole frame.
///
/// `raw` is the exact input, `near` the byte offset the decoder had reached
/// when it gave up (0 when the remainder is unknown).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    #[serde(serialize_with = "serialize_lossy")]
    pub raw: Vec<u8>,
    pub error: DecodeError,
    pub near: usize,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} near character {}", self.error, self.near)
    }
}

impl std::error::Error for ParseError {}
